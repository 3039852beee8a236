//! 도메인 타입 -- 정규화된 스캔 결과 모델
//!
//! nmap XML 형식과 독립적인 안정된 내부 표현입니다.
//! 속성에서 읽는 필드는 `Option`으로 모델링하며, "속성 없음"(`None`)과
//! "빈 속성"(`Some("")`)을 구분합니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NmapScannerError;

/// 스캔 요청
///
/// 호출자가 구성하는 일회성 값입니다. `options`는 검증/정제하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// 대상 호스트 (호스트명 또는 IP)
    pub host: String,
    /// 자유 형식 nmap 옵션 (공백 구분)
    #[serde(default)]
    pub options: String,
}

impl ScanRequest {
    /// 새 요청을 생성합니다.
    pub fn new(host: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            options: options.into(),
        }
    }

    /// 요청의 입력 제약을 검증합니다.
    ///
    /// 빈 문자열만 거부합니다. 공백뿐인 호스트는 그대로 nmap에 전달되어
    /// nmap 쪽 오류(또는 바이너리 없음)로 보고됩니다.
    ///
    /// # Errors
    ///
    /// `host`가 빈 문자열이면 `NmapScannerError::InvalidRequest`
    pub fn validate(&self) -> Result<(), NmapScannerError> {
        if self.host.is_empty() {
            return Err(NmapScannerError::InvalidRequest {
                field: "host".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// 정규화된 스캔 결과
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// nmap이 기록한 실행 인자 (`nmaprun@args`)
    pub scan_args: String,
    /// 스캔 시작 시각 문자열 (`nmaprun@startstr`)
    pub start_time: String,
    /// 호스트 결과 (원본 문서 순서 유지)
    pub hosts: Vec<HostResult>,
}

impl ScanResult {
    /// 호스트 수를 반환합니다.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// 모든 호스트에 걸친 `open` 상태 포트 수를 반환합니다.
    pub fn open_port_count(&self) -> usize {
        self.hosts
            .iter()
            .flat_map(|h| &h.ports)
            .filter(|p| p.state.as_deref() == Some("open"))
            .count()
    }
}

/// 단일 호스트 결과
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostResult {
    /// 호스트 상태 (`up`, `down` 등). `state` 속성이 없으면 `None`
    #[serde(default)]
    pub status: Option<String>,
    /// 주소 유형(`ipv4`, `ipv6`, `mac`) -> 주소
    pub addresses: BTreeMap<String, String>,
    /// 호스트명 목록
    pub hostnames: Vec<Hostname>,
    /// 포트 목록
    pub ports: Vec<PortResult>,
}

impl HostResult {
    /// 대표 주소(ipv4)를 반환합니다. ipv4 주소가 없으면 `None`.
    pub fn primary_address(&self) -> Option<&str> {
        self.addresses.get("ipv4").map(String::as_str)
    }

    /// 상태가 `up`인지 확인합니다.
    pub fn is_up(&self) -> bool {
        self.status.as_deref() == Some("up")
    }
}

/// 호스트명 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hostname {
    /// 호스트명
    #[serde(default)]
    pub name: Option<String>,
    /// 출처 유형 (`user`, `PTR`)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// 단일 포트 결과
///
/// 서비스 필드 세 개는 같은 `service` 요소에서 읽히거나 모두 `None`입니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortResult {
    /// 프로토콜 (`tcp`, `udp`, ...)
    #[serde(default)]
    pub protocol: Option<String>,
    /// 포트 번호 (원본 문자열 그대로)
    #[serde(default)]
    pub portid: Option<String>,
    /// 포트 상태 (`open`, `closed`, `filtered`, ...)
    #[serde(default)]
    pub state: Option<String>,
    /// 서비스 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    /// 서비스 제품명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// 서비스 버전
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PortResult {
    /// 서비스 정보가 하나라도 있는지 확인합니다.
    pub fn has_service(&self) -> bool {
        self.service_name.is_some() || self.product.is_some() || self.version.is_some()
    }

    /// `"ssh OpenSSH 8.2p1"` 형태의 서비스 요약을 반환합니다.
    ///
    /// 서비스 이름이 없으면 `None`. 제품명과 버전은 비어 있으면 생략합니다.
    pub fn service_summary(&self) -> Option<String> {
        let mut summary = self.service_name.clone()?;
        for extra in [&self.product, &self.version] {
            if let Some(value) = extra.as_deref().filter(|v| !v.is_empty()) {
                summary.push(' ');
                summary.push_str(value);
            }
        }
        Some(summary)
    }
}

/// 텍스트 출력에서 누락된 값의 자리 표시
pub const ABSENT: &str = "N/A";

impl fmt::Display for PortResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}",
            self.portid.as_deref().unwrap_or(ABSENT),
            self.protocol.as_deref().unwrap_or(ABSENT),
            self.state.as_deref().unwrap_or(ABSENT)
        )
    }
}
