//! nmap 스캐너 설정
//!
//! [`NmapScannerConfig`]는 core의 [`NmapConfig`](scanpost_core::config::NmapConfig)에서
//! 파생되는 스캐너 실행 설정입니다.
//!
//! # 사용 예시
//!
//! ```
//! use scanpost_nmap::NmapScannerConfigBuilder;
//!
//! let config = NmapScannerConfigBuilder::new()
//!     .binary("/usr/bin/nmap")
//!     .default_options("-sV -T4")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.binary, "/usr/bin/nmap");
//! ```

use serde::{Deserialize, Serialize};

use scanpost_core::config::MAX_OUTPUT_SIZE_LIMIT;

use crate::error::NmapScannerError;

/// nmap 스캐너 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NmapScannerConfig {
    /// 실행할 nmap 바이너리 (PATH 검색 또는 절대 경로)
    pub binary: String,
    /// 요청 옵션이 비어 있을 때 대신 사용할 옵션
    pub default_options: String,
    /// 표준 출력 최대 허용 크기 (바이트)
    ///
    /// 프로세스가 끝난 뒤 정규화 전에 검사합니다. 읽는 동안의 메모리 사용량은 제한하지 않습니다.
    pub max_output_size: usize,
}

impl Default for NmapScannerConfig {
    fn default() -> Self {
        Self::from_core(&scanpost_core::config::NmapConfig::default())
    }
}

impl NmapScannerConfig {
    /// core의 `NmapConfig`에서 스캐너 설정을 생성합니다.
    pub fn from_core(core: &scanpost_core::config::NmapConfig) -> Self {
        Self {
            binary: core.binary.clone(),
            default_options: core.default_options.clone(),
            max_output_size: core.max_output_size,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `binary`: 비어 있거나 공백뿐이면 안 됨
    /// - `max_output_size`: 1 이상, `MAX_OUTPUT_SIZE_LIMIT` 이하
    pub fn validate(&self) -> Result<(), NmapScannerError> {
        if self.binary.trim().is_empty() {
            return Err(NmapScannerError::Config {
                field: "binary".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.max_output_size == 0 || self.max_output_size > MAX_OUTPUT_SIZE_LIMIT {
            return Err(NmapScannerError::Config {
                field: "max_output_size".to_owned(),
                reason: format!("must be 1-{MAX_OUTPUT_SIZE_LIMIT}"),
            });
        }

        Ok(())
    }

    /// 요청 옵션이 공백뿐이면 기본 옵션을, 아니면 요청 옵션을 반환합니다.
    pub fn effective_options<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested.trim().is_empty() {
            &self.default_options
        } else {
            requested
        }
    }
}

/// 스캐너 설정 빌더
#[derive(Debug, Default)]
pub struct NmapScannerConfigBuilder {
    config: NmapScannerConfig,
}

impl NmapScannerConfigBuilder {
    /// 기본값으로 시작하는 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 바이너리 경로를 설정합니다.
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.config.binary = binary.into();
        self
    }

    /// 기본 옵션을 설정합니다.
    pub fn default_options(mut self, options: impl Into<String>) -> Self {
        self.config.default_options = options.into();
        self
    }

    /// 표준 출력 최대 크기를 설정합니다.
    pub fn max_output_size(mut self, size: usize) -> Self {
        self.config.max_output_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<NmapScannerConfig, NmapScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
