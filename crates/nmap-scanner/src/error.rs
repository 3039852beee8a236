//! nmap 스캐너 에러 타입
//!
//! [`NmapScannerError`]는 스캐너 내부에서 발생할 수 있는 모든 에러를 나타냅니다.
//! 호출자에게는 메시지 하나를 담은 평탄한 값인 [`ScanError`]로 변환되어 전달됩니다.
//! `From<NmapScannerError> for ScanpostError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로도 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **프로세스 실행**: `BinaryNotFound`, `ExecutionFailed`, `EmptyOutput`, `Spawn`
//! - **출력 정규화**: `Parse`, `MissingField`, `OutputTooLarge`
//! - **요청/설정**: `InvalidRequest`, `Config`

use serde::{Deserialize, Serialize};

use scanpost_core::error::{ScanFailure, ScanpostError};

/// nmap 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum NmapScannerError {
    /// 실행 경로에서 바이너리를 찾을 수 없음
    #[error("binary not found")]
    BinaryNotFound {
        /// 실행하려던 바이너리 이름
        binary: String,
    },

    /// 프로세스가 0이 아닌 상태로 종료 (시그널 종료 포함)
    #[error("execution failed: {stderr}")]
    ExecutionFailed {
        /// 종료 코드 (시그널로 종료된 경우 None)
        exit_code: Option<i32>,
        /// 캡처된 표준 에러 텍스트
        stderr: String,
    },

    /// 정상 종료했지만 표준 출력이 비어 있음
    #[error("no output produced")]
    EmptyOutput,

    /// 표준 출력이 허용 크기를 초과
    #[error("output too large: {size} bytes (max: {max})")]
    OutputTooLarge {
        /// 실제 출력 크기 (바이트)
        size: usize,
        /// 최대 허용 크기 (바이트)
        max: usize,
    },

    /// XML 파싱 실패 (잘못된 형식, UTF-8 아님)
    #[error("parse failure")]
    Parse {
        /// 파서가 보고한 세부 사유 (로그용)
        reason: String,
    },

    /// 필수 요소/속성 누락
    #[error("missing required field: {path}")]
    MissingField {
        /// 누락 위치 (예: `host[0]/ports/port[2]/state`)
        path: String,
    },

    /// 잘못된 스캔 요청
    #[error("invalid request: {field}: {reason}")]
    InvalidRequest {
        /// 요청 필드명
        field: String,
        /// 거부 사유
        reason: String,
    },

    /// 프로세스 생성/대기 중 예기치 못한 실패
    #[error("unexpected error: {source}")]
    Spawn {
        /// 실행하려던 바이너리 이름
        binary: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl NmapScannerError {
    /// 호출자용 에러 분류를 반환합니다.
    pub fn kind(&self) -> ScanErrorKind {
        match self {
            Self::BinaryNotFound { .. } => ScanErrorKind::BinaryNotFound,
            Self::ExecutionFailed { .. } => ScanErrorKind::ExecutionFailed,
            Self::EmptyOutput => ScanErrorKind::EmptyOutput,
            Self::OutputTooLarge { .. } => ScanErrorKind::OutputTooLarge,
            Self::Parse { .. } => ScanErrorKind::ParseFailed,
            Self::MissingField { .. } => ScanErrorKind::MissingField,
            Self::InvalidRequest { .. } | Self::Config { .. } => ScanErrorKind::InvalidRequest,
            Self::Spawn { .. } => ScanErrorKind::Unexpected,
        }
    }
}

/// 호출자용 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorKind {
    /// 바이너리 없음
    BinaryNotFound,
    /// 비정상 종료
    ExecutionFailed,
    /// 빈 출력
    EmptyOutput,
    /// 출력 크기 초과
    OutputTooLarge,
    /// XML 파싱 실패
    ParseFailed,
    /// 필수 요소 누락
    MissingField,
    /// 잘못된 요청 또는 설정
    InvalidRequest,
    /// 기타 예기치 못한 실패
    Unexpected,
}

impl ScanErrorKind {
    /// 메트릭 레이블 등에 쓰는 snake_case 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BinaryNotFound => "binary_not_found",
            Self::ExecutionFailed => "execution_failed",
            Self::EmptyOutput => "empty_output",
            Self::OutputTooLarge => "output_too_large",
            Self::ParseFailed => "parse_failed",
            Self::MissingField => "missing_field",
            Self::InvalidRequest => "invalid_request",
            Self::Unexpected => "unexpected",
        }
    }
}

/// 호출자에게 반환되는 스캔 실패 값
///
/// `ScanResult`와 상호 배타적입니다. JSON으로는 `{"error": "...", "kind": "..."}`
/// 형태로 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    /// 실패 분류
    pub kind: ScanErrorKind,
    /// 사람이 읽을 수 있는 메시지
    #[serde(rename = "error")]
    pub message: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ScanError {}

impl From<NmapScannerError> for ScanError {
    fn from(err: NmapScannerError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<NmapScannerError> for ScanpostError {
    fn from(err: NmapScannerError) -> Self {
        let msg = err.to_string();
        let failure = match err {
            NmapScannerError::BinaryNotFound { .. }
            | NmapScannerError::ExecutionFailed { .. }
            | NmapScannerError::EmptyOutput
            | NmapScannerError::Spawn { .. } => ScanFailure::Process(msg),
            NmapScannerError::Parse { .. }
            | NmapScannerError::MissingField { .. }
            | NmapScannerError::OutputTooLarge { .. } => ScanFailure::Normalize(msg),
            NmapScannerError::InvalidRequest { .. } | NmapScannerError::Config { .. } => {
                ScanFailure::InvalidRequest(msg)
            }
        };
        ScanpostError::Scan(failure)
    }
}
