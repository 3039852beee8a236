//! 에러 타입 -- 도메인별 에러 정의

/// scanpost 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ScanpostError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 실행/정규화 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanFailure),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 단계별 실패
///
/// 스캐너 크레이트의 세부 에러는 이 분류로 축약되어 상위로 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanFailure {
    /// 외부 프로세스 실행 단계 실패 (바이너리 없음, 비정상 종료, 빈 출력)
    #[error("process failed: {0}")]
    Process(String),

    /// 출력 정규화 단계 실패 (잘못된 XML, 필수 요소 누락)
    #[error("normalization failed: {0}")]
    Normalize(String),

    /// 잘못된 스캔 요청
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
