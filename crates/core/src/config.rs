//! 설정 관리 -- scanpost.toml 파싱 및 런타임 설정
//!
//! [`ScanpostConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SCANPOST_NMAP_BINARY=/usr/bin/nmap` 형식)
//! 3. 설정 파일 (`scanpost.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scanpost_core::error::ScanpostError> {
//! use scanpost_core::config::ScanpostConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScanpostConfig::load("scanpost.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScanpostConfig::parse("[nmap]\nbinary = \"/opt/nmap/bin/nmap\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ScanpostError};

/// nmap 출력 최대 허용 크기 상한 (1 GiB)
pub const MAX_OUTPUT_SIZE_LIMIT: usize = 1024 * 1024 * 1024;

/// scanpost 통합 설정
///
/// `scanpost.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanpostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// nmap 실행 설정
    #[serde(default)]
    pub nmap: NmapConfig,
}

impl ScanpostConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScanpostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값(+ 환경변수 오버라이드)으로 대체합니다.
    ///
    /// 파일이 존재하지만 파싱/검증에 실패하면 에러를 그대로 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ScanpostError> {
        match Self::load(path.as_ref()).await {
            Err(ScanpostError::Config(ConfigError::FileNotFound { path })) => {
                tracing::debug!(path = %path, "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScanpostError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanpostError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ScanpostError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ScanpostError> {
        toml::from_str(toml_str).map_err(|e| {
            ScanpostError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SCANPOST_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "SCANPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCANPOST_GENERAL_LOG_FORMAT");

        override_string(&mut self.nmap.binary, "SCANPOST_NMAP_BINARY");
        override_string(
            &mut self.nmap.default_options,
            "SCANPOST_NMAP_DEFAULT_OPTIONS",
        );
        override_usize(
            &mut self.nmap.max_output_size,
            "SCANPOST_NMAP_MAX_OUTPUT_SIZE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScanpostError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.nmap.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "nmap.binary".to_owned(),
                reason: "binary must not be empty".to_owned(),
            }
            .into());
        }

        if self.nmap.max_output_size == 0 || self.nmap.max_output_size > MAX_OUTPUT_SIZE_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "nmap.max_output_size".to_owned(),
                reason: format!("must be 1-{MAX_OUTPUT_SIZE_LIMIT}"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// nmap 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NmapConfig {
    /// 실행할 nmap 바이너리 (PATH 검색 또는 절대 경로)
    pub binary: String,
    /// 호출자가 옵션을 비워 둘 때 사용할 기본 옵션
    pub default_options: String,
    /// 표준 출력 최대 허용 크기 (바이트)
    pub max_output_size: usize,
}

impl Default for NmapConfig {
    fn default() -> Self {
        Self {
            binary: "nmap".to_owned(),
            default_options: String::new(),
            max_output_size: 64 * 1024 * 1024, // 64 MB
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
