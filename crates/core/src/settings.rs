//! 런타임 설정: exporter.toml 파싱 및 환경변수 오버라이드
//!
//! [`ExporterSettings`]는 프로세스 단위 설정(로그, 수신 주소, FreeIPMI 경로,
//! collector 제한 시간, Vault 연동)을 담습니다. 대상 BMC별 모듈 설정(YAML)은
//! 다시 읽을 수 있어야 하므로 별도의 config store가 관리합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`IPMI_EXPORTER_WEB_LISTEN_ADDR=0.0.0.0:9290` 형식)
//! 3. 설정 파일 (`exporter.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ipmi_exporter_core::error::ConfigError> {
//! use ipmi_exporter_core::settings::ExporterSettings;
//!
//! let settings = ExporterSettings::load("exporter.toml").await?;
//! let settings = ExporterSettings::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// 환경변수 접두어
pub const ENV_PREFIX: &str = "IPMI_EXPORTER";

/// exporter 런타임 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterSettings {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralSettings,
    /// HTTP 서버 설정
    #[serde(default)]
    pub web: WebSettings,
    /// FreeIPMI 도구 설정
    #[serde(default)]
    pub freeipmi: FreeipmiSettings,
    /// 스크레이프 설정
    #[serde(default)]
    pub scrape: ScrapeSettings,
    /// Vault 자격 증명 설정
    #[serde(default)]
    pub vault: VaultSettings,
}

impl ExporterSettings {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// # Errors
    ///
    /// 파일이 없거나, 파싱에 실패하거나, 오버라이드 후 검증에 실패하면
    /// [`ConfigError`]를 반환합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut settings = Self::from_file(path).await?;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 네이밍 규칙: `IPMI_EXPORTER_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "IPMI_EXPORTER_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "IPMI_EXPORTER_GENERAL_LOG_FORMAT",
        );

        // Web
        override_string(&mut self.web.listen_addr, "IPMI_EXPORTER_WEB_LISTEN_ADDR");

        // FreeIPMI
        override_string(&mut self.freeipmi.path, "IPMI_EXPORTER_FREEIPMI_PATH");

        // Scrape
        override_u64(
            &mut self.scrape.collector_timeout_secs,
            "IPMI_EXPORTER_SCRAPE_COLLECTOR_TIMEOUT_SECS",
        );

        // Vault
        override_bool(&mut self.vault.enabled, "IPMI_EXPORTER_VAULT_ENABLED");
        override_string(&mut self.vault.address, "IPMI_EXPORTER_VAULT_ADDRESS");
        override_string(&mut self.vault.token_file, "IPMI_EXPORTER_VAULT_TOKEN_FILE");
        override_string(&mut self.vault.mount, "IPMI_EXPORTER_VAULT_MOUNT");
        override_u64(
            &mut self.vault.cache_ttl_secs,
            "IPMI_EXPORTER_VAULT_CACHE_TTL_SECS",
        );
        override_u64(
            &mut self.vault.cache_jitter_secs,
            "IPMI_EXPORTER_VAULT_CACHE_JITTER_SECS",
        );
        override_u64(
            &mut self.vault.request_timeout_secs,
            "IPMI_EXPORTER_VAULT_REQUEST_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        if self.web.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "web.listen_addr".to_owned(),
                reason: format!("'{}' is not a socket address", self.web.listen_addr),
            });
        }

        if self.scrape.collector_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scrape.collector_timeout_secs".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }

        if self.vault.enabled {
            if self.vault.address.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "vault.address".to_owned(),
                    reason: "address must not be empty when vault is enabled".to_owned(),
                });
            }
            if self.vault.token_file.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "vault.token_file".to_owned(),
                    reason: "token_file must not be empty when vault is enabled".to_owned(),
                });
            }
            if self.vault.request_timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "vault.request_timeout_secs".to_owned(),
                    reason: "must be greater than zero".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// HTTP 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    /// 수신 주소
    pub listen_addr: String,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9290".to_owned(),
        }
    }
}

/// FreeIPMI 도구 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeipmiSettings {
    /// 도구가 설치된 디렉토리. 비어 있으면 `PATH`에서 찾습니다.
    pub path: String,
}

/// 스크레이프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// collector 하나의 제한 시간 (초)
    pub collector_timeout_secs: u64,
}

impl ScrapeSettings {
    /// 제한 시간을 [`Duration`]으로 반환합니다.
    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector_timeout_secs)
    }
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            collector_timeout_secs: 30,
        }
    }
}

/// Vault 자격 증명 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// Vault 서버 주소
    pub address: String,
    /// 토큰 파일 경로
    pub token_file: String,
    /// KV 마운트 이름
    pub mount: String,
    /// 캐시 유지 시간 (초)
    pub cache_ttl_secs: u64,
    /// 캐시 만료 시각에 더해지는 최대 무작위 지연 (초)
    pub cache_jitter_secs: u64,
    /// Vault 요청 한 건의 제한 시간 (초)
    pub request_timeout_secs: u64,
}

impl VaultSettings {
    /// Vault 요청 제한 시간
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "http://127.0.0.1:8200".to_owned(),
            token_file: String::new(),
            mount: "kv".to_owned(),
            cache_ttl_secs: 8 * 60 * 60,
            cache_jitter_secs: 120 * 60,
            request_timeout_secs: 10,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
