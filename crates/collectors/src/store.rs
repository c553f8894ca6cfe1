//! 설정 저장소: 현재 모듈 설정의 게시와 교체
//!
//! 읽는 쪽은 [`ConfigStore::snapshot`]으로 `Arc`를 복제해 가져가고,
//! 리로드는 새 [`ExporterConfig`]를 완전히 검증한 뒤 포인터만 바꿉니다.
//! 부분적으로 갱신된 설정을 보는 독자는 없습니다.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info};

use ipmi_exporter_core::error::ConfigError;

use crate::config::{DEFAULT_MODULE, ExporterConfig, ModuleConfig};
use crate::registry::CollectorRegistry;

/// 현재 설정을 보관하는 저장소
#[derive(Debug)]
pub struct ConfigStore {
    registry: Arc<CollectorRegistry>,
    current: RwLock<Arc<ExporterConfig>>,
}

impl ConfigStore {
    /// 모듈이 없는 설정으로 시작하는 저장소를 생성합니다.
    pub fn new(registry: Arc<CollectorRegistry>) -> Self {
        Self {
            registry,
            current: RwLock::new(Arc::new(ExporterConfig::default())),
        }
    }

    /// 설정 파일을 다시 읽습니다.
    ///
    /// `None`은 빈 문서로 취급합니다. 실패하면 기존 설정이 그대로 남습니다.
    ///
    /// # Errors
    ///
    /// 파일이 없거나 읽을 수 없으면 [`ConfigError::FileNotFound`] /
    /// [`ConfigError::ReadFailed`], 검증에 실패하면
    /// [`ExporterConfig::parse`]의 에러를 반환합니다.
    pub async fn reload(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        let content = match path {
            Some(path) => read_config(path).await?,
            None => String::new(),
        };
        self.load_str(&content)?;

        info!(
            path = %path.map(|p| p.display().to_string()).unwrap_or_default(),
            modules = self.snapshot().len(),
            "config loaded"
        );
        Ok(())
    }

    /// YAML 문자열을 검증해 현재 설정으로 게시합니다.
    ///
    /// # Errors
    ///
    /// 검증에 실패하면 기존 설정을 유지하고 에러를 반환합니다.
    pub fn load_str(&self, yaml: &str) -> Result<(), ConfigError> {
        let parsed = Arc::new(ExporterConfig::parse(yaml, &self.registry)?);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = parsed;
        Ok(())
    }

    /// 대상과 모듈 이름으로 사용할 모듈 설정을 결정합니다.
    ///
    /// `host`는 로그에만 쓰입니다. 빈 문자열은 로컬 BMC입니다.
    ///
    /// 1. `module`이 `default`가 아니고 존재하면 그 모듈
    /// 2. 없으면 에러 로그를 남기고 `default` 모듈
    /// 3. `default`도 없으면 내장 기본값 (디버그 로그)
    pub fn config_for_target(&self, host: &str, module: &str) -> Arc<ModuleConfig> {
        let config = self.snapshot();
        let target = if host.is_empty() { "[local]" } else { host };

        if module != DEFAULT_MODULE {
            match config.module(module) {
                Some(found) => return Arc::clone(found),
                None => error!(
                    module,
                    target,
                    "module not found, falling back to default"
                ),
            }
        }

        match config.module(DEFAULT_MODULE) {
            Some(found) => Arc::clone(found),
            None => {
                debug!(
                    module,
                    target,
                    "no default module configured, using built-in defaults"
                );
                Arc::new(ModuleConfig::default())
            }
        }
    }

    /// 모듈 존재 여부
    pub fn has_module(&self, name: &str) -> bool {
        self.snapshot().module(name).is_some()
    }

    /// 모듈 이름 (정렬됨)
    pub fn module_names(&self) -> Vec<String> {
        self.snapshot().module_names()
    }

    /// 현재 설정
    pub fn snapshot(&self) -> Arc<ExporterConfig> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// 설정 검증에 쓰는 레지스트리
    pub fn registry(&self) -> &Arc<CollectorRegistry> {
        &self.registry
    }
}

async fn read_config(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })
}
