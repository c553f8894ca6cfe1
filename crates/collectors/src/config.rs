//! 모듈 설정: ipmi.yml 파싱 및 검증
//!
//! 설정 문서는 `modules` 아래에 이름별 모듈을 둡니다.
//!
//! ```yaml
//! modules:
//!   default:
//!     user: monitor
//!     pass: "s3cr#t"
//!     driver: LAN_2_0
//!     privilege: user
//!     timeout: 10000
//!     collectors: [ipmi, bmc, sel-events]
//!     exclude_sensor_ids: [2, 29]
//!     sel_events:
//!       - name: correctable_memory_error
//!         regex: Correctable memory error.*
//! ```
//!
//! 알 수 없는 키는 최상위, 모듈, SEL 규칙 어디에 있든 에러입니다.
//! [`ExporterConfig::parse`]는 문법 검사 후 collector 이름과 정규식까지
//! 검증한 뒤에야 값을 돌려주므로, 반환된 설정은 그대로 게시해도 안전합니다.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use ipmi_exporter_core::error::ConfigError;
use ipmi_exporter_freeipmi::BackendConfig;

use crate::collector::DEFAULT_COLLECTORS;
use crate::configured::ConfiguredCollector;
use crate::error::CollectorError;
use crate::registry::CollectorRegistry;

/// fallback에 사용되는 예약 모듈 이름
pub const DEFAULT_MODULE: &str = "default";

// ─── 문서 스키마 (serde) ───────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    modules: BTreeMap<String, ModuleDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct ModuleDocument {
    user: String,
    pass: String,
    privilege: String,
    driver: String,
    timeout: u32,
    collectors: Option<Vec<String>>,
    exclude_sensor_ids: Vec<i64>,
    workaround_flags: Vec<String>,
    collector_cmd: HashMap<String, String>,
    default_args: HashMap<String, Vec<String>>,
    custom_args: HashMap<String, Vec<String>>,
    sel_events: Vec<SelEventDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SelEventDocument {
    name: String,
    regex: String,
}

// ─── 검증된 설정 ────────────────────────────────────────────────────

/// SEL 이벤트 규칙 (컴파일된 정규식)
#[derive(Debug, Clone)]
pub struct SelEventRule {
    /// 규칙 이름 (`name` 레이블 값)
    pub name: String,
    /// 이벤트 설명에 적용할 정규식
    pub regex: Regex,
}

/// 검증이 끝난 모듈 설정
///
/// 로드 후에는 변경되지 않으며, 리로드 시 통째로 교체됩니다.
#[derive(Clone)]
pub struct ModuleConfig {
    /// 사용자 이름
    pub user: String,
    /// 비밀번호
    pub password: String,
    /// privilege level (user, operator, admin)
    pub privilege: String,
    /// FreeIPMI driver type (LAN, LAN_2_0, ...)
    pub driver: String,
    /// 세션 timeout (밀리초, 0 = 도구 기본값)
    pub timeout_ms: u32,
    /// 실행할 collector 이름 (순서 유지)
    pub collectors: Vec<String>,
    /// 제외할 센서 ID
    pub exclude_sensor_ids: Vec<i64>,
    /// FreeIPMI workaround flag
    pub workaround_flags: Vec<String>,
    /// collector별 명령 override
    pub collector_cmd: HashMap<String, String>,
    /// collector별 기본 인자 override (기본 인자를 대체)
    pub default_args: HashMap<String, Vec<String>>,
    /// collector별 추가 인자 (기본 인자 앞에 붙음)
    pub custom_args: HashMap<String, Vec<String>>,
    /// SEL 이벤트 규칙 (순서 유지)
    pub sel_events: Vec<SelEventRule>,
}

impl Default for ModuleConfig {
    /// 설정 파일이 없거나 `default` 모듈이 없을 때 쓰는 내장 기본값
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            privilege: String::new(),
            driver: String::new(),
            timeout_ms: 0,
            collectors: DEFAULT_COLLECTORS.iter().map(|c| (*c).to_owned()).collect(),
            exclude_sensor_ids: Vec::new(),
            workaround_flags: Vec::new(),
            collector_cmd: HashMap::new(),
            default_args: HashMap::new(),
            custom_args: HashMap::new(),
            sel_events: Vec::new(),
        }
    }
}

// 비밀번호가 로그에 남지 않도록 Debug를 직접 구현합니다.
impl fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("privilege", &self.privilege)
            .field("driver", &self.driver)
            .field("timeout_ms", &self.timeout_ms)
            .field("collectors", &self.collectors)
            .field("exclude_sensor_ids", &self.exclude_sensor_ids)
            .field("workaround_flags", &self.workaround_flags)
            .field("collector_cmd", &self.collector_cmd)
            .field("default_args", &self.default_args)
            .field("custom_args", &self.custom_args)
            .field("sel_events", &self.sel_events)
            .finish()
    }
}

impl ModuleConfig {
    fn from_document(
        module: &str,
        doc: ModuleDocument,
        registry: &CollectorRegistry,
    ) -> Result<Self, ConfigError> {
        let collectors = doc.collectors.unwrap_or_else(|| {
            DEFAULT_COLLECTORS.iter().map(|c| (*c).to_owned()).collect()
        });
        for collector in &collectors {
            if !registry.contains(collector) {
                return Err(ConfigError::UnknownCollector {
                    module: module.to_owned(),
                    collector: collector.clone(),
                });
            }
        }

        let sel_events = doc
            .sel_events
            .into_iter()
            .map(|rule| {
                Regex::new(&rule.regex)
                    .map(|regex| SelEventRule {
                        name: rule.name.clone(),
                        regex,
                    })
                    .map_err(|e| ConfigError::InvalidRegex {
                        module: module.to_owned(),
                        rule: rule.name,
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            user: doc.user,
            password: doc.pass,
            privilege: doc.privilege,
            driver: doc.driver,
            timeout_ms: doc.timeout,
            collectors,
            exclude_sensor_ids: doc.exclude_sensor_ids,
            workaround_flags: doc.workaround_flags,
            collector_cmd: doc.collector_cmd,
            default_args: doc.default_args,
            custom_args: doc.custom_args,
            sel_events,
        })
    }

    /// FreeIPMI `--config-file`로 전달할 세션 파라미터
    pub fn backend_config(&self) -> BackendConfig<'_> {
        BackendConfig {
            driver: &self.driver,
            privilege: &self.privilege,
            user: &self.user,
            password: &self.password,
            session_timeout_ms: self.timeout_ms,
            workaround_flags: &self.workaround_flags,
        }
    }

    /// 자격 증명만 바꾼 사본을 만듭니다.
    pub fn with_credentials(&self, user: &str, password: &str) -> Self {
        Self {
            user: user.to_owned(),
            password: password.to_owned(),
            ..self.clone()
        }
    }

    /// collector 목록을 순서대로 레지스트리에서 찾아 override를 적용합니다.
    ///
    /// # Errors
    ///
    /// 로드 이후 레지스트리가 바뀌어 이름을 찾을 수 없으면
    /// [`CollectorError::InvalidName`]을 반환합니다.
    pub fn configured_collectors(
        &self,
        registry: &CollectorRegistry,
    ) -> Result<Vec<ConfiguredCollector>, CollectorError> {
        self.collectors
            .iter()
            .map(|name| {
                registry
                    .get_instance(name)
                    .map(|inner| ConfiguredCollector::new(inner, self))
            })
            .collect()
    }
}

/// 검증된 전체 모듈 설정
#[derive(Debug, Default)]
pub struct ExporterConfig {
    modules: HashMap<String, Arc<ModuleConfig>>,
}

impl ExporterConfig {
    /// YAML 문서를 파싱하고 검증합니다.
    ///
    /// 비어 있거나 주석만 있는 문서는 모듈이 없는 설정입니다.
    ///
    /// # Errors
    ///
    /// 문법 오류나 알 수 없는 키는 [`ConfigError::ParseFailed`],
    /// 등록되지 않은 collector는 [`ConfigError::UnknownCollector`],
    /// 컴파일되지 않는 정규식은 [`ConfigError::InvalidRegex`]입니다.
    pub fn parse(yaml: &str, registry: &CollectorRegistry) -> Result<Self, ConfigError> {
        if is_blank_document(yaml) {
            return Ok(Self::default());
        }

        let doc: ConfigDocument =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseFailed {
                reason: e.to_string(),
            })?;

        let modules = doc
            .modules
            .into_iter()
            .map(|(name, module)| {
                let config = ModuleConfig::from_document(&name, module, registry)?;
                Ok((name, Arc::new(config)))
            })
            .collect::<Result<HashMap<_, _>, ConfigError>>()?;

        Ok(Self { modules })
    }

    /// 이름으로 모듈을 찾습니다.
    pub fn module(&self, name: &str) -> Option<&Arc<ModuleConfig>> {
        self.modules.get(name)
    }

    /// 모듈 이름 (정렬됨)
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// 모듈 수
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// 모듈이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn is_blank_document(yaml: &str) -> bool {
    yaml.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}
