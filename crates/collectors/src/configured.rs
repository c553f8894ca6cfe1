//! 모듈별 override가 적용된 collector

use crate::collector::CollectorImpl;
use crate::config::ModuleConfig;

/// 레지스트리 항목에 모듈의 명령/인자 override를 덧붙인 collector
///
/// 인자 순서는 `custom_args` 다음에 기본 인자입니다. `default_args`
/// override가 있으면 내장 기본 인자를 대체합니다(덧붙이지 않음).
/// `custom_args`가 앞에 오므로 `collector_cmd: sudo` +
/// `custom_args: [ipmimonitoring]` 같은 wrapper 구성이 가능합니다.
#[derive(Debug, Clone)]
pub struct ConfiguredCollector {
    inner: CollectorImpl,
    command: Option<String>,
    default_args: Option<Vec<String>>,
    custom_args: Vec<String>,
}

impl ConfiguredCollector {
    /// 모듈 설정에서 이 collector에 해당하는 override를 꺼내 적용합니다.
    pub fn new(inner: CollectorImpl, config: &ModuleConfig) -> Self {
        let name = inner.name();
        Self {
            command: config.collector_cmd.get(name).cloned(),
            default_args: config.default_args.get(name).cloned(),
            custom_args: config.custom_args.get(name).cloned().unwrap_or_default(),
            inner,
        }
    }

    /// 논리 이름
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// 감싼 구현
    pub fn implementation(&self) -> &CollectorImpl {
        &self.inner
    }

    /// 실행할 명령. 네이티브 collector는 `None`입니다.
    pub fn command(&self) -> Option<String> {
        match &self.inner {
            CollectorImpl::FreeIpmi(c) => Some(
                self.command
                    .clone()
                    .unwrap_or_else(|| c.command().to_owned()),
            ),
            CollectorImpl::Native(_) => None,
        }
    }

    /// 실행 인자 (`custom_args` + 기본 인자 또는 override)
    pub fn args(&self) -> Vec<String> {
        let defaults: Vec<String> = match (&self.default_args, &self.inner) {
            (Some(overridden), _) => overridden.clone(),
            (None, CollectorImpl::FreeIpmi(c)) => {
                c.default_args().iter().map(|a| (*a).to_owned()).collect()
            }
            (None, CollectorImpl::Native(_)) => Vec::new(),
        };

        let mut args = self.custom_args.clone();
        args.extend(defaults);
        args
    }
}
