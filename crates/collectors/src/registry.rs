//! collector 레지스트리: 이름으로 구현을 찾습니다.
//!
//! 실행 방식은 프로세스 전역으로 한 번 정해지고, 레지스트리를 만들 때
//! 이름마다 그 방식의 구현을 등록합니다. 이후 조회에는 모드 분기가 없습니다.
//!
//! # 사용 예시
//! ```ignore
//! let registry = CollectorRegistry::new(ExecutionMode::FreeIpmi);
//! let collector = registry.get_instance("ipmi")?;
//! assert_eq!(collector.name(), "ipmi");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::collector::CollectorImpl;
use crate::collectors::{bmc, bmc_watchdog, chassis, dcmi, ipmi, sel, sel_events, sm_lan_mode};
use crate::error::CollectorError;

/// 프로세스 전역 실행 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// FreeIPMI 도구를 서브프로세스로 실행
    FreeIpmi,
    /// IPMI 프로토콜 클라이언트로 직접 통신
    Native,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreeIpmi => write!(f, "freeipmi"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// 이름 → collector 구현
#[derive(Debug, Clone)]
pub struct CollectorRegistry {
    mode: ExecutionMode,
    collectors: HashMap<&'static str, CollectorImpl>,
}

impl CollectorRegistry {
    /// 내장 collector를 모두 등록한 레지스트리를 생성합니다.
    pub fn new(mode: ExecutionMode) -> Self {
        let mut registry = Self::empty(mode);
        let builtins: Vec<CollectorImpl> = match mode {
            ExecutionMode::FreeIpmi => vec![
                CollectorImpl::FreeIpmi(Arc::new(ipmi::FreeipmiSensors)),
                CollectorImpl::FreeIpmi(Arc::new(bmc::FreeipmiBmc)),
                CollectorImpl::FreeIpmi(Arc::new(bmc_watchdog::FreeipmiBmcWatchdog)),
                CollectorImpl::FreeIpmi(Arc::new(chassis::FreeipmiChassis)),
                CollectorImpl::FreeIpmi(Arc::new(dcmi::FreeipmiDcmi)),
                CollectorImpl::FreeIpmi(Arc::new(sel::FreeipmiSel)),
                CollectorImpl::FreeIpmi(Arc::new(sel_events::FreeipmiSelEvents)),
                CollectorImpl::FreeIpmi(Arc::new(sm_lan_mode::FreeipmiSmLanMode)),
            ],
            ExecutionMode::Native => vec![
                CollectorImpl::Native(Arc::new(ipmi::NativeSensors)),
                CollectorImpl::Native(Arc::new(bmc::NativeBmc)),
                CollectorImpl::Native(Arc::new(bmc_watchdog::NativeBmcWatchdog)),
                CollectorImpl::Native(Arc::new(chassis::NativeChassis)),
                CollectorImpl::Native(Arc::new(dcmi::NativeDcmi)),
                CollectorImpl::Native(Arc::new(sel::NativeSel)),
                CollectorImpl::Native(Arc::new(sel_events::NativeSelEvents)),
                CollectorImpl::Native(Arc::new(sm_lan_mode::NativeSmLanMode)),
            ],
        };
        for collector in builtins {
            registry.register(collector);
        }
        registry
    }

    /// 아무것도 등록되지 않은 레지스트리를 생성합니다.
    pub fn empty(mode: ExecutionMode) -> Self {
        Self {
            mode,
            collectors: HashMap::new(),
        }
    }

    /// collector를 등록합니다. 같은 이름이 있으면 교체합니다.
    pub fn register(&mut self, collector: CollectorImpl) {
        self.collectors.insert(collector.name(), collector);
    }

    /// 이름으로 collector를 찾습니다.
    ///
    /// # Errors
    ///
    /// 등록되지 않은 이름이면 [`CollectorError::InvalidName`]을 반환합니다.
    pub fn get_instance(&self, name: &str) -> Result<CollectorImpl, CollectorError> {
        self.collectors
            .get(name)
            .cloned()
            .ok_or_else(|| CollectorError::InvalidName(name.to_owned()))
    }

    /// 이름이 등록되어 있는지 여부
    pub fn contains(&self, name: &str) -> bool {
        self.collectors.contains_key(name)
    }

    /// 등록된 이름 (정렬됨)
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.collectors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// 실행 방식
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}
