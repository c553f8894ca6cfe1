//! collector trait: 이름 있는 메트릭 수집 플러그인
//!
//! collector는 두 가지 실행 방식 중 하나로 구현됩니다.
//!
//! - [`FreeipmiCollector`]: 외부 도구를 실행하고 그 출력을 파싱합니다.
//!   collector는 명령과 기본 인자만 알려 주고, 실행은 orchestrator가 맡습니다.
//! - [`NativeCollector`]: 열린 [`IpmiClient`] 세션으로 직접 명령을 보냅니다.
//!
//! 같은 논리 이름의 collector는 어느 방식이든 같은 메트릭 family를 내보냅니다.
//! 레지스트리는 이 둘을 [`CollectorImpl`]로 감싸 이름으로 찾습니다.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use ipmi_exporter_core::BoxFuture;
use ipmi_exporter_core::metrics::MetricSink;
use ipmi_exporter_freeipmi::ToolOutput;

use crate::config::ModuleConfig;
use crate::error::CollectorError;
use crate::native::IpmiClient;

// ─── collector 이름 ─────────────────────────────────────────────────

/// 센서 collector
pub const IPMI: &str = "ipmi";
/// BMC 정보 collector
pub const BMC: &str = "bmc";
/// BMC watchdog collector
pub const BMC_WATCHDOG: &str = "bmc-watchdog";
/// chassis 상태 collector
pub const CHASSIS: &str = "chassis";
/// DCMI 전력 collector
pub const DCMI: &str = "dcmi";
/// SEL 요약 collector
pub const SEL: &str = "sel";
/// SEL 이벤트 규칙 collector
pub const SEL_EVENTS: &str = "sel-events";
/// Supermicro LAN 모드 collector
pub const SM_LAN_MODE: &str = "sm-lan-mode";

/// 모듈이 collector 목록을 지정하지 않았을 때 쓰는 목록
pub const DEFAULT_COLLECTORS: &[&str] = &[IPMI, DCMI, BMC, CHASSIS];

// ─── ScrapeTarget ───────────────────────────────────────────────────

/// 스크레이프 한 번의 대상과 해석된 모듈 설정
///
/// 해당 스크레이프의 모든 collector 호출에 같은 값이 전달됩니다.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    /// 대상 호스트. 빈 문자열은 로컬 BMC(in-band)입니다.
    pub host: String,
    /// 해석된 모듈 설정
    pub config: Arc<ModuleConfig>,
}

impl ScrapeTarget {
    /// 새 스크레이프 대상을 생성합니다.
    pub fn new(host: impl Into<String>, config: Arc<ModuleConfig>) -> Self {
        Self {
            host: host.into(),
            config,
        }
    }

    /// 로컬 BMC 여부
    pub fn is_local(&self) -> bool {
        self.host.is_empty()
    }
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "[local]")
        } else {
            write!(f, "{}", self.host)
        }
    }
}

// ─── FreeipmiCollector ──────────────────────────────────────────────

/// 외부 도구 기반 collector
pub trait FreeipmiCollector: Send + Sync {
    /// 논리 이름 (`ipmi_up{collector}` 레이블 값)
    fn name(&self) -> &'static str;

    /// 기본 실행 명령
    fn command(&self) -> &'static str;

    /// 기본 인자
    fn default_args(&self) -> &'static [&'static str];

    /// 도구 출력을 파싱해 샘플을 기록합니다.
    ///
    /// 도구가 실패 코드로 끝났더라도 출력이 쓸 만하면 성공으로 처리합니다.
    fn collect(
        &self,
        output: &ToolOutput,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError>;
}

// ─── NativeCollector ────────────────────────────────────────────────

/// 네이티브 프로토콜 기반 collector
///
/// 구현은 `async fn`으로 작성합니다. 레지스트리에는 [`DynNativeCollector`]로
/// 저장됩니다.
pub trait NativeCollector: Send + Sync {
    /// 논리 이름 (`ipmi_up{collector}` 레이블 값)
    fn name(&self) -> &'static str;

    /// 열린 세션으로 값을 읽어 샘플을 기록합니다.
    fn collect(
        &self,
        client: &mut dyn IpmiClient,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> impl Future<Output = Result<(), CollectorError>> + Send;
}

/// dyn-compatible 네이티브 collector
///
/// [`NativeCollector`]의 `impl Future` 반환은 trait 객체로 쓸 수 없으므로
/// blanket 구현으로 future를 boxing 합니다.
pub trait DynNativeCollector: Send + Sync {
    /// 논리 이름
    fn name(&self) -> &'static str;

    /// 열린 세션으로 값을 읽어 샘플을 기록합니다.
    fn collect<'a>(
        &'a self,
        client: &'a mut dyn IpmiClient,
        target: &'a ScrapeTarget,
        sink: &'a mut MetricSink,
    ) -> BoxFuture<'a, Result<(), CollectorError>>;
}

impl<T: NativeCollector> DynNativeCollector for T {
    fn name(&self) -> &'static str {
        NativeCollector::name(self)
    }

    fn collect<'a>(
        &'a self,
        client: &'a mut dyn IpmiClient,
        target: &'a ScrapeTarget,
        sink: &'a mut MetricSink,
    ) -> BoxFuture<'a, Result<(), CollectorError>> {
        Box::pin(NativeCollector::collect(self, client, target, sink))
    }
}

// ─── CollectorImpl ──────────────────────────────────────────────────

/// 레지스트리에 등록되는 collector 구현
#[derive(Clone)]
pub enum CollectorImpl {
    /// 외부 도구 기반
    FreeIpmi(Arc<dyn FreeipmiCollector>),
    /// 네이티브 프로토콜 기반
    Native(Arc<dyn DynNativeCollector>),
}

impl CollectorImpl {
    /// 논리 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::FreeIpmi(c) => c.name(),
            Self::Native(c) => c.name(),
        }
    }
}

impl fmt::Debug for CollectorImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreeIpmi(c) => write!(f, "FreeIpmi({})", c.name()),
            Self::Native(c) => write!(f, "Native({})", c.name()),
        }
    }
}
