//! # ipmi-exporter-collectors
//!
//! collector 플러그인과 그 주변 구성 요소입니다.
//!
//! - [`collector`]: collector trait (FreeIPMI / 네이티브), 스크레이프 대상
//! - [`registry`]: 이름 → 구현 레지스트리, 실행 방식 선택
//! - [`configured`]: 모듈별 명령/인자 override 적용
//! - [`config`]: 모듈 설정 문서 파싱과 검증
//! - [`store`]: 현재 설정 보관과 원자적 리로드
//! - [`aggregator`]: SEL 이벤트 규칙 집계
//! - [`native`]: 네이티브 IPMI 클라이언트 경계
//! - [`collectors`]: 내장 collector 8종
//!
//! # 사용 예시
//! ```ignore
//! let registry = Arc::new(CollectorRegistry::new(ExecutionMode::FreeIpmi));
//! let store = ConfigStore::new(Arc::clone(&registry));
//! store.reload(Some(Path::new("ipmi.yml"))).await?;
//!
//! let config = store.config_for_target("10.0.0.1", "default");
//! for collector in config.configured_collectors(&registry)? {
//!     println!("{} {:?}", collector.name(), collector.args());
//! }
//! ```

pub mod aggregator;
pub mod collector;
pub mod collectors;
pub mod config;
pub mod configured;
pub mod error;
pub mod native;
pub mod registry;
pub mod store;

// --- 주요 타입 re-export ---

pub use aggregator::{EventAggregator, SelRecord, SelSummary};
pub use collector::{
    CollectorImpl, DynNativeCollector, FreeipmiCollector, NativeCollector, ScrapeTarget,
};
pub use config::{DEFAULT_MODULE, ExporterConfig, ModuleConfig, SelEventRule};
pub use configured::ConfiguredCollector;
pub use error::{CollectorError, NativeError};
pub use native::{DeviceId, IpmiClient, IpmiConnector};
pub use registry::{CollectorRegistry, ExecutionMode};
pub use store::ConfigStore;
