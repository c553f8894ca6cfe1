//! # ipmi-exporter-core
//!
//! IPMI exporter의 모든 크레이트가 공유하는 기반 타입입니다.
//!
//! - [`error`]: 단계별 에러 타입 (설정, 실행, 파싱, 자격 증명)
//! - [`settings`]: 런타임 설정 (TOML + 환경변수)
//! - [`metrics`]: 메트릭 이름 상수와 스크레이프 단위 샘플 수집/렌더링
//! - [`types`]: 실행 방식과 무관한 BMC 도메인 레코드

pub mod error;
pub mod metrics;
pub mod settings;
pub mod types;

use std::future::Future;
use std::pin::Pin;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, CredentialError, ExecutionError, ParseError};

// 설정
pub use settings::ExporterSettings;

// 메트릭
pub use metrics::{MetricSink, Sample};

// 도메인 타입
pub use types::{
    BmcInfo, ChassisStatus, PowerReading, SelInfo, SensorReading, SensorUnit, WatchdogStatus,
};

/// trait 객체에서 사용할 수 있는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
