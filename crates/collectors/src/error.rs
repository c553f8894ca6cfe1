//! collector 에러 타입
//!
//! [`CollectorError`]는 collector 한 번의 실행에서 생길 수 있는 모든 실패를
//! 담습니다. orchestrator는 이 에러를 로그로 남기고 해당 collector의
//! `ipmi_up`만 0으로 기록합니다.

use ipmi_exporter_core::error::{ExecutionError, ParseError};

/// collector 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// 레지스트리에 없는 collector 이름
    #[error("invalid collector name: {0}")]
    InvalidName(String),

    /// 외부 도구 실행 실패
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// 도구 출력 파싱 실패
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// 네이티브 프로토콜 호출 실패
    #[error(transparent)]
    Native(#[from] NativeError),

    /// 네이티브 모드 collector인데 connector가 구성되지 않음
    #[error("collector '{0}' needs a native IPMI connector, none is configured")]
    NativeUnavailable(String),
}

/// 네이티브 IPMI 클라이언트 에러
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    /// 세션 연결 실패
    #[error("failed to connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    /// 명령 실행 실패 (completion code 포함)
    #[error("ipmi command '{command}' failed: {reason}")]
    Command { command: String, reason: String },

    /// BMC가 지원하지 않는 기능
    #[error("not supported by BMC: {0}")]
    Unsupported(String),
}
