//! # ipmi-exporter-freeipmi
//!
//! FreeIPMI 명령행 도구를 서브프로세스로 실행하는 백엔드
//!
//! # 모듈 구조
//!
//! - [`render`]: `--config-file` 텍스트 생성 (`BackendConfig`, 비밀번호 이스케이프)
//! - [`fifo`]: 그 텍스트를 한 번 전달하는 named pipe (`CredentialPipe`)
//! - [`executor`]: 도구 실행과 출력 수집 (`execute`, `ToolOutput`)
//! - [`parser`]: 도구 출력의 line/field 문법과 표 형식 문법
//!
//! # 흐름
//!
//! ```text
//! BackendConfig::render() --> CredentialPipe (0600 FIFO)
//!                                  |
//!        tool <args> --config-file <fifo> [-h host]
//!                                  |
//!                  ToolOutput --> parser --> typed records
//! ```

pub mod executor;
pub mod fifo;
pub mod parser;
pub mod render;

pub use executor::{Invocation, ToolOutput, execute, resolve_command};
pub use fifo::CredentialPipe;
pub use render::{BackendConfig, escape_password};
