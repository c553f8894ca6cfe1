//! ipmi-exporter daemon library.
//!
//! The binary in `main.rs` is a thin wrapper; everything that can be tested
//! lives here.
//!
//! - [`cli`]: command line flags
//! - [`logging`]: tracing subscriber setup
//! - [`orchestrator`]: one scrape across the configured collectors
//! - [`vault`]: per-target credentials with a TTL cache
//! - [`reload`]: SIGHUP and HTTP triggered config reload
//! - [`server`]: axum router
//! - [`daemon`]: assembly and lifecycle

pub mod cli;
pub mod daemon;
pub mod logging;
pub mod orchestrator;
pub mod reload;
pub mod server;
pub mod vault;
