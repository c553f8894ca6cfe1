//! Tracing setup for the exporter process.
//!
//! Scrape, reload and vault events are logged with structured fields
//! (`collector`, `target`, `host`, `error`) so JSON output can be filtered per
//! BMC. Everything goes to stderr; stdout is left to `--validate`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ipmi_exporter_core::settings::GeneralSettings;

/// Installs the global subscriber described by `[general]`.
///
/// `RUST_LOG` wins over `log_level` when it parses. `log_format` is `json`
/// (one object per line) or `pretty`.
///
/// # Errors
///
/// Fails on an unknown format or when a subscriber is already installed.
pub fn init_tracing(config: &GeneralSettings) -> Result<()> {
    let fmt_layer = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            ));
        }
    };

    tracing_subscriber::registry()
        .with(level_filter(&config.log_level))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install {} log subscriber: {}", config.log_format, e))
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
