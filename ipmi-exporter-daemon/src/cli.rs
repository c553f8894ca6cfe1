//! CLI argument definitions for ipmi-exporter.
//!
//! Uses `clap` v4 derive macros. Flags mirror the settings file; a flag that
//! is given wins over the file and the environment.

use std::path::PathBuf;

use clap::Parser;

use ipmi_exporter_collectors::ExecutionMode;
use ipmi_exporter_core::ExporterSettings;

/// Prometheus exporter for IPMI/BMC sensor and event data.
///
/// Serves `/metrics` for the local BMC and `/ipmi?target=...` for remote
/// BMCs, using the FreeIPMI tools as the execution backend.
#[derive(Parser, Debug)]
#[command(name = "ipmi-exporter")]
#[command(version, about, long_about = None)]
pub struct ExporterCli {
    /// Path to the module configuration file (YAML).
    ///
    /// Without it every scrape uses the built-in defaults.
    #[arg(long = "config.file")]
    pub config_file: Option<PathBuf>,

    /// Path to the exporter settings file (TOML).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Directory holding the FreeIPMI executables (default: look up on PATH).
    #[arg(long = "freeipmi.path")]
    pub freeipmi_path: Option<String>,

    /// Address to listen on for HTTP requests.
    #[arg(long = "web.listen-address")]
    pub listen_address: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Talk IPMI directly instead of running the FreeIPMI tools.
    ///
    /// Applies to every collector in the process. Requires a native
    /// protocol connector; without one the daemon refuses to start.
    #[arg(long = "native-ipmi")]
    pub native_ipmi: bool,

    /// Validate the configuration and exit without serving.
    #[arg(long)]
    pub validate: bool,
}

impl ExporterCli {
    /// Process-wide collector execution mode selected by `--native-ipmi`.
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.native_ipmi {
            ExecutionMode::Native
        } else {
            ExecutionMode::FreeIpmi
        }
    }

    /// Applies the flags that were given on top of `settings`.
    pub fn apply_overrides(&self, settings: &mut ExporterSettings) {
        if let Some(path) = &self.freeipmi_path {
            settings.freeipmi.path.clone_from(path);
        }
        if let Some(addr) = &self.listen_address {
            settings.web.listen_addr.clone_from(addr);
        }
        if let Some(level) = &self.log_level {
            settings.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            settings.general.log_format.clone_from(format);
        }
    }
}
