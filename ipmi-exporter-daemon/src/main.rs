use anyhow::Result;
use clap::Parser;

use ipmi_exporter::cli::ExporterCli;
use ipmi_exporter::daemon::Daemon;
use ipmi_exporter::logging::init_tracing;
use ipmi_exporter_collectors::{CollectorRegistry, ExporterConfig};
use ipmi_exporter_core::ExporterSettings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ExporterCli::parse();

    let mut settings = match &cli.settings {
        Some(path) => ExporterSettings::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load settings: {}", e))?,
        None => {
            let mut settings = ExporterSettings::default();
            settings.apply_env_overrides();
            settings
        }
    };
    cli.apply_overrides(&mut settings);
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("settings validation failed: {}", e))?;

    if cli.validate {
        return validate_only(&cli).await;
    }

    init_tracing(&settings.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ipmi-exporter");

    let daemon = Daemon::build(settings, cli.config_file.clone(), cli.execution_mode()).await?;
    daemon.run().await
}

/// Parses the module config and reports the result without serving.
async fn validate_only(cli: &ExporterCli) -> Result<()> {
    let Some(path) = &cli.config_file else {
        println!("settings OK, no module config given");
        return Ok(());
    };

    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let registry = CollectorRegistry::new(cli.execution_mode());
    let config = ExporterConfig::parse(&yaml, &registry)
        .map_err(|e| anyhow::anyhow!("module config invalid: {}", e))?;

    println!("config OK: {} module(s)", config.len());
    Ok(())
}
