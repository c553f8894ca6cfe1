//! Daemon assembly and lifecycle.
//!
//! # Startup Order
//!
//! 1. Collector registry in the process-wide execution mode. Native mode
//!    needs an [`IpmiConnector`]; without one the daemon refuses to start.
//! 2. Config store + initial load (a bad file is fatal here, unlike reload)
//! 3. Vault credential cache, when enabled
//! 4. Scrape orchestrator, reload service, HTTP router
//!
//! # Shutdown
//!
//! `SIGTERM` or `SIGINT` stops accepting connections, lets in-flight
//! scrapes finish and then cancels the reload service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use ipmi_exporter_collectors::{CollectorRegistry, ConfigStore, ExecutionMode, IpmiConnector};
use ipmi_exporter_core::ExporterSettings;

use crate::orchestrator::ScrapeOrchestrator;
use crate::reload::{ReloadHandle, ReloadService};
use crate::server::{AppState, router};
use crate::vault::CredentialCache;

/// Fully assembled exporter, ready to serve.
#[derive(Debug)]
pub struct Daemon {
    settings: ExporterSettings,
    orchestrator: Arc<ScrapeOrchestrator>,
    reload_service: ReloadService,
    reload: ReloadHandle,
}

impl Daemon {
    /// Builds every component and performs the initial config load.
    ///
    /// # Errors
    ///
    /// Returns an error if the module config cannot be loaded or validated,
    /// or if `mode` is native (no protocol connector is built in).
    pub async fn build(
        settings: ExporterSettings,
        config_file: Option<PathBuf>,
        mode: ExecutionMode,
    ) -> Result<Self> {
        Self::build_with_connector(settings, config_file, mode, None).await
    }

    /// Like [`Daemon::build`], with a session factory for native mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the module config cannot be loaded or validated,
    /// or if `mode` is native and `connector` is `None`.
    pub async fn build_with_connector(
        settings: ExporterSettings,
        config_file: Option<PathBuf>,
        mode: ExecutionMode,
        connector: Option<Arc<dyn IpmiConnector>>,
    ) -> Result<Self> {
        if mode == ExecutionMode::Native && connector.is_none() {
            return Err(anyhow::anyhow!(
                "native IPMI mode needs a protocol connector and none is configured"
            ));
        }

        let registry = Arc::new(CollectorRegistry::new(mode));
        tracing::debug!(
            mode = %registry.mode(),
            collectors = ?registry.names(),
            "collector registry ready"
        );

        let store = Arc::new(ConfigStore::new(registry));
        store
            .reload(config_file.as_deref())
            .await
            .map_err(|e| anyhow::anyhow!("failed to load module config: {}", e))?;

        let mut orchestrator = ScrapeOrchestrator::new(
            Arc::clone(&store),
            settings.freeipmi.path.clone(),
            settings.scrape.collector_timeout(),
        );
        if settings.vault.enabled {
            tracing::info!(address = %settings.vault.address, "vault credential lookup enabled");
            let cache = CredentialCache::from_settings(&settings.vault)
                .map_err(|e| anyhow::anyhow!("failed to set up vault client: {}", e))?;
            orchestrator = orchestrator.with_credentials(Arc::new(cache));
        }
        if let Some(connector) = connector {
            orchestrator = orchestrator.with_connector(connector);
        }

        let (reload_service, reload) = ReloadService::new(store, config_file);

        Ok(Self {
            settings,
            orchestrator: Arc::new(orchestrator),
            reload_service,
            reload,
        })
    }

    /// Serves HTTP until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or a signal handler
    /// cannot be installed.
    pub async fn run(self) -> Result<()> {
        let addr = self.settings.web.listen_addr.clone();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;

        let cancel = CancellationToken::new();
        let reload_task = tokio::spawn(self.reload_service.run(cancel.clone()));

        let app = router(AppState {
            orchestrator: self.orchestrator,
            reload: self.reload,
        });

        tracing::info!(listen_addr = %addr, "ipmi-exporter listening");
        let shutdown = cancel.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                match wait_for_shutdown_signal().await {
                    Ok(signal) => tracing::info!(signal = signal, "shutdown signal received"),
                    Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
                }
                shutdown.cancel();
            })
            .await
            .map_err(|e| anyhow::anyhow!("http server error: {}", e))?;

        cancel.cancel();
        match reload_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "reload service failed"),
            Err(e) => tracing::error!(error = %e, "reload service task panicked"),
        }

        tracing::info!("ipmi-exporter shut down");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
