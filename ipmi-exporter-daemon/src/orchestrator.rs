//! Scrape orchestration -- one request, one target, many collectors.
//!
//! [`ScrapeOrchestrator::scrape`] resolves the module for the target, builds
//! the configured collector list and runs each collector in order. Every
//! collector writes into its own scratch sink which is merged into the
//! response only when the collector succeeds, so a failing collector
//! contributes nothing but `ipmi_up{collector} 0` and an error log line.
//!
//! # Scrape Flow
//!
//! 1. `ConfigStore::config_for_target` (named module, `default`, built-in)
//! 2. credential override from the vault cache (remote targets only, bounded
//!    by the collector deadline)
//! 3. for each collector, under the per-collector deadline:
//!    - FreeIPMI: resolve command, run it through the credential pipe, parse
//!    - native: open a session through the connector, collect, close
//! 4. `ipmi_up{collector}` per collector, then `ipmi_scrape_duration_seconds`

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use ipmi_exporter_collectors::{
    CollectorError, CollectorImpl, ConfigStore, ConfiguredCollector, IpmiConnector, ModuleConfig,
    ScrapeTarget,
};
use ipmi_exporter_core::error::ExecutionError;
use ipmi_exporter_core::metrics::{self as m, MetricSink};
use ipmi_exporter_freeipmi::{Invocation, execute, resolve_command};

use crate::vault::CredentialCache;

/// Runs scrapes against the current configuration.
pub struct ScrapeOrchestrator {
    store: Arc<ConfigStore>,
    /// Directory prefix for relative tool names (empty = `PATH`).
    tool_dir: String,
    collector_timeout: Duration,
    credentials: Option<Arc<CredentialCache>>,
    connector: Option<Arc<dyn IpmiConnector>>,
}

impl ScrapeOrchestrator {
    pub fn new(
        store: Arc<ConfigStore>,
        tool_dir: impl Into<String>,
        collector_timeout: Duration,
    ) -> Self {
        Self {
            store,
            tool_dir: tool_dir.into(),
            collector_timeout,
            credentials: None,
            connector: None,
        }
    }

    /// Looks up remote target credentials in `cache` before each scrape.
    pub fn with_credentials(mut self, cache: Arc<CredentialCache>) -> Self {
        self.credentials = Some(cache);
        self
    }

    /// Session factory for collectors registered in native mode.
    pub fn with_connector(mut self, connector: Arc<dyn IpmiConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Scrapes `host` (empty for the local BMC) with `module`.
    ///
    /// Never fails: collector errors are isolated into `ipmi_up` samples.
    pub async fn scrape(&self, host: &str, module: &str) -> MetricSink {
        let start = Instant::now();
        let mut sink = MetricSink::new();

        let config = self.store.config_for_target(host, module);
        let config = self.apply_credentials(host, config).await;
        let target = ScrapeTarget::new(host, config);

        match target.config.configured_collectors(self.store.registry()) {
            Ok(collectors) => {
                for collector in &collectors {
                    self.run_one(collector, &target, &mut sink).await;
                }
            }
            Err(e) => {
                error!(error = %e, target = %target, module, "failed to build collector list");
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!(duration = elapsed, target = %target, "scrape finished");
        sink.gauge(m::SCRAPE_DURATION_SECONDS, elapsed);
        sink
    }

    async fn apply_credentials(
        &self,
        host: &str,
        config: Arc<ModuleConfig>,
    ) -> Arc<ModuleConfig> {
        let Some(cache) = &self.credentials else {
            return config;
        };
        if host.is_empty() {
            return config;
        }
        match tokio::time::timeout(self.collector_timeout, cache.get(host)).await {
            Ok(Ok(creds)) => Arc::new(config.with_credentials(&creds.username, &creds.password)),
            Ok(Err(e)) => {
                warn!(error = %e, host, "vault lookup failed, keeping module credentials");
                config
            }
            Err(_) => {
                warn!(
                    host,
                    timeout_secs = self.collector_timeout.as_secs_f64(),
                    "vault lookup timed out, keeping module credentials"
                );
                config
            }
        }
    }

    async fn run_one(
        &self,
        collector: &ConfiguredCollector,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) {
        let name = collector.name();
        debug!(collector = name, target = %target, "running collector");

        let mut scratch = MetricSink::new();
        let result = tokio::time::timeout(
            self.collector_timeout,
            self.run_collector(collector, target, &mut scratch),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ExecutionError::Timeout {
                collector: name.to_owned(),
                timeout_secs: self.collector_timeout.as_secs(),
            }
            .into())
        });

        let up = match result {
            Ok(()) => {
                sink.append(scratch);
                1.0
            }
            Err(e) => {
                error!(error = %e, collector = name, target = %target, "collector failed");
                0.0
            }
        };
        sink.gauge_with(m::UP, vec![(m::LABEL_COLLECTOR, name.to_owned())], up);
    }

    async fn run_collector(
        &self,
        collector: &ConfiguredCollector,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        match collector.implementation() {
            CollectorImpl::FreeIpmi(inner) => {
                let command = collector.command().unwrap_or_else(|| inner.command().to_owned());
                let command = resolve_command(&self.tool_dir, &command);
                let args = collector.args();
                let output = execute(Invocation {
                    command: &command,
                    args: &args,
                    host: &target.host,
                    backend_config: target.config.backend_config().render(),
                })
                .await?;
                inner.collect(&output, target, sink)
            }
            CollectorImpl::Native(inner) => {
                let connector = self
                    .connector
                    .as_ref()
                    .ok_or_else(|| CollectorError::NativeUnavailable(collector.name().to_owned()))?;
                let mut client = connector.connect(target).await?;
                let result = inner.collect(client.as_mut(), target, sink).await;
                client.close().await;
                result
            }
        }
    }
}

impl std::fmt::Debug for ScrapeOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeOrchestrator")
            .field("tool_dir", &self.tool_dir)
            .field("collector_timeout", &self.collector_timeout)
            .field("vault", &self.credentials.is_some())
            .field("native", &self.connector.is_some())
            .finish_non_exhaustive()
    }
}
