//! Module config reload on `SIGHUP` or `POST /-/reload`.
//!
//! A single [`ReloadService`] task owns reloading. HTTP handlers hold a
//! cloneable [`ReloadHandle`] and wait for the outcome of their own request;
//! a signal-triggered reload only logs. A failed reload keeps the previous
//! config published.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ipmi_exporter_collectors::ConfigStore;
use ipmi_exporter_core::error::ConfigError;

/// Pending admin requests before senders wait.
const REQUEST_CHANNEL_CAPACITY: usize = 8;

/// Reload request outcome seen by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// The new document was rejected; the previous one stays active.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The reload task is not running.
    #[error("reload service is not running")]
    Unavailable,
}

type ReplyTx = oneshot::Sender<Result<(), ConfigError>>;

/// Sender side used by the HTTP surface.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: mpsc::Sender<ReplyTx>,
}

impl ReloadHandle {
    /// Asks the service to reload and waits for the result.
    pub async fn reload(&self) -> Result<(), ReloadError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(reply_tx)
            .await
            .map_err(|_| ReloadError::Unavailable)?;
        reply_rx.await.map_err(|_| ReloadError::Unavailable)??;
        Ok(())
    }
}

/// The task that performs reloads.
#[derive(Debug)]
pub struct ReloadService {
    store: Arc<ConfigStore>,
    config_file: Option<PathBuf>,
    rx: mpsc::Receiver<ReplyTx>,
}

impl ReloadService {
    /// Creates the service and the handle that feeds it.
    pub fn new(store: Arc<ConfigStore>, config_file: Option<PathBuf>) -> (Self, ReloadHandle) {
        let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        (
            Self {
                store,
                config_file,
                rx,
            },
            ReloadHandle { tx },
        )
    }

    async fn reload(&self) -> Result<(), ConfigError> {
        let result = self.store.reload(self.config_file.as_deref()).await;
        if let Err(e) = &result {
            error!(error = %e, "Error reloading config");
        }
        result
    }

    /// Serves reload requests until `cancel` fires or every handle is gone.
    ///
    /// # Errors
    ///
    /// Returns an error only if the `SIGHUP` handler cannot be installed.
    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sighup = signal(SignalKind::hangup())
            .map_err(|e| anyhow::anyhow!("failed to install SIGHUP handler: {}", e))?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sighup.recv() => {
                    info!("SIGHUP received, reloading config");
                    let _ = self.reload().await;
                }
                request = self.rx.recv() => {
                    let Some(reply) = request else { break };
                    info!("reload requested over HTTP");
                    let result = self.reload().await;
                    // requester may have gone away
                    let _ = reply.send(result);
                }
            }
        }

        info!("reload service stopped");
        Ok(())
    }
}
