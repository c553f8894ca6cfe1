//! Per-target BMC credentials from a HashiCorp Vault KV store.
//!
//! [`VaultProvider`] reads `{address}/v1/{mount}/{target}` and expects
//! `username` and `password` strings under `data`. The target is encoded as a
//! single path segment, so a scrape target can never address another secret. [`CredentialCache`] keeps
//! each target's credentials for the configured TTL plus a random jitter so
//! a fleet scraped together does not refresh in lockstep. Entries are only
//! refreshed when a scrape finds them expired.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use ipmi_exporter_core::BoxFuture;
use ipmi_exporter_core::settings::VaultSettings;

/// Header carrying the Vault token.
const TOKEN_HEADER: &str = "X-Vault-Token";

/// A username/password pair for one BMC.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Vault lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The HTTP client could not be built.
    #[error("failed to build vault http client: {0}")]
    Client(String),

    /// The target cannot be used as a secret path segment.
    #[error("'{0}' is not a valid vault secret name")]
    InvalidTarget(String),

    /// The token file could not be read.
    #[error("failed to read vault token file {path}: {reason}")]
    TokenFile { path: String, reason: String },

    /// The request did not complete.
    #[error("vault request for '{target}' failed: {reason}")]
    Request { target: String, reason: String },

    /// Vault answered with a non-success status.
    #[error("vault returned {status} for '{target}'")]
    Status { target: String, status: u16 },

    /// The secret exists but lacks a usable field.
    #[error("vault secret for '{target}' has no string field '{field}'")]
    MissingField { target: String, field: &'static str },
}

/// Source of credentials keyed by scrape target.
pub trait CredentialProvider: Send + Sync {
    /// Looks up the credentials for `target`.
    fn fetch<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<Credentials, VaultError>>;
}

// ─── VaultProvider ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct SecretResponse {
    data: HashMap<String, serde_json::Value>,
}

/// KV lookups over HTTP.
///
/// The token file is re-read on every lookup so a rotated token is picked
/// up without a restart.
#[derive(Debug, Clone)]
pub struct VaultProvider {
    client: reqwest::Client,
    address: String,
    mount: String,
    token_file: PathBuf,
}

impl VaultProvider {
    /// Builds a provider whose requests give up after
    /// `settings.request_timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Client`] if the TLS backend cannot be set up.
    pub fn new(settings: &VaultSettings) -> Result<Self, VaultError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| VaultError::Client(e.to_string()))?;

        Ok(Self {
            client,
            address: settings.address.trim_end_matches('/').to_owned(),
            mount: settings.mount.trim_matches('/').to_owned(),
            token_file: PathBuf::from(&settings.token_file),
        })
    }

    fn secret_url(&self, target: &str) -> Result<String, VaultError> {
        // dot segments survive encoding and would be normalised by the URL parser
        if target.is_empty() || target == "." || target == ".." {
            return Err(VaultError::InvalidTarget(target.to_owned()));
        }
        Ok(format!(
            "{}/v1/{}/{}",
            self.address,
            self.mount,
            urlencoding::encode(target)
        ))
    }

    async fn read_token(&self) -> Result<String, VaultError> {
        let raw = tokio::fs::read_to_string(&self.token_file)
            .await
            .map_err(|e| VaultError::TokenFile {
                path: self.token_file.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(raw.trim().to_owned())
    }

    async fn lookup(&self, target: &str) -> Result<Credentials, VaultError> {
        let url = self.secret_url(target)?;
        let token = self.read_token().await?;
        let request_error = |e: reqwest::Error| VaultError::Request {
            target: target.to_owned(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::Status {
                target: target.to_owned(),
                status: status.as_u16(),
            });
        }

        let secret: SecretResponse = response.json().await.map_err(request_error)?;
        let field = |name: &'static str| {
            secret
                .data
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .ok_or_else(|| VaultError::MissingField {
                    target: target.to_owned(),
                    field: name,
                })
        };

        Ok(Credentials {
            username: field("username")?,
            password: field("password")?,
        })
    }
}

impl CredentialProvider for VaultProvider {
    fn fetch<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<Credentials, VaultError>> {
        Box::pin(self.lookup(target))
    }
}

// ─── CredentialCache ────────────────────────────────────────────────

#[derive(Debug)]
struct CachedCredential {
    credentials: Credentials,
    expires_at: Instant,
}

/// One target's cache slot. Its lock is held across a refresh.
type Slot = Arc<Mutex<Option<CachedCredential>>>;

/// Process-wide cache in front of a [`CredentialProvider`].
///
/// Each target has its own slot lock. Concurrent scrapes of one expired
/// target wait for a single lookup, while other targets are never blocked
/// by it. The slot map itself is only locked to find or create a slot.
pub struct CredentialCache {
    provider: Arc<dyn CredentialProvider>,
    ttl: Duration,
    jitter: Duration,
    slots: std::sync::Mutex<HashMap<String, Slot>>,
}

impl CredentialCache {
    pub fn new(provider: Arc<dyn CredentialProvider>, ttl: Duration, jitter: Duration) -> Self {
        Self {
            provider,
            ttl,
            jitter,
            slots: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Builds a cache over [`VaultProvider`] from the `[vault]` section.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Client`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &VaultSettings) -> Result<Self, VaultError> {
        Ok(Self::new(
            Arc::new(VaultProvider::new(settings)?),
            Duration::from_secs(settings.cache_ttl_secs),
            Duration::from_secs(settings.cache_jitter_secs),
        ))
    }

    fn slot(&self, target: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(target.to_owned()).or_default())
    }

    /// Returns cached credentials for `target`, fetching them when missing
    /// or expired.
    ///
    /// # Errors
    ///
    /// Propagates the provider error. A failed refresh leaves no entry, so
    /// the next scrape retries.
    pub async fn get(&self, target: &str) -> Result<Credentials, VaultError> {
        let slot = self.slot(target);
        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.credentials.clone());
            }
            debug!(host = target, "cached credentials expired");
        }

        match self.provider.fetch(target).await {
            Ok(credentials) => {
                *entry = Some(CachedCredential {
                    credentials: credentials.clone(),
                    expires_at: Instant::now() + self.lifetime(),
                });
                Ok(credentials)
            }
            Err(e) => {
                *entry = None;
                Err(e)
            }
        }
    }

    /// TTL plus a uniformly drawn jitter in `[0, jitter]`.
    fn lifetime(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.ttl;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.ttl + Duration::from_millis(extra)
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("ttl", &self.ttl)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}
