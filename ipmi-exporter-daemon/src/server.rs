//! HTTP surface.
//!
//! | path | method | purpose |
//! |---|---|---|
//! | `/` | GET | landing page with a target form |
//! | `/metrics` | GET | scrape of the local BMC with module `default` |
//! | `/ipmi?target=&module=` | GET | scrape of a remote BMC |
//! | `/-/reload` | POST | reload the module config |
//! | `/sd` | GET | HTTP service discovery, one entry per module |
//!
//! A scrape always answers 200; collector failures only show up as
//! `ipmi_up{collector} 0`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use ipmi_exporter_collectors::DEFAULT_MODULE;
use ipmi_exporter_core::metrics::{self as m, MetricSink};

use crate::orchestrator::ScrapeOrchestrator;
use crate::reload::ReloadHandle;

/// Prometheus text exposition format.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const LANDING_PAGE: &str = r#"<html>
<head>
<title>IPMI Exporter</title>
<style>
label { display: inline-block; width: 75px; }
form label, form input { margin: 10px; }
</style>
</head>
<body>
<h1>IPMI Exporter</h1>
<form action="/ipmi">
<label>Target:</label> <input type="text" name="target" placeholder="X.X.X.X" value="1.2.3.4"><br>
<input type="submit" value="Submit">
</form>
<p><a href="/metrics">Local metrics</a></p>
</body>
</html>
"#;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScrapeOrchestrator>,
    pub reload: ReloadHandle,
}

/// Builds the exporter router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/metrics", get(local_metrics))
        .route("/ipmi", get(remote_metrics))
        .route("/-/reload", any(reload))
        .route("/sd", get(service_discovery))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── errors ─────────────────────────────────────────────────────────

/// Handler failures rendered as plain text.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    MethodNotAllowed,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, HeaderValue::from_static("POST"))],
                "Only POST requests allowed",
            )
                .into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

// ─── handlers ───────────────────────────────────────────────────────

async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

fn metrics_response(sink: &MetricSink) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(METRICS_CONTENT_TYPE))],
        sink.render(),
    )
        .into_response()
}

async fn local_metrics(State(state): State<AppState>) -> Response {
    let mut sink = state.orchestrator.scrape("", DEFAULT_MODULE).await;
    sink.gauge_with(
        m::EXPORTER_BUILD_INFO,
        vec![(m::LABEL_VERSION, env!("CARGO_PKG_VERSION").to_owned())],
        1.0,
    );
    metrics_response(&sink)
}

#[derive(Debug, Deserialize)]
struct ScrapeParams {
    target: Option<String>,
    module: Option<String>,
}

async fn remote_metrics(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> Result<Response, ApiError> {
    let target = params
        .target
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("'target' parameter must be specified".to_owned()))?;
    let module = params
        .module
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODULE.to_owned());

    if !state.orchestrator.store().has_module(&module) {
        return Err(ApiError::BadRequest(format!("Unknown module {module:?}")));
    }

    let sink = state.orchestrator.scrape(&target, &module).await;
    Ok(metrics_response(&sink))
}

async fn reload(method: Method, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }
    state.reload.reload().await.map_err(|e| {
        error!(error = %e, "reload request failed");
        ApiError::Internal(format!("failed to reload config: {e}"))
    })?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SdTarget {
    pub targets: Vec<String>,
}

async fn service_discovery(State(state): State<AppState>) -> Json<Vec<SdTarget>> {
    let targets = state
        .orchestrator
        .store()
        .module_names()
        .into_iter()
        .map(|module| SdTarget {
            targets: vec![module],
        })
        .collect();
    Json(targets)
}
