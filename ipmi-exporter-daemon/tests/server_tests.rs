//! HTTP surface tests driven through `tower::ServiceExt::oneshot`.
//!
//! The tool directory points at an empty temp dir, so scrapes complete
//! quickly with every collector down.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

use ipmi_exporter::orchestrator::ScrapeOrchestrator;
use ipmi_exporter::reload::ReloadService;
use ipmi_exporter::server::{AppState, METRICS_CONTENT_TYPE, SdTarget, router};
use ipmi_exporter_collectors::{CollectorRegistry, ConfigStore, ExecutionMode};

const IPMI_YML: &str = "\
modules:
  default:
    collectors: [chassis]
  dell:
    collectors: [bmc]
";

struct TestApp {
    app: Router,
    store: Arc<ConfigStore>,
    cancel: CancellationToken,
    _tools: tempfile::TempDir,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Router over `yaml` (if any) with a running reload service reading `config_file`.
fn test_app(yaml: Option<&str>, config_file: Option<PathBuf>) -> TestApp {
    let tools = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(Arc::new(CollectorRegistry::new(
        ExecutionMode::FreeIpmi,
    ))));
    if let Some(yaml) = yaml {
        store.load_str(yaml).unwrap();
    }

    let orchestrator = Arc::new(ScrapeOrchestrator::new(
        Arc::clone(&store),
        tools.path().display().to_string(),
        Duration::from_secs(5),
    ));
    let (service, reload) = ReloadService::new(Arc::clone(&store), config_file);
    let cancel = CancellationToken::new();
    tokio::spawn(service.run(cancel.clone()));

    TestApp {
        app: router(AppState {
            orchestrator,
            reload,
        }),
        store,
        cancel,
        _tools: tools,
    }
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn landing_page_links_metrics() {
    let t = test_app(None, None);
    let (status, body) = send(&t.app, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("href=\"/metrics\""));
    assert!(body.contains("action=\"/ipmi\""));
}

#[tokio::test]
async fn local_metrics_always_succeed_with_build_info() {
    // Given: no config file and no tools
    let t = test_app(None, None);

    // When
    let response = t
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Then: 200 with every default collector down
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        METRICS_CONTENT_TYPE
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("ipmi_up{collector=\"ipmi\"} 0"));
    assert!(text.contains("ipmi_up{collector=\"chassis\"} 0"));
    assert!(text.contains("ipmi_scrape_duration_seconds"));
    assert!(text.contains(&format!(
        "ipmi_exporter_build_info{{version=\"{}\"}} 1",
        env!("CARGO_PKG_VERSION")
    )));
}

#[tokio::test]
async fn remote_scrape_requires_target() {
    let t = test_app(Some(IPMI_YML), None);

    let (status, body) = send(&t.app, "GET", "/ipmi").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "'target' parameter must be specified");

    let (status, _) = send(&t.app, "GET", "/ipmi?target=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remote_scrape_rejects_unknown_module() {
    let t = test_app(Some(IPMI_YML), None);

    let (status, body) = send(&t.app, "GET", "/ipmi?target=10.0.0.1&module=hp").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Unknown module \"hp\"");
}

#[tokio::test]
async fn remote_scrape_uses_requested_module() {
    let t = test_app(Some(IPMI_YML), None);

    let (status, body) = send(&t.app, "GET", "/ipmi?target=10.0.0.1&module=dell").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ipmi_up{collector=\"bmc\"} 0"));
    assert!(!body.contains("collector=\"chassis\""));
    assert!(!body.contains("ipmi_exporter_build_info"));

    // module omitted means default
    let (status, body) = send(&t.app, "GET", "/ipmi?target=10.0.0.1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ipmi_up{collector=\"chassis\"} 0"));
}

#[tokio::test]
async fn reload_only_accepts_post() {
    let t = test_app(None, None);

    let response = t
        .app
        .clone()
        .oneshot(Request::get("/-/reload").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
}

#[tokio::test]
async fn reload_picks_up_new_modules() {
    // Given: a config file with only `default`
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"modules:\n  default:\n    collectors: [sel]\n")
        .unwrap();
    let t = test_app(None, Some(file.path().into()));

    // When: the file gains a module and a reload is posted
    std::fs::write(file.path(), IPMI_YML).unwrap();
    let (status, _) = send(&t.app, "POST", "/-/reload").await;

    // Then
    assert_eq!(status, StatusCode::OK);
    assert!(t.store.has_module("dell"));
}

#[tokio::test]
async fn failed_reload_is_500_and_keeps_config() {
    // Given: a loaded config and a broken file on disk
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"modules:\n  default:\n    collectors: [nope]\n")
        .unwrap();
    let t = test_app(Some(IPMI_YML), Some(file.path().into()));

    // When
    let (status, body) = send(&t.app, "POST", "/-/reload").await;

    // Then
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("failed to reload config:"));
    assert!(body.contains("nope"));
    assert!(t.store.has_module("dell"));
}

#[tokio::test]
async fn service_discovery_lists_modules() {
    let t = test_app(Some(IPMI_YML), None);

    let (status, body) = send(&t.app, "GET", "/sd").await;
    assert_eq!(status, StatusCode::OK);
    let targets: Vec<SdTarget> = serde_json::from_str(&body).unwrap();
    assert_eq!(
        targets,
        vec![
            SdTarget {
                targets: vec!["default".to_owned()]
            },
            SdTarget {
                targets: vec!["dell".to_owned()]
            },
        ]
    );
}

#[tokio::test]
async fn service_discovery_without_config_is_empty_array() {
    let t = test_app(None, None);

    let (status, body) = send(&t.app, "GET", "/sd").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}
