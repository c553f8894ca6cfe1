//! Scrape orchestration against fake FreeIPMI tools and a fake native client.
//!
//! Each fake tool is a shell script run through `collector_cmd: sh` with the
//! script path as custom argument. Every script appends the `--config-file`
//! path it was given to `pipes.log` so tests can check the credential pipe
//! is gone afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ipmi_exporter::orchestrator::ScrapeOrchestrator;
use ipmi_exporter::vault::{CredentialCache, CredentialProvider, Credentials, VaultError};
use ipmi_exporter_collectors::{
    CollectorRegistry, ConfigStore, DeviceId, ExecutionMode, IpmiClient, IpmiConnector,
    NativeError, ScrapeTarget, SelRecord,
};
use ipmi_exporter_core::BoxFuture;
use ipmi_exporter_core::metrics::{self as m, MetricSink};
use ipmi_exporter_core::types::{
    ChassisStatus, PowerReading, SelInfo, SensorReading, WatchdogStatus,
};

const RECORD_PIPE: &str = r#"
for a in "$@"; do
  if [ "$prev" = "--config-file" ]; then echo "$a" >> "$(dirname "$0")/pipes.log"; fi
  prev="$a"
done
"#;

const CHASSIS_BODY: &str = r#"
cat <<'EOF'
System Power                         : on
Power overload                       : false
Drive Fault                          : false
Cooling/fan fault                    : true
EOF
"#;

const DCMI_BODY: &str = r#"
cat <<'EOF'
Current Power                        : 245 Watts
Minimum Power over sampling duration : 180 watts
Power Measurement                    : Active
EOF
"#;

const BMC_FAILING_BODY: &str = r#"
echo "ipmi_ctx_open_outofband: connection timeout"
exit 1
"#;

const SLOW_BODY: &str = "sleep 5\n";

const CAPTURE_CONFIG_BODY: &str = r#"
prev=""
for a in "$@"; do
  if [ "$prev" = "--config-file" ]; then cat "$a" > "$(dirname "$0")/config.log"; fi
  prev="$a"
done
echo "System Power : on"
"#;

struct FakeTools {
    dir: tempfile::TempDir,
}

impl FakeTools {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{name}.sh"));
        std::fs::write(&path, format!("#!/bin/sh\n{RECORD_PIPE}{body}")).unwrap();
        path
    }

    fn recorded_pipes(&self) -> Vec<PathBuf> {
        std::fs::read_to_string(self.dir.path().join("pipes.log"))
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }
}

/// Module `default` running `collectors` through `sh <script>`.
fn module_yaml(collectors: &[(&str, &Path)]) -> String {
    let names: Vec<_> = collectors.iter().map(|(n, _)| *n).collect();
    let mut yaml = format!(
        "modules:\n  default:\n    user: admin\n    pass: secret\n    collectors: [{}]\n    collector_cmd:\n",
        names.join(", ")
    );
    for (name, _) in collectors {
        yaml.push_str(&format!("      {name}: sh\n"));
    }
    yaml.push_str("    custom_args:\n");
    for (name, script) in collectors {
        yaml.push_str(&format!("      {name}: [\"{}\"]\n", script.display()));
    }
    yaml
}

fn orchestrator(yaml: &str, timeout: Duration) -> ScrapeOrchestrator {
    let store = Arc::new(ConfigStore::new(Arc::new(CollectorRegistry::new(
        ExecutionMode::FreeIpmi,
    ))));
    store.load_str(yaml).unwrap();
    ScrapeOrchestrator::new(store, "", timeout)
}

fn up(sink: &MetricSink, collector: &str) -> f64 {
    sink.find(m::UP, (m::LABEL_COLLECTOR, collector))
        .unwrap_or_else(|| panic!("no ipmi_up for {collector}"))
        .value
}

fn up_order(sink: &MetricSink) -> Vec<String> {
    sink.by_name(m::UP)
        .filter_map(|s| s.label(m::LABEL_COLLECTOR).map(str::to_owned))
        .collect()
}

#[tokio::test]
async fn collectors_run_in_configured_order() {
    // Given: a module listing dcmi before chassis
    let tools = FakeTools::new();
    let dcmi = tools.script("dcmi", DCMI_BODY);
    let chassis = tools.script("chassis", CHASSIS_BODY);
    let orch = orchestrator(
        &module_yaml(&[("dcmi", &dcmi), ("chassis", &chassis)]),
        Duration::from_secs(10),
    );

    // When: scraping a remote target
    let sink = orch.scrape("10.0.0.1", "default").await;

    // Then: both succeed, in list order, and their samples are present
    assert_eq!(up_order(&sink), vec!["dcmi", "chassis"]);
    assert_eq!(up(&sink, "dcmi"), 1.0);
    assert_eq!(up(&sink, "chassis"), 1.0);
    assert_eq!(
        sink.by_name(m::DCMI_POWER_CONSUMPTION_WATTS).next().unwrap().value,
        245.0
    );
    assert_eq!(sink.by_name(m::CHASSIS_POWER_STATE).next().unwrap().value, 1.0);
    assert_eq!(
        sink.by_name(m::CHASSIS_COOLING_FAULT_STATE).next().unwrap().value,
        0.0
    );
    assert_eq!(sink.by_name(m::SCRAPE_DURATION_SECONDS).count(), 1);
}

#[tokio::test]
async fn failing_collector_is_isolated() {
    // Given: bmc fails between two working collectors
    let tools = FakeTools::new();
    let chassis = tools.script("chassis", CHASSIS_BODY);
    let bmc = tools.script("bmc", BMC_FAILING_BODY);
    let dcmi = tools.script("dcmi", DCMI_BODY);
    let orch = orchestrator(
        &module_yaml(&[("chassis", &chassis), ("bmc", &bmc), ("dcmi", &dcmi)]),
        Duration::from_secs(10),
    );

    // When
    let sink = orch.scrape("10.0.0.1", "default").await;

    // Then: only bmc is down and it contributes no samples
    assert_eq!(up(&sink, "chassis"), 1.0);
    assert_eq!(up(&sink, "bmc"), 0.0);
    assert_eq!(up(&sink, "dcmi"), 1.0);
    assert_eq!(sink.by_name(m::BMC_INFO).count(), 0);
}

#[tokio::test]
async fn credential_pipes_are_removed_after_each_run() {
    // Given
    let tools = FakeTools::new();
    let chassis = tools.script("chassis", CHASSIS_BODY);
    let bmc = tools.script("bmc", BMC_FAILING_BODY);
    let orch = orchestrator(
        &module_yaml(&[("chassis", &chassis), ("bmc", &bmc)]),
        Duration::from_secs(10),
    );

    // When
    orch.scrape("10.0.0.1", "default").await;

    // Then: one pipe per run, none left on disk, success or not
    let pipes = tools.recorded_pipes();
    assert_eq!(pipes.len(), 2);
    for pipe in pipes {
        assert!(!pipe.exists(), "{} still exists", pipe.display());
    }
}

#[tokio::test]
async fn slow_collector_times_out_without_blocking_the_rest() {
    // Given: a collector that outlives its deadline
    let tools = FakeTools::new();
    let slow = tools.script("chassis", SLOW_BODY);
    let dcmi = tools.script("dcmi", DCMI_BODY);
    let orch = orchestrator(
        &module_yaml(&[("chassis", &slow), ("dcmi", &dcmi)]),
        Duration::from_millis(300),
    );

    // When
    let started = std::time::Instant::now();
    let sink = orch.scrape("10.0.0.1", "default").await;

    // Then
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(up(&sink, "chassis"), 0.0);
    assert_eq!(up(&sink, "dcmi"), 1.0);
}

#[tokio::test]
async fn missing_tool_marks_every_collector_down() {
    // Given: no config, so built-in defaults with a tool directory that has nothing
    let empty = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(Arc::new(CollectorRegistry::new(
        ExecutionMode::FreeIpmi,
    ))));
    let orch = ScrapeOrchestrator::new(
        store,
        empty.path().display().to_string(),
        Duration::from_secs(5),
    );

    // When
    let sink = orch.scrape("", "default").await;

    // Then: the scrape still completes with all four down
    assert_eq!(up_order(&sink), vec!["ipmi", "dcmi", "bmc", "chassis"]);
    assert!(sink.by_name(m::UP).all(|s| s.value == 0.0));
}

// ─── vault credentials ──────────────────────────────────────────────

struct StaticVault;

impl CredentialProvider for StaticVault {
    fn fetch<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<Credentials, VaultError>> {
        Box::pin(async move {
            if target == "10.0.0.9" {
                // an unresponsive vault
                std::future::pending::<()>().await;
            }
            if target == "10.0.0.1" {
                Ok(Credentials {
                    username: "vault-user".to_owned(),
                    password: "vault#pw".to_owned(),
                })
            } else {
                Err(VaultError::Status {
                    target: target.to_owned(),
                    status: 404,
                })
            }
        })
    }
}

fn vault_orchestrator(tools: &FakeTools, timeout: Duration) -> ScrapeOrchestrator {
    let script = tools.script("chassis", CAPTURE_CONFIG_BODY);
    let cache = CredentialCache::new(
        Arc::new(StaticVault),
        Duration::from_secs(60),
        Duration::ZERO,
    );
    orchestrator(&module_yaml(&[("chassis", &script)]), timeout).with_credentials(Arc::new(cache))
}

fn captured_config(tools: &FakeTools) -> String {
    std::fs::read_to_string(tools.dir.path().join("config.log")).unwrap()
}

#[tokio::test]
async fn vault_credentials_replace_module_credentials() {
    // Given: the module says admin/secret, the vault knows this target
    let tools = FakeTools::new();
    let orch = vault_orchestrator(&tools, Duration::from_secs(10));

    // When
    let sink = orch.scrape("10.0.0.1", "default").await;

    // Then: the tool read the vault pair through the pipe
    assert_eq!(up(&sink, "chassis"), 1.0);
    let config = captured_config(&tools);
    assert!(config.contains("username vault-user\n"));
    assert!(config.contains("password vault\\#pw\n"));
}

#[tokio::test]
async fn vault_failure_keeps_module_credentials() {
    // Given: the vault has nothing for this target
    let tools = FakeTools::new();
    let orch = vault_orchestrator(&tools, Duration::from_secs(10));

    // When
    let sink = orch.scrape("10.0.0.2", "default").await;

    // Then: the scrape goes ahead with the static pair
    assert_eq!(up(&sink, "chassis"), 1.0);
    let config = captured_config(&tools);
    assert!(config.contains("username admin\n"));
    assert!(config.contains("password secret\n"));
}

#[tokio::test]
async fn unresponsive_vault_is_bounded_by_collector_deadline() {
    // Given: the vault never answers for this target
    let tools = FakeTools::new();
    let orch = vault_orchestrator(&tools, Duration::from_secs(1));

    // When
    let sink = tokio::time::timeout(Duration::from_secs(5), orch.scrape("10.0.0.9", "default"))
        .await
        .expect("scrape must not wait on the vault forever");

    // Then: the collector ran with the module credentials
    assert_eq!(up(&sink, "chassis"), 1.0);
    assert!(sink.by_name(m::SCRAPE_DURATION_SECONDS).next().is_some());
    let config = captured_config(&tools);
    assert!(config.contains("username admin\n"));
}

// ─── native mode ────────────────────────────────────────────────────

struct ChassisOnlyClient {
    closed: Arc<AtomicUsize>,
}

fn unsupported<'a, T: Send + 'a>(what: &str) -> BoxFuture<'a, Result<T, NativeError>> {
    let err = NativeError::Unsupported(what.to_owned());
    Box::pin(async move { Err(err) })
}

impl IpmiClient for ChassisOnlyClient {
    fn device_id(&mut self) -> BoxFuture<'_, Result<DeviceId, NativeError>> {
        unsupported("device id")
    }
    fn system_firmware_version(&mut self) -> BoxFuture<'_, Result<String, NativeError>> {
        unsupported("system info")
    }
    fn chassis_status(&mut self) -> BoxFuture<'_, Result<ChassisStatus, NativeError>> {
        Box::pin(async {
            Ok(ChassisStatus {
                power_on: true,
                drive_fault: None,
                cooling_fault: None,
            })
        })
    }
    fn power_reading(&mut self) -> BoxFuture<'_, Result<PowerReading, NativeError>> {
        unsupported("DCMI")
    }
    fn sel_info(&mut self) -> BoxFuture<'_, Result<SelInfo, NativeError>> {
        unsupported("SEL")
    }
    fn sel_entries(&mut self) -> BoxFuture<'_, Result<Vec<SelRecord>, NativeError>> {
        unsupported("SEL")
    }
    fn sensors(&mut self) -> BoxFuture<'_, Result<Vec<SensorReading>, NativeError>> {
        unsupported("SDR")
    }
    fn watchdog(&mut self) -> BoxFuture<'_, Result<WatchdogStatus, NativeError>> {
        unsupported("watchdog")
    }
    fn raw_command<'a>(
        &'a mut self,
        _netfn: u8,
        _command: u8,
        _data: &'a [u8],
    ) -> BoxFuture<'a, Result<Vec<u8>, NativeError>> {
        unsupported("raw")
    }
    fn close(&mut self) -> BoxFuture<'_, ()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    }
}

struct FakeConnector {
    closed: Arc<AtomicUsize>,
}

impl IpmiConnector for FakeConnector {
    fn connect<'a>(
        &'a self,
        _target: &'a ScrapeTarget,
    ) -> BoxFuture<'a, Result<Box<dyn IpmiClient>, NativeError>> {
        let client: Box<dyn IpmiClient> = Box::new(ChassisOnlyClient {
            closed: Arc::clone(&self.closed),
        });
        Box::pin(async move { Ok(client) })
    }
}

fn native_store() -> Arc<ConfigStore> {
    let store = Arc::new(ConfigStore::new(Arc::new(CollectorRegistry::new(
        ExecutionMode::Native,
    ))));
    store
        .load_str("modules:\n  default:\n    collectors: [chassis, dcmi]\n")
        .unwrap();
    store
}

#[tokio::test]
async fn native_collectors_use_connector_sessions() {
    // Given: a connector whose client only answers chassis status
    let closed = Arc::new(AtomicUsize::new(0));
    let orch = ScrapeOrchestrator::new(native_store(), "", Duration::from_secs(5))
        .with_connector(Arc::new(FakeConnector {
            closed: Arc::clone(&closed),
        }));

    // When
    let sink = orch.scrape("10.0.0.9", "default").await;

    // Then: chassis up, dcmi down, and every session was closed
    assert_eq!(up(&sink, "chassis"), 1.0);
    assert_eq!(up(&sink, "dcmi"), 0.0);
    assert_eq!(sink.by_name(m::CHASSIS_DRIVE_FAULT_STATE).count(), 0);
    assert_eq!(closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn native_mode_without_connector_reports_down() {
    // Given
    let orch = ScrapeOrchestrator::new(native_store(), "", Duration::from_secs(5));

    // When
    let sink = orch.scrape("10.0.0.9", "default").await;

    // Then
    assert_eq!(up(&sink, "chassis"), 0.0);
    assert_eq!(up(&sink, "dcmi"), 0.0);
}
