//! `bmc-watchdog` collector: watchdog timer 상태
//!
//! timer use, timeout action, pre-timeout interrupt는 가능한 값마다 샘플을
//! 하나씩 내고, 현재 값만 1입니다.

use ipmi_exporter_core::metrics::{
    BMC_WATCHDOG_CURRENT_COUNTDOWN_SECONDS, BMC_WATCHDOG_INITIAL_COUNTDOWN_SECONDS,
    BMC_WATCHDOG_LOGGING_STATE, BMC_WATCHDOG_PRETIMEOUT_INTERRUPT_STATE,
    BMC_WATCHDOG_PRETIMEOUT_INTERVAL_SECONDS, BMC_WATCHDOG_TIMEOUT_ACTION_STATE,
    BMC_WATCHDOG_TIMER_STATE, BMC_WATCHDOG_TIMER_USE_STATE, LABEL_ACTION, LABEL_INTERRUPT,
    LABEL_NAME, MetricSink,
};
use ipmi_exporter_core::types::WatchdogStatus;
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_watchdog_status;

use super::{flag, parse_output};
use crate::collector::{BMC_WATCHDOG, FreeipmiCollector, NativeCollector, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

const TIMER_USES: &[&str] = &["BIOS FRB2", "BIOS/POST", "OS Load", "SMS/OS", "OEM"];
const TIMEOUT_ACTIONS: &[&str] = &["No action", "Hard Reset", "Power Down", "Power Cycle"];
const PRETIMEOUT_INTERRUPTS: &[&str] = &[
    "None",
    "SMI",
    "NMI / Diagnostic Interrupt",
    "Messaging Interrupt",
];

fn emit_choice(
    sink: &mut MetricSink,
    metric: &'static str,
    label: &'static str,
    choices: &[&str],
    current: &str,
) {
    for choice in choices {
        sink.gauge_with(metric, vec![(label, (*choice).to_owned())], flag(*choice == current));
    }
}

/// watchdog 상태를 기록합니다.
pub fn emit_watchdog(status: &WatchdogStatus, sink: &mut MetricSink) {
    sink.gauge(BMC_WATCHDOG_TIMER_STATE, flag(status.running));
    emit_choice(
        sink,
        BMC_WATCHDOG_TIMER_USE_STATE,
        LABEL_NAME,
        TIMER_USES,
        &status.timer_use,
    );
    sink.gauge(BMC_WATCHDOG_LOGGING_STATE, flag(status.logging));
    emit_choice(
        sink,
        BMC_WATCHDOG_TIMEOUT_ACTION_STATE,
        LABEL_ACTION,
        TIMEOUT_ACTIONS,
        &status.timeout_action,
    );
    emit_choice(
        sink,
        BMC_WATCHDOG_PRETIMEOUT_INTERRUPT_STATE,
        LABEL_INTERRUPT,
        PRETIMEOUT_INTERRUPTS,
        &status.pretimeout_interrupt,
    );
    sink.gauge(
        BMC_WATCHDOG_PRETIMEOUT_INTERVAL_SECONDS,
        status.pretimeout_interval_secs,
    );
    sink.gauge(
        BMC_WATCHDOG_INITIAL_COUNTDOWN_SECONDS,
        status.initial_countdown_secs,
    );
    sink.gauge(
        BMC_WATCHDOG_CURRENT_COUNTDOWN_SECONDS,
        status.current_countdown_secs,
    );
}

/// `bmc-watchdog --get` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiBmcWatchdog;

impl FreeipmiCollector for FreeipmiBmcWatchdog {
    fn name(&self) -> &'static str {
        BMC_WATCHDOG
    }

    fn command(&self) -> &'static str {
        "bmc-watchdog"
    }

    fn default_args(&self) -> &'static [&'static str] {
        &["--get"]
    }

    fn collect(
        &self,
        output: &ToolOutput,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let status = parse_output(output, parse_watchdog_status)?;
        emit_watchdog(&status, sink);
        Ok(())
    }
}

/// Get Watchdog Timer 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeBmcWatchdog;

impl NativeCollector for NativeBmcWatchdog {
    fn name(&self) -> &'static str {
        BMC_WATCHDOG
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let status = client.watchdog().await?;
        emit_watchdog(&status, sink);
        Ok(())
    }
}
