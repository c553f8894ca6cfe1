//! `ipmi` collector: 센서 측정값
//!
//! 단위에 따라 메트릭 family가 정해집니다.
//!
//! | 단위 | 값 | 상태 |
//! |------|----|------|
//! | RPM | `ipmi_fan_speed_rpm` | `ipmi_fan_speed_state` |
//! | % (팬) | `ipmi_fan_speed_ratio` | `ipmi_fan_speed_state` |
//! | C | `ipmi_temperature_celsius` | `ipmi_temperature_state` |
//! | A | `ipmi_current_amperes` | `ipmi_current_state` |
//! | V | `ipmi_voltage_volts` | `ipmi_voltage_state` |
//! | W | `ipmi_power_watts` | `ipmi_power_state` |
//! | 그 외 | `ipmi_sensor_value` | `ipmi_sensor_state` |

use tracing::warn;

use ipmi_exporter_core::metrics::{
    CURRENT_AMPERES, CURRENT_STATE, FAN_SPEED_RATIO, FAN_SPEED_RPM, FAN_SPEED_STATE, LABEL_ID,
    LABEL_NAME, LABEL_TYPE, MetricSink, POWER_STATE, POWER_WATTS, SENSOR_STATE, SENSOR_VALUE,
    TEMPERATURE_CELSIUS, TEMPERATURE_STATE, VOLTAGE_STATE, VOLTAGE_VOLTS,
};
use ipmi_exporter_core::types::{SensorReading, SensorUnit};
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_sensor_readings;

use super::parse_output;
use crate::collector::{FreeipmiCollector, IPMI, NativeCollector, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

const COMMAND: &str = "ipmimonitoring";
const DEFAULT_ARGS: &[&str] = &[
    "-Q",
    "--ignore-unrecognized-events",
    "--comma-separated-output",
    "--no-header-output",
    "--sdr-cache-recreate",
    "--output-event-bitmask",
];

/// FreeIPMI 상태 단어의 심각도
fn freeipmi_severity(state: &str) -> f64 {
    match state {
        "Nominal" => 0.0,
        "Warning" => 1.0,
        "Critical" => 2.0,
        "N/A" => f64::NAN,
        other => {
            warn!(state = other, "unknown sensor state");
            f64::NAN
        }
    }
}

/// threshold 약어의 심각도
fn native_severity(state: &str) -> f64 {
    match state {
        "ok" => 0.0,
        "lnc" | "unc" => 1.0,
        "lcr" | "ucr" => 2.0,
        "lnr" | "unr" => 3.0,
        _ => f64::NAN,
    }
}

/// 센서 한 개를 단위에 맞는 family로 기록합니다.
pub fn emit_reading(reading: &SensorReading, severity: f64, sink: &mut MetricSink) {
    let (value_metric, state_metric, value) = match &reading.unit {
        SensorUnit::Rpm => (FAN_SPEED_RPM, FAN_SPEED_STATE, reading.value),
        SensorUnit::RpmPercent => (FAN_SPEED_RATIO, FAN_SPEED_STATE, reading.value * 0.01),
        SensorUnit::Celsius => (TEMPERATURE_CELSIUS, TEMPERATURE_STATE, reading.value),
        SensorUnit::Amperes => (CURRENT_AMPERES, CURRENT_STATE, reading.value),
        SensorUnit::Volts => (VOLTAGE_VOLTS, VOLTAGE_STATE, reading.value),
        SensorUnit::Watts => (POWER_WATTS, POWER_STATE, reading.value),
        SensorUnit::Other(_) => {
            let labels = vec![
                (LABEL_ID, reading.id.to_string()),
                (LABEL_NAME, reading.name.clone()),
                (LABEL_TYPE, reading.sensor_type.clone()),
            ];
            sink.gauge_with(SENSOR_STATE, labels.clone(), severity);
            sink.gauge_with(SENSOR_VALUE, labels, reading.value);
            return;
        }
    };

    let labels = vec![
        (LABEL_ID, reading.id.to_string()),
        (LABEL_NAME, reading.name.clone()),
    ];
    sink.gauge_with(state_metric, labels.clone(), severity);
    sink.gauge_with(value_metric, labels, value);
}

/// `ipmimonitoring` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiSensors;

impl FreeipmiCollector for FreeipmiSensors {
    fn name(&self) -> &'static str {
        IPMI
    }

    fn command(&self) -> &'static str {
        COMMAND
    }

    fn default_args(&self) -> &'static [&'static str] {
        DEFAULT_ARGS
    }

    fn collect(
        &self,
        output: &ToolOutput,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let readings = parse_output(output, |text| {
            parse_sensor_readings(text, &target.config.exclude_sensor_ids)
        })?;
        for reading in &readings {
            emit_reading(reading, freeipmi_severity(&reading.state), sink);
        }
        Ok(())
    }
}

/// SDR 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeSensors;

impl NativeCollector for NativeSensors {
    fn name(&self) -> &'static str {
        IPMI
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let readings = client.sensors().await?;
        let excluded = &target.config.exclude_sensor_ids;
        for reading in readings.iter().filter(|r| !excluded.contains(&r.id)) {
            emit_reading(reading, native_severity(&reading.state), sink);
        }
        Ok(())
    }
}
