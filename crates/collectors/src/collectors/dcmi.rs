//! `dcmi` collector: 시스템 소비 전력

use ipmi_exporter_core::metrics::{DCMI_POWER_CONSUMPTION_WATTS, MetricSink};
use ipmi_exporter_core::types::PowerReading;
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_power_reading;

use super::parse_output;
use crate::collector::{DCMI, FreeipmiCollector, NativeCollector, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

/// 측정이 활성화된 경우에만 소비 전력을 기록합니다.
pub fn emit_power(reading: &PowerReading, sink: &mut MetricSink) {
    if reading.active {
        sink.gauge(DCMI_POWER_CONSUMPTION_WATTS, reading.current_watts);
    }
}

/// `ipmi-dcmi --get-system-power-statistics` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiDcmi;

impl FreeipmiCollector for FreeipmiDcmi {
    fn name(&self) -> &'static str {
        DCMI
    }

    fn command(&self) -> &'static str {
        "ipmi-dcmi"
    }

    fn default_args(&self) -> &'static [&'static str] {
        &["--get-system-power-statistics"]
    }

    fn collect(
        &self,
        output: &ToolOutput,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let reading = parse_output(output, parse_power_reading)?;
        emit_power(&reading, sink);
        Ok(())
    }
}

/// DCMI Get Power Reading 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeDcmi;

impl NativeCollector for NativeDcmi {
    fn name(&self) -> &'static str {
        DCMI
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let reading = client.power_reading().await?;
        emit_power(&reading, sink);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{local_target, tool_output};

    #[test]
    fn active_measurement_emits_watts() {
        let output = "\
Current Power                        : 312 Watts
Minimum Power over sampling duration : 280 watts
Power Measurement                    : Active
";
        let mut sink = MetricSink::new();
        FreeipmiDcmi
            .collect(&tool_output(output, 0), &local_target(), &mut sink)
            .unwrap();

        let sample = sink.by_name(DCMI_POWER_CONSUMPTION_WATTS).next().unwrap();
        assert_eq!(sample.value, 312.0);
    }

    #[test]
    fn inactive_measurement_succeeds_without_samples() {
        let output = "Current Power : 0 Watts\nPower Measurement : Not Available\n";
        let mut sink = MetricSink::new();
        FreeipmiDcmi
            .collect(&tool_output(output, 0), &local_target(), &mut sink)
            .unwrap();
        assert!(sink.is_empty());
    }
}
