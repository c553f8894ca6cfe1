//! `sel-events` collector: 규칙별/상태별 SEL 이벤트 집계

use ipmi_exporter_core::metrics::MetricSink;
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::{SelEntry, parse_sel_entries};

use super::parse_output;
use crate::aggregator::{EventAggregator, SelRecord, parse_sel_timestamp};
use crate::collector::{FreeipmiCollector, NativeCollector, SEL_EVENTS, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

const DEFAULT_ARGS: &[&str] = &[
    "-Q",
    "--comma-separated-output",
    "--no-header-output",
    "--sdr-cache-recreate",
    "--output-event-state",
    "--interpret-oem-data",
    "--entity-sensor-names",
];

impl From<SelEntry> for SelRecord {
    fn from(entry: SelEntry) -> Self {
        Self {
            timestamp: parse_sel_timestamp(&entry.date, &entry.time),
            state: entry.state,
            event: entry.event,
        }
    }
}

fn emit_events(records: &[SelRecord], target: &ScrapeTarget, sink: &mut MetricSink) {
    EventAggregator::new(&target.config.sel_events)
        .aggregate(records)
        .emit(sink);
}

/// `ipmi-sel` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiSelEvents;

impl FreeipmiCollector for FreeipmiSelEvents {
    fn name(&self) -> &'static str {
        SEL_EVENTS
    }

    fn command(&self) -> &'static str {
        "ipmi-sel"
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
        let entries = parse_output(output, parse_sel_entries)?;
        let records: Vec<SelRecord> = entries.into_iter().map(SelRecord::from).collect();
        emit_events(&records, target, sink);
        Ok(())
    }
}

/// SEL 엔트리 조회 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeSelEvents;

impl NativeCollector for NativeSelEvents {
    fn name(&self) -> &'static str {
        SEL_EVENTS
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let records = client.sel_entries().await?;
        emit_events(&records, target, sink);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use ipmi_exporter_core::metrics::{
        LABEL_NAME, LABEL_STATE, SEL_EVENTS_COUNT_BY_NAME, SEL_EVENTS_COUNT_BY_STATE,
        SEL_EVENTS_LATEST_TIMESTAMP,
    };

    use super::*;
    use crate::collectors::testing::{FakeClient, target_with, tool_output};
    use crate::config::{ModuleConfig, SelEventRule};

    const OUTPUT: &str = "\
1,Oct-05-2023,12:30:01,PS1 Status,Power Supply,Critical,Power Supply Failure detected
2,PostInit,PostInit,Sys Event,System Event,Nominal,OEM System Boot Event
3,Oct-06-2023,08:00:00,PS1 Status,Power Supply,Critical,Power Supply AC lost, input out of range
";

    fn target() -> ScrapeTarget {
        target_with(ModuleConfig {
            sel_events: vec![
                SelEventRule {
                    name: "psu_failure".to_owned(),
                    regex: Regex::new("^Power Supply").unwrap(),
                },
                SelEventRule {
                    name: "ecc".to_owned(),
                    regex: Regex::new("Correctable ECC").unwrap(),
                },
            ],
            ..ModuleConfig::default()
        })
    }

    #[test]
    fn aggregates_rules_and_states() {
        let mut sink = MetricSink::new();
        FreeipmiSelEvents
            .collect(&tool_output(OUTPUT, 0), &target(), &mut sink)
            .unwrap();

        assert_eq!(
            sink.find(SEL_EVENTS_COUNT_BY_NAME, (LABEL_NAME, "psu_failure"))
                .unwrap()
                .value,
            2.0
        );
        assert_eq!(
            sink.find(SEL_EVENTS_COUNT_BY_NAME, (LABEL_NAME, "ecc"))
                .unwrap()
                .value,
            0.0
        );
        assert_eq!(
            sink.find(SEL_EVENTS_LATEST_TIMESTAMP, (LABEL_NAME, "psu_failure"))
                .unwrap()
                .value,
            1_696_579_200.0
        );
        assert_eq!(
            sink.find(SEL_EVENTS_COUNT_BY_STATE, (LABEL_STATE, "Critical"))
                .unwrap()
                .value,
            2.0
        );
        assert_eq!(
            sink.find(SEL_EVENTS_COUNT_BY_STATE, (LABEL_STATE, "Nominal"))
                .unwrap()
                .value,
            1.0
        );
    }

    #[test]
    fn empty_log_reports_zero_per_rule() {
        let mut sink = MetricSink::new();
        FreeipmiSelEvents
            .collect(&tool_output("", 0), &target(), &mut sink)
            .unwrap();

        assert_eq!(sink.by_name(SEL_EVENTS_COUNT_BY_NAME).count(), 2);
        assert!(sink.by_name(SEL_EVENTS_COUNT_BY_NAME).all(|s| s.value == 0.0));
        assert_eq!(sink.by_name(SEL_EVENTS_COUNT_BY_STATE).count(), 0);
    }

    #[tokio::test]
    async fn native_uses_client_records() {
        let mut client = FakeClient {
            sel_entries: Some(vec![SelRecord {
                state: "Warning".to_owned(),
                event: "Power Supply predictive failure".to_owned(),
                timestamp: Some(10),
            }]),
            ..FakeClient::default()
        };
        let mut sink = MetricSink::new();
        NativeCollector::collect(&NativeSelEvents, &mut client, &target(), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.find(SEL_EVENTS_LATEST_TIMESTAMP, (LABEL_NAME, "psu_failure"))
                .unwrap()
                .value,
            10.0
        );
    }
}
