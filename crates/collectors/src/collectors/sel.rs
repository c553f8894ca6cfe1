//! `sel` collector: SEL 엔트리 수와 남은 공간

use ipmi_exporter_core::metrics::{MetricSink, SEL_FREE_SPACE_BYTES, SEL_LOGS_COUNT};
use ipmi_exporter_core::types::SelInfo;
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_sel_info;

use super::parse_output;
use crate::collector::{FreeipmiCollector, NativeCollector, SEL, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

pub fn emit_sel_info(info: &SelInfo, sink: &mut MetricSink) {
    sink.gauge(SEL_LOGS_COUNT, info.entries);
    sink.gauge(SEL_FREE_SPACE_BYTES, info.free_space_bytes);
}

/// `ipmi-sel --info` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiSel;

impl FreeipmiCollector for FreeipmiSel {
    fn name(&self) -> &'static str {
        SEL
    }

    fn command(&self) -> &'static str {
        "ipmi-sel"
    }

    fn default_args(&self) -> &'static [&'static str] {
        &["--info"]
    }

    fn collect(
        &self,
        output: &ToolOutput,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let info = parse_output(output, parse_sel_info)?;
        emit_sel_info(&info, sink);
        Ok(())
    }
}

/// Get SEL Info 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeSel;

impl NativeCollector for NativeSel {
    fn name(&self) -> &'static str {
        SEL
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let info = client.sel_info().await?;
        emit_sel_info(&info, sink);
        Ok(())
    }
}
