//! `bmc` collector: BMC 장치 정보

use tracing::debug;

use ipmi_exporter_core::metrics::{
    BMC_INFO, LABEL_FIRMWARE_REVISION, LABEL_MANUFACTURER_ID, LABEL_SYSTEM_FIRMWARE_VERSION,
    MetricSink,
};
use ipmi_exporter_core::types::BmcInfo;
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_bmc_info;

use super::parse_output;
use crate::collector::{BMC, FreeipmiCollector, NativeCollector, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

/// 시스템 펌웨어 버전을 알 수 없을 때의 레이블 값
const UNKNOWN_VERSION: &str = "N/A";

/// `ipmi_bmc_info`를 기록합니다.
pub fn emit_bmc_info(info: &BmcInfo, sink: &mut MetricSink) {
    let system_firmware_version = info
        .system_firmware_version
        .clone()
        .unwrap_or_else(|| UNKNOWN_VERSION.to_owned());

    sink.gauge_with(
        BMC_INFO,
        vec![
            (LABEL_FIRMWARE_REVISION, info.firmware_revision.clone()),
            (LABEL_MANUFACTURER_ID, info.manufacturer_id.clone()),
            (LABEL_SYSTEM_FIRMWARE_VERSION, system_firmware_version),
        ],
        1.0,
    );
}

/// `bmc-info` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiBmc;

impl FreeipmiCollector for FreeipmiBmc {
    fn name(&self) -> &'static str {
        BMC
    }

    fn command(&self) -> &'static str {
        "bmc-info"
    }

    fn default_args(&self) -> &'static [&'static str] {
        &[]
    }

    fn collect(
        &self,
        output: &ToolOutput,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let info = parse_output(output, parse_bmc_info)?;
        emit_bmc_info(&info, sink);
        Ok(())
    }
}

/// Get Device ID 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeBmc;

impl NativeCollector for NativeBmc {
    fn name(&self) -> &'static str {
        BMC
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let device = client.device_id().await?;
        // System Info Parameters를 지원하지 않는 BMC가 많습니다.
        let system_firmware_version = match client.system_firmware_version().await {
            Ok(version) => Some(version),
            Err(e) => {
                debug!(error = %e, target = %target, "system firmware version unavailable");
                None
            }
        };

        emit_bmc_info(
            &BmcInfo {
                firmware_revision: device.firmware_revision(),
                manufacturer_id: device.manufacturer(),
                system_firmware_version,
            },
            sink,
        );
        Ok(())
    }
}
