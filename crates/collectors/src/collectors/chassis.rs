//! `chassis` collector: 전원 및 장애 상태
//!
//! 장애 gauge는 1이 정상, 0이 장애입니다. BMC가 보고하지 않으면 내보내지 않습니다.

use ipmi_exporter_core::metrics::{
    CHASSIS_COOLING_FAULT_STATE, CHASSIS_DRIVE_FAULT_STATE, CHASSIS_POWER_STATE, MetricSink,
};
use ipmi_exporter_core::types::ChassisStatus;
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_chassis_status;

use super::{flag, parse_output};
use crate::collector::{CHASSIS, FreeipmiCollector, NativeCollector, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

/// chassis 상태를 기록합니다.
pub fn emit_chassis(status: &ChassisStatus, sink: &mut MetricSink) {
    sink.gauge(CHASSIS_POWER_STATE, flag(status.power_on));
    if let Some(fault) = status.drive_fault {
        sink.gauge(CHASSIS_DRIVE_FAULT_STATE, flag(!fault));
    }
    if let Some(fault) = status.cooling_fault {
        sink.gauge(CHASSIS_COOLING_FAULT_STATE, flag(!fault));
    }
}

/// `ipmi-chassis --get-chassis-status` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiChassis;

impl FreeipmiCollector for FreeipmiChassis {
    fn name(&self) -> &'static str {
        CHASSIS
    }

    fn command(&self) -> &'static str {
        "ipmi-chassis"
    }

    fn default_args(&self) -> &'static [&'static str] {
        &["--get-chassis-status"]
    }

    fn collect(
        &self,
        output: &ToolOutput,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let status = parse_output(output, parse_chassis_status)?;
        emit_chassis(&status, sink);
        Ok(())
    }
}

/// Get Chassis Status 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeChassis;

impl NativeCollector for NativeChassis {
    fn name(&self) -> &'static str {
        CHASSIS
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let status = client.chassis_status().await?;
        emit_chassis(&status, sink);
        Ok(())
    }
}
