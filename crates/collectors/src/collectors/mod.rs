//! 내장 collector 구현
//!
//! 파일 하나에 논리 collector 하나가 들어 있습니다. 각 파일은 도메인 타입에서
//! 샘플을 기록하는 emit 함수를 하나 두고, FreeIPMI 구현과 네이티브 구현이
//! 모두 그 함수를 거치게 합니다.

pub mod bmc;
pub mod bmc_watchdog;
pub mod chassis;
pub mod dcmi;
pub mod ipmi;
pub mod sel;
pub mod sel_events;
pub mod sm_lan_mode;

use ipmi_exporter_core::error::ParseError;
use ipmi_exporter_freeipmi::ToolOutput;

use crate::error::CollectorError;

/// 도구 출력을 파싱합니다.
///
/// 도구가 실패 코드로 끝났어도 출력이 파싱되면 성공입니다. 파싱도 실패하면
/// 파싱 에러 대신 도구의 종료 상태와 출력을 담은 실행 에러를 반환합니다.
pub(crate) fn parse_output<T>(
    output: &ToolOutput,
    parse: impl FnOnce(&str) -> Result<T, ParseError>,
) -> Result<T, CollectorError> {
    parse(&output.output).map_err(|e| match output.failure() {
        Some(failure) => failure.into(),
        None => e.into(),
    })
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
pub(crate) mod testing {
    //! collector 테스트용 fixture

    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::sync::Arc;

    use ipmi_exporter_core::BoxFuture;
    use ipmi_exporter_core::types::{
        ChassisStatus, PowerReading, SelInfo, SensorReading, WatchdogStatus,
    };
    use ipmi_exporter_freeipmi::ToolOutput;

    use crate::aggregator::SelRecord;
    use crate::collector::ScrapeTarget;
    use crate::config::ModuleConfig;
    use crate::error::NativeError;
    use crate::native::{DeviceId, IpmiClient};

    /// 종료 코드와 출력으로 ToolOutput을 만듭니다.
    pub fn tool_output(output: &str, code: i32) -> ToolOutput {
        ToolOutput {
            command: "fake-tool".to_owned(),
            output: output.to_owned(),
            // wait status 형식: 종료 코드는 상위 바이트
            status: ExitStatus::from_raw(code << 8),
        }
    }

    pub fn local_target() -> ScrapeTarget {
        ScrapeTarget::new("", Arc::new(ModuleConfig::default()))
    }

    pub fn target_with(config: ModuleConfig) -> ScrapeTarget {
        ScrapeTarget::new("10.0.0.1", Arc::new(config))
    }

    fn unsupported<T>(what: &str) -> Result<T, NativeError> {
        Err(NativeError::Unsupported(what.to_owned()))
    }

    /// 미리 정해 둔 응답을 돌려주는 클라이언트. 비어 있는 항목은 Unsupported입니다.
    #[derive(Default)]
    pub struct FakeClient {
        pub device_id: Option<DeviceId>,
        pub system_firmware_version: Option<String>,
        pub chassis: Option<ChassisStatus>,
        pub power: Option<PowerReading>,
        pub sel_info: Option<SelInfo>,
        pub sel_entries: Option<Vec<SelRecord>>,
        pub sensors: Option<Vec<SensorReading>>,
        pub watchdog: Option<WatchdogStatus>,
        pub raw: Option<Vec<u8>>,
        pub raw_requests: Vec<(u8, u8, Vec<u8>)>,
    }

    impl IpmiClient for FakeClient {
        fn device_id(&mut self) -> BoxFuture<'_, Result<DeviceId, NativeError>> {
            let r = self.device_id.clone().map_or_else(|| unsupported("device id"), Ok);
            Box::pin(async move { r })
        }

        fn system_firmware_version(&mut self) -> BoxFuture<'_, Result<String, NativeError>> {
            let r = self
                .system_firmware_version
                .clone()
                .map_or_else(|| unsupported("system info"), Ok);
            Box::pin(async move { r })
        }

        fn chassis_status(&mut self) -> BoxFuture<'_, Result<ChassisStatus, NativeError>> {
            let r = self.chassis.map_or_else(|| unsupported("chassis"), Ok);
            Box::pin(async move { r })
        }

        fn power_reading(&mut self) -> BoxFuture<'_, Result<PowerReading, NativeError>> {
            let r = self.power.map_or_else(|| unsupported("dcmi"), Ok);
            Box::pin(async move { r })
        }

        fn sel_info(&mut self) -> BoxFuture<'_, Result<SelInfo, NativeError>> {
            let r = self.sel_info.map_or_else(|| unsupported("sel info"), Ok);
            Box::pin(async move { r })
        }

        fn sel_entries(&mut self) -> BoxFuture<'_, Result<Vec<SelRecord>, NativeError>> {
            let r = self.sel_entries.clone().map_or_else(|| unsupported("sel"), Ok);
            Box::pin(async move { r })
        }

        fn sensors(&mut self) -> BoxFuture<'_, Result<Vec<SensorReading>, NativeError>> {
            let r = self.sensors.clone().map_or_else(|| unsupported("sdr"), Ok);
            Box::pin(async move { r })
        }

        fn watchdog(&mut self) -> BoxFuture<'_, Result<WatchdogStatus, NativeError>> {
            let r = self.watchdog.clone().map_or_else(|| unsupported("watchdog"), Ok);
            Box::pin(async move { r })
        }

        fn raw_command<'a>(
            &'a mut self,
            netfn: u8,
            command: u8,
            data: &'a [u8],
        ) -> BoxFuture<'a, Result<Vec<u8>, NativeError>> {
            self.raw_requests.push((netfn, command, data.to_vec()));
            let r = self.raw.clone().map_or_else(|| unsupported("raw"), Ok);
            Box::pin(async move { r })
        }

        fn close(&mut self) -> BoxFuture<'_, ()> {
            Box::pin(async {})
        }
    }
}
