//! 네이티브 IPMI 프로토콜 클라이언트 추상화
//!
//! 외부 도구 대신 IPMI/DCMI 프로토콜 라이브러리로 BMC와 직접 통신할 때
//! 사용하는 경계입니다. 프로토콜 구현 자체는 외부 협력자이며, 이 크레이트는
//! [`IpmiConnector`]로 세션을 열고 [`IpmiClient`]로 명령을 보냅니다.
//!
//! 응답은 FreeIPMI 출력 파서와 같은 도메인 타입
//! ([`ipmi_exporter_core::types`])으로 돌려주어야 합니다. 그래야 두 실행
//! 방식이 같은 메트릭 family를 내보냅니다.
//!
//! 두 trait 모두 `Box<dyn ...>`로 다뤄지므로 [`BoxFuture`]를 반환합니다.

use ipmi_exporter_core::BoxFuture;
use ipmi_exporter_core::types::{
    ChassisStatus, PowerReading, SelInfo, SensorReading, WatchdogStatus,
};

use crate::aggregator::SelRecord;
use crate::collector::ScrapeTarget;
use crate::error::NativeError;

/// Get Device ID 응답 중 exporter가 쓰는 부분
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId {
    /// 펌웨어 major 리비전
    pub firmware_major: u8,
    /// 펌웨어 minor 리비전 (BCD)
    pub firmware_minor: u8,
    /// IANA 제조사 번호
    pub manufacturer_id: u32,
    /// 제조사 이름 (클라이언트가 알고 있는 경우)
    pub manufacturer_name: Option<String>,
}

impl DeviceId {
    /// `bmc-info`와 같은 `major.minor` 형식의 리비전 문자열
    pub fn firmware_revision(&self) -> String {
        format!("{}.{:02x}", self.firmware_major, self.firmware_minor)
    }

    /// `Name (id)` 형식의 제조사 문자열
    pub fn manufacturer(&self) -> String {
        match &self.manufacturer_name {
            Some(name) => format!("{name} ({})", self.manufacturer_id),
            None => self.manufacturer_id.to_string(),
        }
    }
}

/// BMC 세션을 여는 팩토리
///
/// 스크레이프 대상과 모듈 설정(자격 증명, privilege, timeout)을 받아
/// 세션을 엽니다. collector 실행마다 한 번 호출됩니다.
pub trait IpmiConnector: Send + Sync {
    /// 대상 BMC와 세션을 엽니다.
    fn connect<'a>(
        &'a self,
        target: &'a ScrapeTarget,
    ) -> BoxFuture<'a, Result<Box<dyn IpmiClient>, NativeError>>;
}

/// 열린 BMC 세션
pub trait IpmiClient: Send {
    /// Get Device ID
    fn device_id(&mut self) -> BoxFuture<'_, Result<DeviceId, NativeError>>;

    /// System Info Parameters의 시스템 펌웨어 버전
    fn system_firmware_version(&mut self) -> BoxFuture<'_, Result<String, NativeError>>;

    /// Get Chassis Status
    fn chassis_status(&mut self) -> BoxFuture<'_, Result<ChassisStatus, NativeError>>;

    /// DCMI Get Power Reading
    fn power_reading(&mut self) -> BoxFuture<'_, Result<PowerReading, NativeError>>;

    /// Get SEL Info
    fn sel_info(&mut self) -> BoxFuture<'_, Result<SelInfo, NativeError>>;

    /// SEL 전체 엔트리 (상태, 설명, 타임스탬프)
    fn sel_entries(&mut self) -> BoxFuture<'_, Result<Vec<SelRecord>, NativeError>>;

    /// SDR 기반 센서 측정값
    ///
    /// 상태 문자열은 threshold 약어(`ok`, `lnc`, `ucr`, ...)를 사용하고,
    /// 백분율로 보고되는 팬은 [`SensorUnit::RpmPercent`](ipmi_exporter_core::types::SensorUnit::RpmPercent)로 표시합니다.
    fn sensors(&mut self) -> BoxFuture<'_, Result<Vec<SensorReading>, NativeError>>;

    /// Get Watchdog Timer
    fn watchdog(&mut self) -> BoxFuture<'_, Result<WatchdogStatus, NativeError>>;

    /// 원시 명령. completion code를 제외한 응답 데이터를 반환합니다.
    fn raw_command<'a>(
        &'a mut self,
        netfn: u8,
        command: u8,
        data: &'a [u8],
    ) -> BoxFuture<'a, Result<Vec<u8>, NativeError>>;

    /// 세션을 닫습니다. 실패해도 스크레이프 결과에는 영향이 없습니다.
    fn close(&mut self) -> BoxFuture<'_, ()>;
}
