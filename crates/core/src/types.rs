//! 도메인 타입: BMC에서 읽어 온 값의 공통 표현
//!
//! FreeIPMI 출력 파서와 네이티브 프로토콜 클라이언트는 모두 이 타입들을
//! 만들어 냅니다. collector는 실행 방식과 상관없이 같은 타입에서 같은
//! 메트릭 family를 내보내므로, 모드를 바꿔도 메트릭 이름이 유지됩니다.

use std::fmt;

/// 센서 값의 단위
///
/// 단위가 어느 메트릭 family로 갈지 결정합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorUnit {
    /// 팬 회전 수 (RPM)
    Rpm,
    /// 최대 회전 수 대비 백분율로 보고된 팬 속도
    RpmPercent,
    /// 섭씨 온도
    Celsius,
    /// 전류 (A)
    Amperes,
    /// 전압 (V)
    Volts,
    /// 전력 (W)
    Watts,
    /// 그 밖의 단위 (원본 문자열 유지)
    Other(String),
}

impl SensorUnit {
    /// FreeIPMI 단위 문자열을 변환합니다.
    pub fn from_freeipmi(unit: &str) -> Self {
        match unit {
            "RPM" => Self::Rpm,
            "C" => Self::Celsius,
            "A" => Self::Amperes,
            "V" => Self::Volts,
            "W" => Self::Watts,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for SensorUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpm => write!(f, "RPM"),
            Self::RpmPercent => write!(f, "%"),
            Self::Celsius => write!(f, "C"),
            Self::Amperes => write!(f, "A"),
            Self::Volts => write!(f, "V"),
            Self::Watts => write!(f, "W"),
            Self::Other(unit) => write!(f, "{unit}"),
        }
    }
}

/// 센서 한 개의 측정값
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// 센서 ID (record id / sensor number)
    pub id: i64,
    /// 센서 이름
    pub name: String,
    /// 센서 타입 (Fan, Temperature, ...)
    pub sensor_type: String,
    /// 백엔드가 보고한 상태 문자열 (Nominal, Warning, ok, lcr, ...)
    pub state: String,
    /// 값. 읽을 수 없는 센서는 NaN입니다.
    pub value: f64,
    /// 단위
    pub unit: SensorUnit,
    /// 이벤트 설명
    pub event: String,
}

/// BMC 장치 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmcInfo {
    /// BMC 펌웨어 리비전
    pub firmware_revision: String,
    /// 제조사 ID
    pub manufacturer_id: String,
    /// 시스템(BIOS) 펌웨어 버전, 보고하지 않는 BMC도 있습니다.
    pub system_firmware_version: Option<String>,
}

/// chassis 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChassisStatus {
    /// 전원 켜짐 여부
    pub power_on: bool,
    /// 드라이브 장애 여부 (보고된 경우)
    pub drive_fault: Option<bool>,
    /// 냉각/팬 장애 여부 (보고된 경우)
    pub cooling_fault: Option<bool>,
}

/// DCMI 전력 측정값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading {
    /// 전력 측정 활성화 여부
    pub active: bool,
    /// 현재 소비 전력 (W)
    pub current_watts: f64,
}

/// SEL 요약 정보
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelInfo {
    /// 엔트리 수
    pub entries: f64,
    /// 남은 공간 (바이트)
    pub free_space_bytes: f64,
}

/// BMC watchdog timer 상태
#[derive(Debug, Clone, PartialEq)]
pub struct WatchdogStatus {
    /// timer use (BIOS FRB2, OS Load, ...)
    pub timer_use: String,
    /// timer 동작 여부
    pub running: bool,
    /// 로깅 여부
    pub logging: bool,
    /// timeout action (Hard Reset, ...)
    pub timeout_action: String,
    /// pre-timeout interrupt (None, NMI / Diagnostic Interrupt, ...)
    pub pretimeout_interrupt: String,
    /// pre-timeout interval (초)
    pub pretimeout_interval_secs: f64,
    /// initial countdown (초)
    pub initial_countdown_secs: f64,
    /// current countdown (초)
    pub current_countdown_secs: f64,
}
