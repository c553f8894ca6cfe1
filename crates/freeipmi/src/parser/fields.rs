//! `Key : value` 형식 보고서 파서

use std::sync::LazyLock;

use regex::Regex;

use ipmi_exporter_core::error::ParseError;
use ipmi_exporter_core::types::{BmcInfo, ChassisStatus, PowerReading, SelInfo, WatchdogStatus};

use super::{find_optional, find_value, parse_number};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("field pattern must compile")
}

static FIRMWARE_REVISION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Firmware Revision\s*:\s*(?P<value>[0-9.]*).*"));
static MANUFACTURER_ID: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Manufacturer ID\s*:\s*(?P<value>.*)"));
static SYSTEM_FIRMWARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^System Firmware Version\s*:\s*(?P<value>[0-9.]*).*"));

static SYSTEM_POWER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^System Power\s*:\s(?P<value>.*)"));
static DRIVE_FAULT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^Drive Fault\s*:\s(?P<value>.*)"));
static COOLING_FAULT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Cooling/fan fault\s*:\s(?P<value>.*)"));

static POWER_MEASUREMENT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Power Measurement\s*:\s*(?P<value>Active|Not\sAvailable)"));
static CURRENT_POWER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Current Power\s*:\s*(?P<value>[0-9.]*)\s*Watts"));

static SEL_ENTRIES: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Number of log entries\s*:\s(?P<value>[0-9.]*)"));
static SEL_FREE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Free space remaining\s*:\s(?P<value>[0-9.]*)\s*bytes"));

static WATCHDOG_TIMER_USE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Timer Use:\s*(?P<value>.*?)\s*$"));
static WATCHDOG_TIMER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Timer:\s*(?P<value>Running|Stopped)"));
static WATCHDOG_LOGGING: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Logging:\s*(?P<value>Enabled|Disabled)"));
static WATCHDOG_TIMEOUT_ACTION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Timeout Action:\s*(?P<value>.*?)\s*$"));
static WATCHDOG_PRETIMEOUT_INTERRUPT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Pre-Timeout Interrupt:\s*(?P<value>.*?)\s*$"));
static WATCHDOG_PRETIMEOUT_INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Pre-Timeout Interval:\s*(?P<value>[0-9.]*)\s*seconds"));
static WATCHDOG_INITIAL_COUNTDOWN: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Initial Countdown:\s*(?P<value>[0-9.]*)\s*seconds"));
static WATCHDOG_CURRENT_COUNTDOWN: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Current Countdown:\s*(?P<value>[0-9.]*)\s*seconds"));

static RAW_OCTETS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^\s*(?:rcvd:)?\s*(?P<value>[0-9A-Fa-f]{2}(?:\s+[0-9A-Fa-f]{2})*)\s*$")
});

/// `bmc-info` 출력을 파싱합니다.
pub fn parse_bmc_info(output: &str) -> Result<BmcInfo, ParseError> {
    let firmware_revision = find_value(output, &FIRMWARE_REVISION, "Firmware Revision")?;
    let manufacturer_id = find_value(output, &MANUFACTURER_ID, "Manufacturer ID")?;
    // 오래된 BMC는 BIOS 버전을 아예 보고하지 않음
    let system_firmware_version =
        find_optional(output, &SYSTEM_FIRMWARE_VERSION).map(str::to_owned);

    Ok(BmcInfo {
        firmware_revision: firmware_revision.to_owned(),
        manufacturer_id: manufacturer_id.trim().to_owned(),
        system_firmware_version,
    })
}

/// `ipmi-chassis --get-chassis-status` 출력을 파싱합니다.
pub fn parse_chassis_status(output: &str) -> Result<ChassisStatus, ParseError> {
    let power = find_value(output, &SYSTEM_POWER, "System Power")?;
    let flag = |value: &str| value.trim() == "true";

    Ok(ChassisStatus {
        power_on: power.trim() == "on",
        drive_fault: find_optional(output, &DRIVE_FAULT).map(flag),
        cooling_fault: find_optional(output, &COOLING_FAULT).map(flag),
    })
}

/// `ipmi-dcmi --get-system-power-statistics` 출력을 파싱합니다.
///
/// `Current Power`는 측정이 활성 상태일 때만 필수입니다.
pub fn parse_power_reading(output: &str) -> Result<PowerReading, ParseError> {
    let measurement = find_value(output, &POWER_MEASUREMENT, "Power Measurement")?;
    if measurement != "Active" {
        return Ok(PowerReading {
            active: false,
            current_watts: f64::NAN,
        });
    }

    let current = find_value(output, &CURRENT_POWER, "Current Power")?;
    Ok(PowerReading {
        active: true,
        current_watts: parse_number(current, "Current Power")?,
    })
}

/// `ipmi-sel --info` 출력을 파싱합니다.
pub fn parse_sel_info(output: &str) -> Result<SelInfo, ParseError> {
    let entries = find_value(output, &SEL_ENTRIES, "Number of log entries")?;
    let free = find_value(output, &SEL_FREE_SPACE, "Free space remaining")?;

    Ok(SelInfo {
        entries: parse_number(entries, "Number of log entries")?,
        free_space_bytes: parse_number(free, "Free space remaining")?,
    })
}

/// `bmc-watchdog --get` 출력을 파싱합니다.
pub fn parse_watchdog_status(output: &str) -> Result<WatchdogStatus, ParseError> {
    let seconds = |re: &Regex, field: &str| -> Result<f64, ParseError> {
        parse_number(find_value(output, re, field)?, field)
    };

    Ok(WatchdogStatus {
        timer_use: find_value(output, &WATCHDOG_TIMER_USE, "Timer Use")?.to_owned(),
        running: find_value(output, &WATCHDOG_TIMER, "Timer")? == "Running",
        logging: find_value(output, &WATCHDOG_LOGGING, "Logging")? == "Enabled",
        timeout_action: find_value(output, &WATCHDOG_TIMEOUT_ACTION, "Timeout Action")?
            .to_owned(),
        pretimeout_interrupt: find_value(
            output,
            &WATCHDOG_PRETIMEOUT_INTERRUPT,
            "Pre-Timeout Interrupt",
        )?
        .to_owned(),
        pretimeout_interval_secs: seconds(&WATCHDOG_PRETIMEOUT_INTERVAL, "Pre-Timeout Interval")?,
        initial_countdown_secs: seconds(&WATCHDOG_INITIAL_COUNTDOWN, "Initial Countdown")?,
        current_countdown_secs: seconds(&WATCHDOG_CURRENT_COUNTDOWN, "Current Countdown")?,
    })
}

/// `ipmi-raw` 응답 octet을 파싱합니다.
///
/// `rcvd: 30 00 01`과 접두어 없는 `30 00 01`을 모두 받습니다.
pub fn parse_raw_octets(output: &str) -> Result<Vec<u8>, ParseError> {
    let value = find_value(output, &RAW_OCTETS, "raw response")?;
    value
        .split_whitespace()
        .map(|octet| {
            u8::from_str_radix(octet, 16).map_err(|_| ParseError::InvalidNumber {
                field: "raw response".to_owned(),
                value: octet.to_owned(),
            })
        })
        .collect()
}
