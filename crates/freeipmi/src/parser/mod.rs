//! FreeIPMI 도구 출력 문법
//!
//! 두 가지 출력 형태를 다룹니다.
//!
//! - **Line/field**: `Key : value` 보고서 (`bmc-info`, `ipmi-chassis`,
//!   `ipmi-dcmi`, `ipmi-sel --info`, `bmc-watchdog --get`, `ipmi-raw`).
//!   필드마다 `value` 캡처 하나를 가진 앵커 패턴이 있고, 처음 일치하는
//!   줄이 채택됩니다.
//! - **표 형식**: `ipmimonitoring`과 `ipmi-sel`의 쉼표 구분 행.
//!   잘못된 행이 하나라도 있으면 전체를 거부합니다.

pub mod fields;
pub mod sel;
pub mod sensors;

use regex::Regex;

use ipmi_exporter_core::error::ParseError;

pub use fields::{
    parse_bmc_info, parse_chassis_status, parse_power_reading, parse_raw_octets, parse_sel_info,
    parse_watchdog_status,
};
pub use sel::{SelEntry, parse_sel_entries};
pub use sensors::parse_sensor_readings;

/// `pattern`에 처음 일치하는 줄의 `value` 캡처를 반환합니다.
///
/// # Errors
///
/// 일치하는 줄이 없으면 [`ParseError::MissingField`]
pub fn find_value<'a>(output: &'a str, pattern: &Regex, field: &str) -> Result<&'a str, ParseError> {
    find_optional(output, pattern).ok_or_else(|| ParseError::MissingField {
        field: field.to_owned(),
    })
}

/// [`find_value`]와 같지만 필드가 없어도 에러가 아닙니다.
pub fn find_optional<'a>(output: &'a str, pattern: &Regex) -> Option<&'a str> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .find_map(|line| pattern.captures(line))
        .and_then(|caps| caps.name("value"))
        .map(|m| m.as_str())
}

/// 도구가 출력하는 형식의 실수를 파싱합니다. `field`는 에러 메시지에 쓰입니다.
pub(crate) fn parse_number(value: &str, field: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            field: field.to_owned(),
            value: value.to_owned(),
        })
}
