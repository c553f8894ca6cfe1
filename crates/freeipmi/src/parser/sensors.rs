//! `ipmimonitoring` 쉼표 구분 센서 행
//!
//! ```text
//! ID,Name,Type,State,Reading,Units,Event
//! 12,Fan1,Fan,Nominal,4200,RPM,'OK'
//! ```

use ipmi_exporter_core::error::ParseError;
use ipmi_exporter_core::types::{SensorReading, SensorUnit};

const SENSOR_FIELDS: usize = 7;

/// 센서 행 전체를 파싱하고 `exclude`에 있는 id는 버립니다.
///
/// `N/A` 값은 `NaN`이 됩니다(센서는 있지만 지금은 읽을 수 없음). 그 밖에
/// 파싱할 수 없는 id나 값이 있으면 전체를 거부합니다.
pub fn parse_sensor_readings(output: &str, exclude: &[i64]) -> Result<Vec<SensorReading>, ParseError> {
    let mut readings = Vec::new();

    for line in output.lines().map(|l| l.trim_end_matches('\r')) {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != SENSOR_FIELDS {
            return Err(ParseError::MalformedRow {
                row: line.to_owned(),
                reason: format!("expected {SENSOR_FIELDS} fields, got {}", fields.len()),
            });
        }

        let id = fields[0]
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidNumber {
                field: "sensor id".to_owned(),
                value: fields[0].to_owned(),
            })?;
        if exclude.contains(&id) {
            continue;
        }

        let value = match fields[4].trim() {
            "N/A" => f64::NAN,
            raw => raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                field: format!("reading of sensor {id}"),
                value: raw.to_owned(),
            })?,
        };

        readings.push(SensorReading {
            id,
            name: fields[1].to_owned(),
            sensor_type: fields[2].to_owned(),
            state: fields[3].to_owned(),
            value,
            unit: SensorUnit::from_freeipmi(fields[5].trim()),
            event: fields[6].trim_matches('\'').to_owned(),
        });
    }

    Ok(readings)
}
