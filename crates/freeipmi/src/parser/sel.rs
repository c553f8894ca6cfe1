//! `ipmi-sel` 쉼표 구분 이벤트 행
//!
//! ```text
//! ID,Date,Time,Name,Type,State,Event
//! 1,Oct-05-2023,12:30:01,PS1 Status,Power Supply,Critical,Power Supply Failure detected
//! ```
//!
//! 날짜는 텍스트로 남겨 둡니다. 일부 BMC가 합성 엔트리에 찍는 sentinel
//! 값을 어떻게 다룰지는 이벤트 aggregator가 정합니다.

use ipmi_exporter_core::error::ParseError;

const SEL_FIELDS: usize = 7;

/// system event log 한 행
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelEntry {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub name: String,
    pub sensor_type: String,
    pub state: String,
    pub event: String,
}

/// SEL 행 전체를 파싱합니다.
pub fn parse_sel_entries(output: &str) -> Result<Vec<SelEntry>, ParseError> {
    let mut entries = Vec::new();

    for line in output.lines().map(|l| l.trim_end_matches('\r')) {
        if line.trim().is_empty() {
            continue;
        }

        // 앞의 구분자 6개만 구조적이고 이벤트 텍스트에는 쉼표가 들어갈 수 있음
        let fields: Vec<&str> = line.splitn(SEL_FIELDS, ',').collect();
        if fields.len() != SEL_FIELDS {
            return Err(ParseError::MalformedRow {
                row: line.to_owned(),
                reason: format!("expected {SEL_FIELDS} fields, got {}", fields.len()),
            });
        }

        let id = fields[0]
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidNumber {
                field: "sel id".to_owned(),
                value: fields[0].to_owned(),
            })?;

        entries.push(SelEntry {
            id,
            date: fields[1].trim().to_owned(),
            time: fields[2].trim().to_owned(),
            name: fields[3].to_owned(),
            sensor_type: fields[4].to_owned(),
            state: fields[5].to_owned(),
            event: fields[6].to_owned(),
        });
    }

    Ok(entries)
}
