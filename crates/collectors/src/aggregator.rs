//! SEL 이벤트 집계
//!
//! 스크레이프마다 SEL 전체를 새로 읽어 다시 계산합니다. 이전 스크레이프의
//! 값은 이어지지 않으므로 SEL이 비워지면 카운트가 줄어들 수 있습니다.
//!
//! 규칙별 집계는 설정된 규칙 순서대로 0으로 초기화된 뒤 채워집니다.
//! 이번 스크레이프에 매칭이 없는 규칙도 0으로 노출됩니다.

use chrono::NaiveDateTime;
use tracing::debug;

use ipmi_exporter_core::metrics::{
    LABEL_NAME, LABEL_STATE, MetricSink, SEL_EVENTS_COUNT_BY_NAME, SEL_EVENTS_COUNT_BY_STATE,
    SEL_EVENTS_LATEST_TIMESTAMP,
};

use crate::config::SelEventRule;

/// `ipmi-sel`이 출력하는 날짜/시각 형식 (`Oct-05-2023 12:30:01`)
const SEL_TIMESTAMP_FORMAT: &str = "%b-%d-%Y %H:%M:%S";

/// 집계 입력이 되는 SEL 엔트리 한 개
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelRecord {
    /// 심각도 상태 (Nominal, Warning, Critical, ...)
    pub state: String,
    /// 이벤트 설명 (규칙 정규식의 매칭 대상)
    pub event: String,
    /// epoch 초. BMC가 해석할 수 없는 값을 준 경우 `None`
    pub timestamp: Option<i64>,
}

/// SEL의 날짜와 시각을 UTC epoch 초로 변환합니다.
///
/// 일부 BMC는 합성 엔트리에 `PostInit` 같은 값을 넣습니다. 이런 값은
/// `None`이 되고, 집계에서 타임스탬프에 기여하지 않습니다.
pub fn parse_sel_timestamp(date: &str, time: &str) -> Option<i64> {
    let text = format!("{} {}", date.trim(), time.trim());
    match NaiveDateTime::parse_from_str(&text, SEL_TIMESTAMP_FORMAT) {
        Ok(parsed) => Some(parsed.and_utc().timestamp()),
        Err(e) => {
            debug!(timestamp = %text, error = %e, "unparseable SEL timestamp");
            None
        }
    }
}

/// 규칙 하나의 집계 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTally {
    /// 규칙 이름
    pub name: String,
    /// 매칭된 엔트리 수
    pub count: u64,
    /// 매칭된 엔트리 중 가장 최근 시각 (epoch 초, 없으면 0)
    pub latest_timestamp: i64,
}

/// 한 스크레이프의 SEL 집계 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelSummary {
    /// 상태별 엔트리 수 (처음 관측된 순서)
    pub by_state: Vec<(String, u64)>,
    /// 규칙별 집계 (설정 순서, 같은 이름은 첫 항목에 합쳐짐)
    pub by_rule: Vec<RuleTally>,
}

impl SelSummary {
    /// 상태별 엔트리 수
    pub fn state_count(&self, state: &str) -> Option<u64> {
        self.by_state
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, count)| *count)
    }

    /// 이름으로 규칙 집계를 찾습니다.
    pub fn rule(&self, name: &str) -> Option<&RuleTally> {
        self.by_rule.iter().find(|t| t.name == name)
    }

    /// 집계 결과를 sink에 기록합니다.
    pub fn emit(&self, sink: &mut MetricSink) {
        for (state, count) in &self.by_state {
            sink.gauge_with(
                SEL_EVENTS_COUNT_BY_STATE,
                vec![(LABEL_STATE, state.clone())],
                *count as f64,
            );
        }
        for tally in &self.by_rule {
            sink.gauge_with(
                SEL_EVENTS_COUNT_BY_NAME,
                vec![(LABEL_NAME, tally.name.clone())],
                tally.count as f64,
            );
            sink.gauge_with(
                SEL_EVENTS_LATEST_TIMESTAMP,
                vec![(LABEL_NAME, tally.name.clone())],
                tally.latest_timestamp as f64,
            );
        }
    }
}

/// 규칙 목록으로 SEL 엔트리를 집계합니다.
#[derive(Debug)]
pub struct EventAggregator<'a> {
    rules: &'a [SelEventRule],
}

impl<'a> EventAggregator<'a> {
    /// 규칙 목록으로 집계기를 생성합니다.
    pub fn new(rules: &'a [SelEventRule]) -> Self {
        Self { rules }
    }

    /// 엔트리 전체를 집계합니다.
    ///
    /// 엔트리 하나가 여러 규칙에 매칭되면 각 규칙에 모두 더해집니다.
    pub fn aggregate<'r>(&self, records: impl IntoIterator<Item = &'r SelRecord>) -> SelSummary {
        let mut by_rule: Vec<RuleTally> = Vec::with_capacity(self.rules.len());
        // 규칙 → by_rule 인덱스
        let mut slots = Vec::with_capacity(self.rules.len());
        for rule in self.rules {
            let slot = match by_rule.iter().position(|t| t.name == rule.name) {
                Some(index) => index,
                None => {
                    by_rule.push(RuleTally {
                        name: rule.name.clone(),
                        count: 0,
                        latest_timestamp: 0,
                    });
                    by_rule.len() - 1
                }
            };
            slots.push(slot);
        }

        let mut by_state: Vec<(String, u64)> = Vec::new();
        for record in records {
            match by_state.iter_mut().find(|(s, _)| *s == record.state) {
                Some((_, count)) => *count += 1,
                None => by_state.push((record.state.clone(), 1)),
            }

            for (rule, slot) in self.rules.iter().zip(&slots) {
                if !rule.regex.is_match(&record.event) {
                    continue;
                }
                let tally = &mut by_rule[*slot];
                tally.count += 1;
                if let Some(ts) = record.timestamp {
                    tally.latest_timestamp = tally.latest_timestamp.max(ts);
                }
            }
        }

        SelSummary { by_state, by_rule }
    }
}
