//! `sm-lan-mode` collector: Supermicro BMC LAN 모드
//!
//! OEM raw 명령 `0x30 0x70 0x0c 0`의 응답 데이터 첫 바이트가 모드입니다
//! (0 = dedicated, 1 = onboard, 2 = failover). `ipmi-raw` 출력에는 명령
//! 바이트와 completion code가 앞에 붙으므로 세 번째 octet을 읽습니다.

use ipmi_exporter_core::error::ParseError;
use ipmi_exporter_core::metrics::{CONFIG_LAN_MODE, MetricSink};
use ipmi_exporter_freeipmi::ToolOutput;
use ipmi_exporter_freeipmi::parser::parse_raw_octets;

use super::parse_output;
use crate::collector::{FreeipmiCollector, NativeCollector, SM_LAN_MODE, ScrapeTarget};
use crate::error::CollectorError;
use crate::native::IpmiClient;

const OEM_NETFN: u8 = 0x30;
const OEM_COMMAND: u8 = 0x70;
const GET_LAN_MODE: &[u8] = &[0x0c, 0x00];

fn lan_mode(value: u8) -> Result<f64, ParseError> {
    match value {
        0..=2 => Ok(f64::from(value)),
        other => Err(ParseError::UnexpectedValue {
            field: "lan mode".to_owned(),
            value: other.to_string(),
        }),
    }
}

fn mode_from_octets(octets: &[u8]) -> Result<f64, ParseError> {
    match octets {
        [_, _, mode] => lan_mode(*mode),
        _ => Err(ParseError::UnexpectedValue {
            field: "lan mode response".to_owned(),
            value: format!("{octets:02x?}"),
        }),
    }
}

/// `ipmi-raw` 기반 구현
#[derive(Debug, Default)]
pub struct FreeipmiSmLanMode;

impl FreeipmiCollector for FreeipmiSmLanMode {
    fn name(&self) -> &'static str {
        SM_LAN_MODE
    }

    fn command(&self) -> &'static str {
        "ipmi-raw"
    }

    fn default_args(&self) -> &'static [&'static str] {
        &["0x0", "0x30", "0x70", "0x0c", "0"]
    }

    fn collect(
        &self,
        output: &ToolOutput,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let mode = parse_output(output, |text| mode_from_octets(&parse_raw_octets(text)?))?;
        sink.gauge(CONFIG_LAN_MODE, mode);
        Ok(())
    }
}

/// raw 명령 기반 네이티브 구현
#[derive(Debug, Default)]
pub struct NativeSmLanMode;

impl NativeCollector for NativeSmLanMode {
    fn name(&self) -> &'static str {
        SM_LAN_MODE
    }

    async fn collect(
        &self,
        client: &mut dyn IpmiClient,
        _target: &ScrapeTarget,
        sink: &mut MetricSink,
    ) -> Result<(), CollectorError> {
        let data = client
            .raw_command(OEM_NETFN, OEM_COMMAND, GET_LAN_MODE)
            .await?;
        let mode = match data.first() {
            Some(value) => lan_mode(*value)?,
            None => {
                return Err(ParseError::MissingField {
                    field: "lan mode".to_owned(),
                }
                .into());
            }
        };
        sink.gauge(CONFIG_LAN_MODE, mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{FakeClient, local_target, tool_output};

    fn collect(output: &str) -> Result<MetricSink, CollectorError> {
        let mut sink = MetricSink::new();
        FreeipmiSmLanMode.collect(&tool_output(output, 0), &local_target(), &mut sink)?;
        Ok(sink)
    }

    #[test]
    fn third_octet_is_the_mode() {
        let sink = collect("rcvd: 70 00 01\n").unwrap();
        assert_eq!(sink.by_name(CONFIG_LAN_MODE).next().unwrap().value, 1.0);
    }

    #[test]
    fn out_of_range_mode_is_rejected() {
        let err = collect("rcvd: 70 00 07\n").unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Parse(ParseError::UnexpectedValue { ref value, .. }) if value == "7"
        ));
    }

    #[test]
    fn wrong_octet_count_is_rejected() {
        assert!(collect("rcvd: 70 00\n").is_err());
        assert!(collect("rcvd: 70 00 01 02\n").is_err());
    }

    #[tokio::test]
    async fn native_sends_oem_request() {
        let mut client = FakeClient {
            raw: Some(vec![0x02]),
            ..FakeClient::default()
        };
        let mut sink = MetricSink::new();
        NativeCollector::collect(&NativeSmLanMode, &mut client, &local_target(), &mut sink)
            .await
            .unwrap();

        assert_eq!(client.raw_requests, vec![(0x30, 0x70, vec![0x0c, 0x00])]);
        assert_eq!(sink.by_name(CONFIG_LAN_MODE).next().unwrap().value, 2.0);
    }
}
