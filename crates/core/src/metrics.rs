//! 메트릭 상수, 설명 등록, 스크레이프 단위 샘플 수집
//!
//! 모든 메트릭 이름과 설명을 중앙에서 정의합니다. exporter는 프로세스 전역
//! recorder에 값을 누적하지 않습니다. 스크레이프마다 [`MetricSink`]에 샘플을
//! 모은 뒤 [`MetricSink::render`]가 그 스크레이프 전용 recorder로 텍스트
//! 노출 형식을 만듭니다. 대상 BMC마다 응답이 달라야 하기 때문입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `ipmi_`
//! - 모든 family는 gauge입니다 (스크레이프 시점의 스냅샷).
//! - 실행 방식(FreeIPMI 서브프로세스 / 네이티브 프로토콜)과 무관하게 이름이 같습니다.

use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// collector 이름 레이블 키
pub const LABEL_COLLECTOR: &str = "collector";

/// 센서 ID 레이블 키
pub const LABEL_ID: &str = "id";

/// 이름 레이블 키 (센서 이름, SEL 규칙 이름, watchdog timer use)
pub const LABEL_NAME: &str = "name";

/// 센서 타입 레이블 키
pub const LABEL_TYPE: &str = "type";

/// SEL 상태 레이블 키
pub const LABEL_STATE: &str = "state";

/// BMC 펌웨어 리비전 레이블 키
pub const LABEL_FIRMWARE_REVISION: &str = "firmware_revision";

/// BMC 제조사 ID 레이블 키
pub const LABEL_MANUFACTURER_ID: &str = "manufacturer_id";

/// 시스템 펌웨어 버전 레이블 키
pub const LABEL_SYSTEM_FIRMWARE_VERSION: &str = "system_firmware_version";

/// watchdog timeout action 레이블 키
pub const LABEL_ACTION: &str = "action";

/// watchdog pre-timeout interrupt 레이블 키
pub const LABEL_INTERRUPT: &str = "interrupt";

/// 버전 레이블 키
pub const LABEL_VERSION: &str = "version";

// ─── 스크레이프 메트릭 ─────────────────────────────────────────────

/// collector 성공 여부 (1 = 성공, 0 = 실패, label: collector)
pub const UP: &str = "ipmi_up";

/// 스크레이프 전체 소요 시간 (초)
pub const SCRAPE_DURATION_SECONDS: &str = "ipmi_scrape_duration_seconds";

// ─── 센서 메트릭 (ipmi collector) ──────────────────────────────────

/// 분류되지 않은 센서 값 (label: id, name, type)
pub const SENSOR_VALUE: &str = "ipmi_sensor_value";

/// 분류되지 않은 센서 상태 (label: id, name, type)
pub const SENSOR_STATE: &str = "ipmi_sensor_state";

/// 팬 속도 RPM (label: id, name)
pub const FAN_SPEED_RPM: &str = "ipmi_fan_speed_rpm";

/// 팬 속도 비율 0..1 (label: id, name)
pub const FAN_SPEED_RATIO: &str = "ipmi_fan_speed_ratio";

/// 팬 센서 상태 (label: id, name)
pub const FAN_SPEED_STATE: &str = "ipmi_fan_speed_state";

/// 온도 (label: id, name)
pub const TEMPERATURE_CELSIUS: &str = "ipmi_temperature_celsius";

/// 온도 센서 상태 (label: id, name)
pub const TEMPERATURE_STATE: &str = "ipmi_temperature_state";

/// 전압 (label: id, name)
pub const VOLTAGE_VOLTS: &str = "ipmi_voltage_volts";

/// 전압 센서 상태 (label: id, name)
pub const VOLTAGE_STATE: &str = "ipmi_voltage_state";

/// 전류 (label: id, name)
pub const CURRENT_AMPERES: &str = "ipmi_current_amperes";

/// 전류 센서 상태 (label: id, name)
pub const CURRENT_STATE: &str = "ipmi_current_state";

/// 전력 (label: id, name)
pub const POWER_WATTS: &str = "ipmi_power_watts";

/// 전력 센서 상태 (label: id, name)
pub const POWER_STATE: &str = "ipmi_power_state";

// ─── BMC / watchdog 메트릭 ─────────────────────────────────────────

/// BMC 정보, 값은 항상 1
pub const BMC_INFO: &str = "ipmi_bmc_info";

/// watchdog timer 동작 여부
pub const BMC_WATCHDOG_TIMER_STATE: &str = "ipmi_bmc_watchdog_timer_state";

/// watchdog timer use (label: name)
pub const BMC_WATCHDOG_TIMER_USE_STATE: &str = "ipmi_bmc_watchdog_timer_use_state";

/// watchdog 로깅 여부
pub const BMC_WATCHDOG_LOGGING_STATE: &str = "ipmi_bmc_watchdog_logging_state";

/// watchdog timeout action (label: action)
pub const BMC_WATCHDOG_TIMEOUT_ACTION_STATE: &str = "ipmi_bmc_watchdog_timeout_action_state";

/// watchdog pre-timeout interrupt (label: interrupt)
pub const BMC_WATCHDOG_PRETIMEOUT_INTERRUPT_STATE: &str =
    "ipmi_bmc_watchdog_pretimeout_interrupt_state";

/// watchdog pre-timeout interval (초)
pub const BMC_WATCHDOG_PRETIMEOUT_INTERVAL_SECONDS: &str =
    "ipmi_bmc_watchdog_pretimeout_interval_seconds";

/// watchdog initial countdown (초)
pub const BMC_WATCHDOG_INITIAL_COUNTDOWN_SECONDS: &str =
    "ipmi_bmc_watchdog_initial_countdown_seconds";

/// watchdog current countdown (초)
pub const BMC_WATCHDOG_CURRENT_COUNTDOWN_SECONDS: &str =
    "ipmi_bmc_watchdog_current_countdown_seconds";

// ─── chassis / DCMI / SEL / LAN 메트릭 ─────────────────────────────

/// chassis 전원 상태 (1 = on)
pub const CHASSIS_POWER_STATE: &str = "ipmi_chassis_power_state";

/// chassis 드라이브 장애 (1 = fault)
pub const CHASSIS_DRIVE_FAULT_STATE: &str = "ipmi_chassis_drive_fault_state";

/// chassis 냉각/팬 장애 (1 = fault)
pub const CHASSIS_COOLING_FAULT_STATE: &str = "ipmi_chassis_cooling_fault_state";

/// DCMI 현재 소비 전력 (W)
pub const DCMI_POWER_CONSUMPTION_WATTS: &str = "ipmi_dcmi_power_consumption_watts";

/// SEL 엔트리 수
pub const SEL_LOGS_COUNT: &str = "ipmi_sel_logs_count";

/// SEL 남은 공간 (바이트)
pub const SEL_FREE_SPACE_BYTES: &str = "ipmi_sel_free_space_bytes";

/// 상태별 SEL 이벤트 수 (label: state)
pub const SEL_EVENTS_COUNT_BY_STATE: &str = "ipmi_sel_events_count_by_state";

/// 규칙별 SEL 이벤트 수 (label: name)
pub const SEL_EVENTS_COUNT_BY_NAME: &str = "ipmi_sel_events_count_by_name";

/// 규칙별 최신 SEL 이벤트 시각 (epoch 초, label: name)
pub const SEL_EVENTS_LATEST_TIMESTAMP: &str = "ipmi_sel_events_latest_timestamp";

/// Supermicro LAN 모드 (0 = dedicated, 1 = onboard, 2 = failover)
pub const CONFIG_LAN_MODE: &str = "ipmi_config_lan_mode";

// ─── exporter 자체 메트릭 ──────────────────────────────────────────

/// exporter 빌드 정보 (label: version), 값은 항상 1
pub const EXPORTER_BUILD_INFO: &str = "ipmi_exporter_build_info";

/// 모든 메트릭 이름 목록
pub const ALL_METRIC_NAMES: &[&str] = &[
    UP,
    SCRAPE_DURATION_SECONDS,
    SENSOR_VALUE,
    SENSOR_STATE,
    FAN_SPEED_RPM,
    FAN_SPEED_RATIO,
    FAN_SPEED_STATE,
    TEMPERATURE_CELSIUS,
    TEMPERATURE_STATE,
    VOLTAGE_VOLTS,
    VOLTAGE_STATE,
    CURRENT_AMPERES,
    CURRENT_STATE,
    POWER_WATTS,
    POWER_STATE,
    BMC_INFO,
    BMC_WATCHDOG_TIMER_STATE,
    BMC_WATCHDOG_TIMER_USE_STATE,
    BMC_WATCHDOG_LOGGING_STATE,
    BMC_WATCHDOG_TIMEOUT_ACTION_STATE,
    BMC_WATCHDOG_PRETIMEOUT_INTERRUPT_STATE,
    BMC_WATCHDOG_PRETIMEOUT_INTERVAL_SECONDS,
    BMC_WATCHDOG_INITIAL_COUNTDOWN_SECONDS,
    BMC_WATCHDOG_CURRENT_COUNTDOWN_SECONDS,
    CHASSIS_POWER_STATE,
    CHASSIS_DRIVE_FAULT_STATE,
    CHASSIS_COOLING_FAULT_STATE,
    DCMI_POWER_CONSUMPTION_WATTS,
    SEL_LOGS_COUNT,
    SEL_FREE_SPACE_BYTES,
    SEL_EVENTS_COUNT_BY_STATE,
    SEL_EVENTS_COUNT_BY_NAME,
    SEL_EVENTS_LATEST_TIMESTAMP,
    CONFIG_LAN_MODE,
    EXPORTER_BUILD_INFO,
];

/// 모든 메트릭의 설명(HELP)을 현재 recorder에 등록합니다.
///
/// [`MetricSink::render`]가 스크레이프 전용 recorder 안에서 호출합니다.
/// recorder가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::describe_gauge;

    describe_gauge!(
        UP,
        "'1' if a scrape of the IPMI device was successful, '0' otherwise."
    );
    describe_gauge!(
        SCRAPE_DURATION_SECONDS,
        "Returns how long the scrape took to complete in seconds."
    );

    describe_gauge!(SENSOR_VALUE, "Generic data read from an IPMI sensor of unknown type, relying on labels for context.");
    describe_gauge!(SENSOR_STATE, "Indicates the severity of the state reported by an IPMI sensor (0=nominal, 1=warning, 2=critical).");
    describe_gauge!(FAN_SPEED_RPM, "Fan speed in rotations per minute.");
    describe_gauge!(FAN_SPEED_RATIO, "Fan speed as a proportion of the maximum speed.");
    describe_gauge!(FAN_SPEED_STATE, "Reported state of a fan speed sensor (0=nominal, 1=warning, 2=critical).");
    describe_gauge!(TEMPERATURE_CELSIUS, "Temperature reading in degree Celsius.");
    describe_gauge!(TEMPERATURE_STATE, "Reported state of a temperature sensor (0=nominal, 1=warning, 2=critical).");
    describe_gauge!(VOLTAGE_VOLTS, "Voltage reading in Volts.");
    describe_gauge!(VOLTAGE_STATE, "Reported state of a voltage sensor (0=nominal, 1=warning, 2=critical).");
    describe_gauge!(CURRENT_AMPERES, "Current reading in Amperes.");
    describe_gauge!(CURRENT_STATE, "Reported state of a current sensor (0=nominal, 1=warning, 2=critical).");
    describe_gauge!(POWER_WATTS, "Power reading in Watts.");
    describe_gauge!(POWER_STATE, "Reported state of a power sensor (0=nominal, 1=warning, 2=critical).");

    describe_gauge!(BMC_INFO, "Constant metric with value '1' providing details about the BMC.");
    describe_gauge!(BMC_WATCHDOG_TIMER_STATE, "Watchdog timer running (1: running, 0: stopped).");
    describe_gauge!(BMC_WATCHDOG_TIMER_USE_STATE, "Watchdog timer use (1: active, 0: inactive).");
    describe_gauge!(BMC_WATCHDOG_LOGGING_STATE, "Watchdog log flag (1: Enabled, 0: Disabled / note: reverse of freeipmi).");
    describe_gauge!(BMC_WATCHDOG_TIMEOUT_ACTION_STATE, "Watchdog timeout action (1: active, 0: inactive).");
    describe_gauge!(BMC_WATCHDOG_PRETIMEOUT_INTERRUPT_STATE, "Watchdog pre-timeout interrupt (1: active, 0: inactive).");
    describe_gauge!(BMC_WATCHDOG_PRETIMEOUT_INTERVAL_SECONDS, "Watchdog pre-timeout interval in seconds.");
    describe_gauge!(BMC_WATCHDOG_INITIAL_COUNTDOWN_SECONDS, "Watchdog initial countdown in seconds.");
    describe_gauge!(BMC_WATCHDOG_CURRENT_COUNTDOWN_SECONDS, "Watchdog current countdown in seconds.");

    describe_gauge!(CHASSIS_POWER_STATE, "Current power state (1=on, 0=off).");
    describe_gauge!(CHASSIS_DRIVE_FAULT_STATE, "Current drive fault state (1=false, 0=true).");
    describe_gauge!(CHASSIS_COOLING_FAULT_STATE, "Current Cooling/fan fault state (1=false, 0=true).");
    describe_gauge!(DCMI_POWER_CONSUMPTION_WATTS, "Current power consumption in Watts.");
    describe_gauge!(SEL_LOGS_COUNT, "Current number of log entries in the SEL.");
    describe_gauge!(SEL_FREE_SPACE_BYTES, "Current free space remaining for new SEL entries.");
    describe_gauge!(SEL_EVENTS_COUNT_BY_STATE, "Current number of log entries in the SEL by state.");
    describe_gauge!(SEL_EVENTS_COUNT_BY_NAME, "Current number of custom log entries in the SEL by name.");
    describe_gauge!(SEL_EVENTS_LATEST_TIMESTAMP, "Latest timestamp of custom log entries in the SEL by name.");
    describe_gauge!(CONFIG_LAN_MODE, "Returns configured LAN mode (0=dedicated, 1=shared, 2=failover).");

    describe_gauge!(EXPORTER_BUILD_INFO, "Constant metric with value '1' carrying the exporter version.");
}

// ─── 스크레이프 단위 샘플 ──────────────────────────────────────────

/// gauge 샘플 하나
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// 메트릭 이름 (이 모듈의 상수)
    pub name: &'static str,
    /// 레이블 (순서 유지)
    pub labels: Vec<(&'static str, String)>,
    /// 값 (NaN 허용)
    pub value: f64,
}

impl Sample {
    /// 레이블 값을 조회합니다.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 스크레이프 한 번 동안 수집된 샘플 모음
///
/// collector는 자기 전용 sink에 기록하고, 성공한 경우에만 orchestrator가
/// 스크레이프 sink에 합칩니다. 실패한 collector의 일부 결과는 노출되지 않습니다.
#[derive(Debug, Default, Clone)]
pub struct MetricSink {
    samples: Vec<Sample>,
}

impl MetricSink {
    /// 빈 sink를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레이블 없는 gauge 값을 기록합니다.
    pub fn gauge(&mut self, name: &'static str, value: f64) {
        self.gauge_with(name, Vec::new(), value);
    }

    /// 레이블이 있는 gauge 값을 기록합니다.
    pub fn gauge_with(&mut self, name: &'static str, labels: Vec<(&'static str, String)>, value: f64) {
        self.samples.push(Sample {
            name,
            labels,
            value,
        });
    }

    /// 다른 sink의 샘플을 뒤에 이어 붙입니다.
    pub fn append(&mut self, other: MetricSink) {
        self.samples.extend(other.samples);
    }

    /// 기록된 샘플 전체
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// 이름이 일치하는 샘플들
    pub fn by_name<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Sample> + use<'a, 'n> {
        self.samples.iter().filter(move |s| s.name == name)
    }

    /// 이름과 레이블 하나로 샘플을 찾습니다.
    pub fn find(&self, name: &str, label: (&str, &str)) -> Option<&Sample> {
        self.by_name(name).find(|s| s.label(label.0) == Some(label.1))
    }

    /// 샘플 수
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Prometheus 텍스트 노출 형식으로 렌더링합니다.
    ///
    /// 전역 recorder를 건드리지 않도록 스크레이프 전용 recorder를 만들어
    /// [`metrics::with_local_recorder`] 안에서 값을 기록합니다. 같은 이름과
    /// 레이블의 샘플이 여러 번 기록되면 마지막 값이 남습니다.
    pub fn render(&self) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_all();
            for sample in &self.samples {
                let labels: Vec<Label> = sample
                    .labels
                    .iter()
                    .map(|(key, value)| Label::new(*key, value.clone()))
                    .collect();
                metrics::gauge!(sample.name, labels).set(sample.value);
            }
        });

        handle.render()
    }
}
