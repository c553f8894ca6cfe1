//! 에러 타입: 도메인별 에러 정의
//!
//! 스크레이프 한 번은 여러 collector를 거치므로 에러는 "어느 단계에서
//! 실패했는가"를 기준으로 나눕니다. collector 하나의 실패는 해당 collector의
//! `ipmi_up` 값만 0으로 만들고, 스크레이프 전체를 중단시키지 않습니다.

/// 설정 관련 에러
///
/// 모듈 설정(YAML)과 런타임 설정(TOML) 양쪽에서 사용합니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파일 읽기 실패
    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    /// 설정 파싱 실패 (문법 오류, 알 수 없는 키 포함)
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 등록되지 않은 collector 이름
    #[error("module '{module}': unknown collector '{collector}'")]
    UnknownCollector { module: String, collector: String },

    /// SEL 이벤트 규칙의 정규식 컴파일 실패
    #[error("module '{module}': invalid regex in sel event rule '{rule}': {reason}")]
    InvalidRegex {
        module: String,
        rule: String,
        reason: String,
    },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 외부 도구 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// 프로세스를 시작하지 못함 (실행 파일 없음, 권한 부족 등)
    #[error("failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// 프로세스가 실패 상태로 종료했고 출력도 해석할 수 없음
    #[error("'{command}' exited with {status}: {output}")]
    ExitStatus {
        command: String,
        status: String,
        output: String,
    },

    /// collector 제한 시간 초과
    #[error("collector '{collector}' timed out after {timeout_secs}s")]
    Timeout { collector: String, timeout_secs: u64 },

    /// 자격 증명 전달 실패
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// 도구 출력 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 필수 필드가 출력에 없음
    #[error("could not find value for '{field}'")]
    MissingField { field: String },

    /// 숫자로 변환할 수 없는 값
    #[error("invalid number for '{field}': '{value}'")]
    InvalidNumber { field: String, value: String },

    /// 예상하지 못한 값
    #[error("unexpected value for '{field}': '{value}'")]
    UnexpectedValue { field: String, value: String },

    /// CSV 행 형식 오류
    #[error("malformed row '{row}': {reason}")]
    MalformedRow { row: String, reason: String },
}

/// 자격 증명 전달 에러 (named pipe)
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// FIFO 생성 실패
    #[error("failed to create credential pipe {path}: {reason}")]
    Create { path: String, reason: String },

    /// FIFO 쓰기 실패
    #[error("failed to write credential pipe {path}: {reason}")]
    Write { path: String, reason: String },
}
