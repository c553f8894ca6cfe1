//! collector 하나를 위한 FreeIPMI 도구 실행

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::debug;

use ipmi_exporter_core::error::ExecutionError;

use crate::fifo::CredentialPipe;

/// 도구 한 번 실행의 합쳐진 출력
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// 에러 문맥용으로 해석된 명령
    pub command: String,
    /// stdout 뒤에 stderr (lossy 디코딩)
    pub output: String,
    pub status: ExitStatus,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// 출력을 파싱할 수 없을 때 보고할 실패
    ///
    /// 0이 아닌 코드로 끝나고 쓸 만한 출력이 없으면 출력을 담은 실행
    /// 실패입니다. 성공했는데 파싱이 안 되는 경우는 호출자의 파싱 에러로
    /// 남깁니다.
    pub fn failure(&self) -> Option<ExecutionError> {
        (!self.success()).then(|| ExecutionError::ExitStatus {
            command: self.command.clone(),
            status: self.status.to_string(),
            output: self.output.trim().to_owned(),
        })
    }
}

/// 호스트 하나에 대한 도구 실행 한 번
#[derive(Debug)]
pub struct Invocation<'a> {
    pub command: &'a Path,
    pub args: &'a [String],
    /// 로컬 BMC면 빈 문자열 (in-band, `-h` 없음)
    pub host: &'a str,
    /// 렌더링된 `--config-file` 내용
    pub backend_config: String,
}

/// 상대 경로 도구 이름을 설정된 도구 디렉토리에 붙입니다.
///
/// 절대 경로 명령이거나 디렉토리가 비어 있으면 그대로 두어 `PATH`에서
/// 찾게 합니다.
pub fn resolve_command(tool_dir: &str, command: &str) -> PathBuf {
    let command = Path::new(command);
    if tool_dir.is_empty() || command.is_absolute() {
        command.to_path_buf()
    } else {
        Path::new(tool_dir).join(command)
    }
}

/// 도구를 실행하고 출력을 수집합니다.
///
/// 인자 순서는 `<args...> --config-file <fifo> [-h <host>]`입니다. custom
/// args로 앞에 wrapper를 두어도(예: 명령은 `sudo`, 첫 인자가 실제 도구)
/// 세션 옵션은 감싼 도구 이름 뒤에 붙습니다.
///
/// 0이 아닌 종료 코드는 여기서 에러가 아닙니다. collector는 도구가 출력한
/// 내용을 그래도 파싱해 봅니다. 자격 증명 pipe는 이 future가 끝나거나
/// drop될 때 삭제됩니다.
///
/// # Errors
///
/// pipe를 만들 수 없으면 [`ExecutionError::Credential`], 프로세스를 시작할
/// 수 없으면 [`ExecutionError::Spawn`]
pub async fn execute(invocation: Invocation<'_>) -> Result<ToolOutput, ExecutionError> {
    let command = invocation.command.display().to_string();
    let pipe = CredentialPipe::create(invocation.backend_config)?;

    let mut cmd = Command::new(invocation.command);
    cmd.args(invocation.args)
        .arg("--config-file")
        .arg(pipe.path());
    if !invocation.host.is_empty() {
        cmd.arg("-h").arg(invocation.host);
    }
    cmd.stdin(Stdio::null()).kill_on_drop(true);

    debug!(command = %command, args = ?invocation.args, "executing tool");
    let output = cmd.output().await.map_err(|e| ExecutionError::Spawn {
        command: command.clone(),
        reason: e.to_string(),
    })?;
    drop(pipe);

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(ToolOutput {
        command,
        output: text,
        status: output.status,
    })
}
