//! named pipe를 통한 자격 증명 전달
//!
//! 비밀번호는 자식 프로세스의 argv나 환경변수에 들어가면 안 됩니다. 둘 다
//! 같은 호스트의 다른 사용자가 `/proc`에서 읽을 수 있습니다. 대신 렌더링된
//! 설정을 소유자만 열 수 있는 FIFO에 쓰고, 도구에는 `--config-file`로 그
//! 경로를 넘깁니다. 도구가 읽기용으로 여는 `open(2)`가 곧 만나는 지점이라
//! 별도의 신호가 필요 없습니다.
//!
//! [`CredentialPipe`]는 파일시스템 엔트리와 writer 태스크를 소유합니다.
//! 자식 종료 후, 에러 시, 타임아웃으로 스크레이프 future가 취소될 때 모두
//! drop되면서 writer를 멈추고 FIFO를 삭제합니다.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::unix::pipe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ipmi_exporter_core::error::CredentialError;

const PIPE_PREFIX: &str = "ipmi_exporter-";
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// 렌더링된 도구 설정을 한 번 전달하는 FIFO
#[derive(Debug)]
pub struct CredentialPipe {
    path: PathBuf,
    cancel: CancellationToken,
    writer: JoinHandle<()>,
}

impl CredentialPipe {
    /// 시스템 임시 디렉토리에 FIFO를 만들고 writer를 시작합니다.
    ///
    /// Tokio 런타임 안에서 호출해야 합니다.
    pub fn create(contents: String) -> Result<Self, CredentialError> {
        Self::create_in(&std::env::temp_dir(), contents)
    }

    /// `dir` 아래에 FIFO를 만들고 writer를 시작합니다.
    pub fn create_in(dir: &Path, contents: String) -> Result<Self, CredentialError> {
        let path = dir.join(format!("{PIPE_PREFIX}{}", uuid::Uuid::new_v4().simple()));
        mkfifo(&path).map_err(|e| CredentialError::Create {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let cancel = CancellationToken::new();
        let writer = tokio::spawn(write_when_opened(
            path.clone(),
            contents.into_bytes(),
            cancel.clone(),
        ));

        debug!(path = %path.display(), "credential pipe created");
        Ok(Self {
            path,
            cancel,
            writer,
        })
    }

    /// 도구에 넘길 파일시스템 경로
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CredentialPipe {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.writer.abort();
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "credential pipe removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove credential pipe"
            ),
        }
    }
}

fn mkfifo(path: &Path) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: c_path는 호출 동안 살아 있는 NUL 종료 문자열입니다.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600 as libc::mode_t) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// reader를 기다렸다가 `data`를 한 번 쓰고 닫습니다.
///
/// non-blocking 모드에서 reader 없이 쓰기 쪽을 열면 `ENXIO`로 실패하므로,
/// 도구가 열거나 pipe가 drop될 때까지 open을 재시도합니다.
async fn write_when_opened(path: PathBuf, data: Vec<u8>, cancel: CancellationToken) {
    let mut sender = loop {
        match pipe::OpenOptions::new().open_sender(&path) {
            Ok(sender) => break sender,
            Err(e) if e.raw_os_error() == Some(libc::ENXIO) => {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(OPEN_RETRY_INTERVAL) => {}
                }
            }
            Err(e) => {
                let err = CredentialError::Write {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "credential pipe writer gave up");
                return;
            }
        }
    };

    let written = tokio::select! {
        _ = cancel.cancelled() => return,
        result = sender.write_all(&data) => result,
    };
    if let Err(e) = written {
        let err = CredentialError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        warn!(error = %err, "credential pipe write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    #[tokio::test]
    async fn pipe_is_owner_only_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = CredentialPipe::create_in(dir.path(), "username admin\n".to_owned()).unwrap();

        let meta = std::fs::metadata(pipe.path()).unwrap();
        assert!(meta.file_type().is_fifo());
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        assert!(
            pipe.path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(PIPE_PREFIX)
        );
    }

    #[tokio::test]
    async fn reader_receives_contents() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = CredentialPipe::create_in(dir.path(), "password a\\#b\n".to_owned()).unwrap();
        let path = pipe.path().to_path_buf();

        let contents = tokio::task::spawn_blocking(move || std::fs::read_to_string(path))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contents, "password a\\#b\n");
    }

    #[tokio::test]
    async fn drop_removes_path_even_without_reader() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = CredentialPipe::create_in(dir.path(), "x".to_owned()).unwrap();
        let path = pipe.path().to_path_buf();
        assert!(path.exists());

        drop(pipe);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn paths_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = CredentialPipe::create_in(dir.path(), String::new()).unwrap();
        let b = CredentialPipe::create_in(dir.path(), String::new()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn missing_directory_is_create_error() {
        let err = CredentialPipe::create_in(Path::new("/nonexistent/dir"), String::new())
            .unwrap_err();
        assert!(matches!(err, CredentialError::Create { .. }));
    }
}
