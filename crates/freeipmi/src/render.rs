//! FreeIPMI `--config-file` 렌더링
//!
//! 도구는 한 줄에 `key value` 하나인 형식을 읽고 `#`부터는 주석으로 봅니다.
//! `#`가 들어간 비밀번호는 이스케이프하지 않으면 잘립니다.

use std::borrow::Cow;
use std::fmt::Write as _;

/// 자격 증명 pipe로 도구에 넘기는 세션 파라미터
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendConfig<'a> {
    pub driver: &'a str,
    pub privilege: &'a str,
    pub user: &'a str,
    pub password: &'a str,
    /// 세션 timeout (밀리초), 0이면 도구 기본값
    pub session_timeout_ms: u32,
    pub workaround_flags: &'a [String],
}

impl BackendConfig<'_> {
    /// 설정 파일 텍스트를 만듭니다. 값이 없는 필드는 생략합니다.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // String에 쓰기는 실패하지 않음
        if !self.driver.is_empty() {
            let _ = writeln!(out, "driver-type {}", self.driver);
        }
        if !self.privilege.is_empty() {
            let _ = writeln!(out, "privilege-level {}", self.privilege);
        }
        if !self.user.is_empty() {
            let _ = writeln!(out, "username {}", self.user);
        }
        if !self.password.is_empty() {
            let _ = writeln!(out, "password {}", escape_password(self.password));
        }
        if self.session_timeout_ms != 0 {
            let _ = writeln!(out, "session-timeout {}", self.session_timeout_ms);
        }
        if !self.workaround_flags.is_empty() {
            out.push_str("workaround-flags");
            for flag in self.workaround_flags {
                out.push(' ');
                out.push_str(flag);
            }
            out.push('\n');
        }
        out
    }
}

/// `#`가 주석 표시로 읽히지 않도록 백슬래시로 이스케이프합니다.
pub fn escape_password(password: &str) -> Cow<'_, str> {
    if password.contains('#') {
        Cow::Owned(password.replace('#', "\\#"))
    } else {
        Cow::Borrowed(password)
    }
}
