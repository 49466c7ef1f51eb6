//! # Shell command action.
//!
//! [`ShellCommand`] runs an opaque command string through a POSIX shell
//! (`/bin/sh -c <command>` by default). The command line is never parsed by
//! the runtime.
//!
//! ## Rules
//! - stdin is closed and stdout is discarded.
//! - The action ends when the shell exits. Background processes it leaves
//!   behind (daemons) do not hold the result back.
//! - stderr is drained by a side task into a bounded buffer; on failure its
//!   tail ends up in [`ActionError::Exited`].
//! - Cancellation kills the child process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;
use crate::services::action::Action;

/// Upper bound on captured stderr kept in errors.
const STDERR_TAIL_BYTES: usize = 4096;

/// How long a failed command's stderr may keep draining after the shell exits.
const STDERR_DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Action running a command line through a shell.
///
/// # Example
/// ```no_run
/// use bootvisor::ShellCommand;
///
/// let start = ShellCommand::new("pg_ctl start -D /var/lib/pg")
///     .with_env("PGPORT", "5433")
///     .with_current_dir("/var/lib/pg");
/// assert_eq!(start.command(), "pg_ctl start -D /var/lib/pg");
/// ```
#[derive(Debug, Clone)]
pub struct ShellCommand {
    command: String,
    shell: PathBuf,
    current_dir: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
}

impl ShellCommand {
    /// Creates a command run by `/bin/sh -c`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: PathBuf::from("/bin/sh"),
            current_dir: None,
            env: Vec::new(),
        }
    }

    /// Uses another shell binary (it must accept `-c <command>`).
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Runs the command from `dir`.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Adds an environment variable for the child.
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Returns the command line.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

#[async_trait]
impl Action for ShellCommand {
    fn describe(&self) -> &str {
        &self.command
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError> {
        if ctx.is_cancelled() {
            return Err(ActionError::Canceled);
        }
        let mut child = self.build().spawn().map_err(|e| ActionError::Spawn {
            error: format!("{}: {e}", self.shell.display()),
        })?;

        // A daemon started with `&` inherits the pipe, so EOF may never come.
        let captured = Arc::new(Mutex::new(Vec::new()));
        let mut drain = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain_stderr(pipe, Arc::clone(&captured))));

        let status = tokio::select! {
            res = child.wait() => res.map_err(|e| ActionError::failed(e.to_string()))?,
            _ = ctx.cancelled() => {
                let _ = child.kill().await;
                return Err(ActionError::Canceled);
            }
        };

        if status.success() {
            return Ok(());
        }
        if let Some(handle) = drain.as_mut() {
            let _ = time::timeout(STDERR_DRAIN_GRACE, handle).await;
        }
        let raw = captured.lock().map(|buf| buf.clone()).unwrap_or_default();
        Err(ActionError::Exited {
            status: status.to_string(),
            stderr: stderr_tail(&raw),
        })
    }
}

/// Reads `pipe` to EOF, keeping only a bounded tail in `into`.
async fn drain_stderr<R: AsyncRead + Unpin>(mut pipe: R, into: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 1024];
    loop {
        let n = match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Ok(mut buf) = into.lock() else { return };
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > STDERR_TAIL_BYTES * 2 {
            let excess = buf.len() - STDERR_TAIL_BYTES;
            buf.drain(..excess);
        }
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    let mut start = raw.len().saturating_sub(STDERR_TAIL_BYTES);
    // Skip UTF-8 continuation bytes so the cut lands on a char boundary.
    while start < raw.len() && raw[start] & 0xC0 == 0x80 {
        start += 1;
    }
    String::from_utf8_lossy(&raw[start..]).trim().to_string()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_exit() {
        let cmd = ShellCommand::new("true");
        assert_eq!(cmd.run(CancellationToken::new()).await, Ok(()));
    }

    #[tokio::test]
    async fn failure_captures_status_and_stderr() {
        let cmd = ShellCommand::new("echo boom >&2; exit 3");
        match cmd.run(CancellationToken::new()).await {
            Err(ActionError::Exited { status, stderr }) => {
                assert!(status.contains('3'), "status={status}");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn env_is_passed_to_child() {
        let cmd = ShellCommand::new("test \"$BOOT_MARK\" = ok").with_env("BOOT_MARK", "ok");
        assert_eq!(cmd.run(CancellationToken::new()).await, Ok(()));
    }

    #[tokio::test]
    async fn missing_shell_is_spawn_error() {
        let cmd = ShellCommand::new("true").with_shell("/nonexistent/shell");
        let err = cmd.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.as_label(), "action_spawn");
    }

    #[tokio::test]
    async fn cancellation_kills_child() {
        let cmd = ShellCommand::new("sleep 30");
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let res = tokio::time::timeout(Duration::from_secs(5), cmd.run(token))
            .await
            .expect("cancel should end the action");
        assert_eq!(res, Err(ActionError::Canceled));
    }

    #[tokio::test]
    async fn background_daemon_does_not_hold_result() {
        let cmd = ShellCommand::new("sleep 5 & exit 0");
        let res = tokio::time::timeout(Duration::from_secs(2), cmd.run(CancellationToken::new()))
            .await
            .expect("shell exit should end the action");
        assert_eq!(res, Ok(()));
    }

    #[tokio::test]
    async fn failure_with_daemon_still_reports_stderr() {
        let cmd = ShellCommand::new("sleep 5 & echo bad >&2; exit 1");
        let res = tokio::time::timeout(Duration::from_secs(2), cmd.run(CancellationToken::new()))
            .await
            .expect("shell exit should end the action");
        match res {
            Err(ActionError::Exited { stderr, .. }) => assert_eq!(stderr, "bad"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn stderr_tail_is_bounded() {
        let raw = vec![b'x'; STDERR_TAIL_BYTES * 2];
        assert_eq!(stderr_tail(&raw).len(), STDERR_TAIL_BYTES);
    }

    #[test]
    fn stderr_tail_keeps_whole_chars() {
        // 3-byte chars: the raw byte cut falls inside one.
        let raw = "€".repeat(2000).into_bytes();
        let tail = stderr_tail(&raw);
        assert!(!tail.contains(char::REPLACEMENT_CHARACTER));
        assert!(tail.chars().all(|c| c == '€'));
        assert_eq!(tail.chars().count(), STDERR_TAIL_BYTES / 3);
    }
}
