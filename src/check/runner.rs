// src/check/runner.rs
use super::{compose_message, CheckError, ExecutionOutcome};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinError;
use tracing::{debug, warn};

/// Budget a single script gets before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-stream capture limit; anything past it is dropped.
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Executes one check script and classifies how it ended.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, path: &Path) -> Result<ExecutionOutcome, CheckError>;
}

/// Runs scripts as direct child processes under a hard timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, path: &Path) -> Result<ExecutionOutcome, CheckError> {
        let start = Instant::now();
        let deadline = tokio::time::Instant::from_std(start) + self.timeout;

        // No shell, no arguments, inherited environment. `kill_on_drop`
        // covers the case where this future is dropped mid-run.
        let mut child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CheckError::Launch {
                path: path.to_path_buf(),
                source,
            })?;

        let mut stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        // Exactly one branch wins. `biased` polls the exit first, so a process
        // that is already done when the deadline fires is never reported as
        // timed out.
        let exited = tokio::select! {
            biased;
            status = child.wait() => Some(status),
            _ = tokio::time::sleep_until(deadline) => None,
        };

        let status = match exited {
            Some(status) => status.map_err(|source| CheckError::Wait {
                path: path.to_path_buf(),
                source,
            })?,
            None => {
                stdout_task.abort();
                stderr_task.abort();
                // `kill` sends SIGKILL and reaps the child before returning.
                child.kill().await.map_err(|source| CheckError::Wait {
                    path: path.to_path_buf(),
                    source,
                })?;
                warn!(script = %path.display(), timeout = ?self.timeout(), "script killed after timeout");
                return Ok(ExecutionOutcome::timed_out(start.elapsed()));
            }
        };

        // Background processes started by the script inherit the pipes and
        // keep them open after the script exits. The deadline still applies.
        let streams = tokio::time::timeout_at(deadline, async {
            ((&mut stdout_task).await, (&mut stderr_task).await)
        })
        .await;

        let (stdout, stderr) = match streams {
            Ok((stdout, stderr)) => (
                joined_output(path, "stdout", stdout),
                joined_output(path, "stderr", stderr),
            ),
            Err(_) => {
                stdout_task.abort();
                stderr_task.abort();
                warn!(
                    script = %path.display(),
                    timeout = ?self.timeout(),
                    "script output still open at timeout, a background process holds it"
                );
                return Ok(ExecutionOutcome::timed_out(start.elapsed()));
            }
        };

        let message = compose_message(
            &String::from_utf8_lossy(&stdout),
            &String::from_utf8_lossy(&stderr),
        );

        debug!(
            script = %path.display(),
            exit_code = ?status.code(),
            elapsed = ?start.elapsed(),
            "script finished"
        );

        Ok(ExecutionOutcome::new(
            status.success(),
            message,
            start.elapsed(),
        ))
    }
}

fn joined_output(path: &Path, stream: &str, joined: Result<Vec<u8>, JoinError>) -> Vec<u8> {
    joined.unwrap_or_else(|err| {
        warn!(script = %path.display(), stream, %err, "output reader failed, output dropped");
        Vec::new()
    })
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(stream) = handle {
        // A read error just truncates the captured output.
        let _ = stream.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::test_helpers::write_script;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn quick_runner() -> ProcessRunner {
        ProcessRunner::new(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_silent_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "ok", "exit 0");

        let outcome = ProcessRunner::default().run(&script).await.expect("run");
        assert!(outcome.success);
        assert_eq!(outcome.message, "");
    }

    #[tokio::test]
    async fn test_nonzero_exit_captures_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "fail", "echo boom >&2\nexit 3");

        let outcome = ProcessRunner::default().run(&script).await.expect("run");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "\"boom\"");
    }

    #[tokio::test]
    async fn test_stdout_precedes_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "both", "echo warn >&2\necho ' fine '");

        let outcome = ProcessRunner::default().run(&script).await.expect("run");
        assert!(outcome.success);
        assert_eq!(outcome.message, "\"fine\\nwarn\"");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pid_file = dir.path().join("pid");
        let script = write_script(
            dir.path(),
            "slow",
            &format!("echo partial\necho $$ > {}\nexec sleep 30", pid_file.display()),
        );

        let outcome = quick_runner().run(&script).await.expect("run");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Timeout");
        assert!(outcome.elapsed >= Duration::from_millis(500));
        assert!(outcome.elapsed < Duration::from_secs(10));

        let pid = fs::read_to_string(&pid_file).expect("pid file");
        let proc_entry = Path::new("/proc").join(pid.trim());
        if Path::new("/proc/self").exists() {
            assert!(!proc_entry.exists(), "script process still alive");
        }
    }

    #[tokio::test]
    async fn test_background_process_cannot_outlive_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "bg", "sleep 5 &\nexit 0");

        let started = Instant::now();
        let outcome = quick_runner().run(&script).await.expect("run");
        assert!(
            started.elapsed() < Duration::from_millis(1500),
            "run took {:?}",
            started.elapsed()
        );
        assert!(!outcome.success);
        assert!(outcome.is_timeout());
    }

    #[tokio::test]
    async fn test_background_process_with_closed_output_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "detached", "sleep 5 >/dev/null 2>&1 &\necho started");

        let outcome = quick_runner().run(&script).await.expect("run");
        assert!(outcome.success);
        assert_eq!(outcome.message, "\"started\"");
    }

    #[tokio::test]
    async fn test_failed_reader_yields_empty_output() {
        let failed: Result<Vec<u8>, JoinError> =
            tokio::spawn(async { panic!("reader crashed") }).await;
        assert!(failed.is_err());
        assert!(joined_output(Path::new("/checks/disk"), "stdout", failed).is_empty());

        let ok = tokio::spawn(async { b"fine".to_vec() }).await;
        assert_eq!(joined_output(Path::new("/checks/disk"), "stdout", ok), b"fine");
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(ProcessRunner::default().timeout(), DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_fast_script_is_not_reported_as_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "fast", "echo done");

        let outcome = quick_runner().run(&script).await.expect("run");
        assert!(outcome.success);
        assert_eq!(outcome.message, "\"done\"");
    }

    #[tokio::test]
    async fn test_missing_script_is_launch_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = ProcessRunner::default().run(&dir.path().join("absent")).await;
        assert!(matches!(result, Err(CheckError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_non_executable_script_is_launch_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "locked", "exit 0");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).expect("chmod");

        let result = ProcessRunner::default().run(&script).await;
        assert!(matches!(result, Err(CheckError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "steady", "echo stable\nexit 1");
        let runner = ProcessRunner::default();

        let first = runner.run(&script).await.expect("first run");
        let second = runner.run(&script).await.expect("second run");
        assert_eq!(first.success, second.success);
        assert_eq!(first.message, second.message);
    }
}
