//! Bounded execution of external processes
//!
//! Every run is limited by a wall-clock timeout. On expiry the child is
//! killed and whatever it wrote so far is kept.

use crate::error::{ToolError, ToolResult};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Return code recorded for a run that hit its timeout
pub const TIMEOUT_CODE: i32 = 137;

/// Return code recorded when the executable does not exist
pub const NOT_FOUND_CODE: i32 = 127;

/// How long to wait for output pipes to drain after the process ended
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Captured result of one process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    /// Command line as run, space separated
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or the negated signal number when killed by a signal
    pub returncode: i32,
    pub timed_out: bool,
    /// The executable could not be found
    pub missing: bool,
    pub duration: Duration,
}

impl ToolRun {
    fn not_found(command: String, error: &io::Error) -> Self {
        Self {
            stderr: format!("{command}: {error}"),
            command,
            stdout: String::new(),
            returncode: NOT_FOUND_CODE,
            timed_out: false,
            missing: true,
            duration: Duration::ZERO,
        }
    }

    /// stdout followed by stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Split a configured command string on whitespace
#[must_use]
pub fn split_command(cli: &str) -> Vec<String> {
    cli.split_whitespace().map(str::to_string).collect()
}

#[cfg(unix)]
fn returncode(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn returncode(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

async fn read_all<R: AsyncRead + Unpin>(mut pipe: R) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

async fn drain(reader: Option<JoinHandle<String>>) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    match timeout(DRAIN_GRACE, reader).await {
        Ok(Ok(text)) => text,
        _ => String::new(),
    }
}

/// Run `argv` with extra environment `env`, killing it after `limit`
pub async fn run_command(
    argv: &[String],
    env: &[(String, String)],
    limit: Duration,
) -> ToolResult<ToolRun> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ToolError::EmptyCommand("process"));
    };
    let command = argv.join(" ");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(%command, "running tool");
    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(%program, "executable not found");
            return Ok(ToolRun::not_found(command, &e));
        }
        Err(source) => {
            return Err(ToolError::Spawn {
                program: program.clone(),
                source,
            })
        }
    };

    // Readers run as tasks so a timeout does not discard partial output.
    let stdout = child.stdout.take().map(|pipe| tokio::spawn(read_all(pipe)));
    let stderr = child.stderr.take().map(|pipe| tokio::spawn(read_all(pipe)));

    let (code, timed_out) = match timeout(limit, child.wait()).await {
        Ok(status) => (returncode(status?), false),
        Err(_) => {
            warn!(%command, ?limit, "tool timed out");
            let _ = child.kill().await;
            (TIMEOUT_CODE, true)
        }
    };

    let run = ToolRun {
        command,
        stdout: drain(stdout).await,
        stderr: drain(stderr).await,
        returncode: code,
        timed_out,
        missing: false,
        duration: start.elapsed(),
    };
    debug!(
        returncode = run.returncode,
        elapsed_ms = run.duration.as_millis() as u64,
        "tool finished"
    );
    Ok(run)
}
