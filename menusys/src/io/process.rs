//! Child process runner for menu scripts.
//!
//! stdout and stderr are drained on their own threads while the child runs,
//! so a chatty script can never block on a full pipe. Only the first
//! `output_limit_bytes` of each stream are kept.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// One captured stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    /// Bytes read past the limit and discarded.
    pub dropped: u64,
}

impl Captured {
    pub fn lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Exited on its own with status 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Run `cmd` with stdin closed and wait for it, killing it after `timeout`
/// when one is given.
#[instrument(skip_all, fields(program = ?cmd.get_program(), timeout_secs = timeout.map(|t| t.as_secs())))]
pub fn run_captured(
    mut cmd: Command,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
) -> Result<ProcessOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|err| {
        error!(err = %err, "failed to spawn process");
        anyhow!(err).context("spawn process")
    })?;
    debug!(pid = child.id(), "process spawned");

    let limit = output_limit_bytes as u64;
    let stdout = capture_in_background(child.stdout.take(), limit, "stdout")?;
    let stderr = capture_in_background(child.stderr.take(), limit, "stderr")?;

    let (status, timed_out) = wait_for(&mut child, timeout)?;

    let stdout = join_capture(stdout).context("collect stdout")?;
    let stderr = join_capture(stderr).context("collect stderr")?;
    if stdout.dropped > 0 || stderr.dropped > 0 {
        warn!(
            stdout_dropped = stdout.dropped,
            stderr_dropped = stderr.dropped,
            "process output over limit"
        );
    }

    debug!(exit_code = ?status.code(), timed_out, "process finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

fn wait_for(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool)> {
    let Some(limit) = timeout else {
        return Ok((child.wait().context("wait for process")?, false));
    };
    if let Some(status) = child.wait_timeout(limit).context("wait for process")? {
        return Ok((status, false));
    }
    warn!(timeout_ms = limit.as_millis() as u64, "process timed out, killing");
    child.kill().context("kill process")?;
    let status = child.wait().context("wait for killed process")?;
    Ok((status, true))
}

fn capture_in_background<R>(
    stream: Option<R>,
    limit: u64,
    name: &'static str,
) -> Result<JoinHandle<io::Result<Captured>>>
where
    R: Read + Send + 'static,
{
    let stream = stream.ok_or_else(|| anyhow!("{name} was not piped"))?;
    thread::Builder::new()
        .name(format!("menusys-{name}"))
        .spawn(move || capture(stream, limit))
        .with_context(|| format!("spawn {name} reader"))
}

fn join_capture(handle: JoinHandle<io::Result<Captured>>) -> Result<Captured> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
        .context("read process output")
}

/// Keep the first `limit` bytes of `reader` and drain the rest.
fn capture<R: Read>(mut reader: R, limit: u64) -> io::Result<Captured> {
    let mut bytes = Vec::new();
    (&mut reader).take(limit).read_to_end(&mut bytes)?;
    let dropped = io::copy(&mut reader, &mut io::sink())?;
    Ok(Captured { bytes, dropped })
}
