//! Spawning a child with a timeout, cancellation and bounded output capture.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use nvision_spec::CancellationToken;
use tracing::debug;

use crate::error::{ProcessError, ProcessResult};

/// Interval between `try_wait` polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Bytes read from one output stream, capped at the capture limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedStream {
    /// Captured bytes.
    pub bytes: Vec<u8>,
    /// True if the stream produced more than the limit.
    pub truncated: bool,
}

impl CapturedStream {
    /// Captured bytes as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Exit status and captured output of a finished child.
#[derive(Debug)]
pub struct CapturedOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Captured stdout.
    pub stdout: CapturedStream,
    /// Captured stderr.
    pub stderr: CapturedStream,
}

/// Limits applied to one child process.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Wall-clock limit.
    pub timeout: Duration,
    /// Per-stream capture limit in bytes.
    pub max_output_bytes: usize,
}

/// Spawns `cmd` and waits for it.
///
/// stdin is closed and both output streams are piped into reader threads
/// that keep at most `max_output_bytes` each and drain the rest. The child
/// is killed and reaped on timeout or when `cancel` is set.
///
/// The timeout also covers collecting the output. A descendant that keeps
/// the pipes open after the child exits ends the run with
/// [`ProcessError::Timeout`]; its reader threads are left to finish on
/// their own.
pub fn run_command(
    mut cmd: Command,
    limits: RunLimits,
    cancel: &CancellationToken,
) -> ProcessResult<CapturedOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let deadline = Instant::now() + limits.timeout;
    let mut child = cmd.spawn().map_err(ProcessError::SpawnFailed)?;
    let stdout = spawn_reader(child.stdout.take(), limits.max_output_bytes);
    let stderr = spawn_reader(child.stderr.take(), limits.max_output_bytes);

    let status = wait_until(&mut child, deadline, limits.timeout, cancel)?;

    Ok(CapturedOutput {
        status,
        stdout: collect_reader(stdout, deadline, limits.timeout, cancel)?,
        stderr: collect_reader(stderr, deadline, limits.timeout, cancel)?,
    })
}

fn wait_until(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ProcessResult<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if cancel.is_cancelled() {
                    debug!(pid = child.id(), "killing backend process on cancellation");
                    kill_and_reap(child);
                    return Err(ProcessError::Cancelled);
                }
                if Instant::now() >= deadline {
                    debug!(pid = child.id(), ?timeout, "killing backend process on timeout");
                    kill_and_reap(child);
                    return Err(timed_out(timeout));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill_and_reap(child);
                return Err(ProcessError::SpawnFailed(e));
            }
        }
    }
}

fn timed_out(timeout: Duration) -> ProcessError {
    ProcessError::Timeout {
        timeout_ms: timeout.as_millis(),
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
    limit: usize,
) -> Option<Receiver<CapturedStream>> {
    let pipe = pipe?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(capture(pipe, limit));
    });
    Some(rx)
}

/// Reads up to `limit` bytes and discards the remainder so the child never
/// blocks on a full pipe.
fn capture<R: Read>(mut pipe: R, limit: usize) -> CapturedStream {
    let mut bytes = Vec::new();
    let _ = (&mut pipe).take(limit as u64).read_to_end(&mut bytes);
    let extra = std::io::copy(&mut pipe, &mut std::io::sink()).unwrap_or(0);
    CapturedStream {
        bytes,
        truncated: extra > 0,
    }
}

/// Waits for a reader until the pipe closes, the deadline passes or the
/// request is cancelled.
fn collect_reader(
    reader: Option<Receiver<CapturedStream>>,
    deadline: Instant,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ProcessResult<CapturedStream> {
    let Some(reader) = reader else {
        return Ok(CapturedStream::default());
    };
    loop {
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        match reader.recv_timeout(remaining.min(POLL_INTERVAL)) {
            Ok(stream) => return Ok(stream),
            Err(RecvTimeoutError::Disconnected) => return Ok(CapturedStream::default()),
            Err(RecvTimeoutError::Timeout) if remaining.is_zero() => {
                debug!(?timeout, "backend output still open at deadline");
                return Err(timed_out(timeout));
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}
