// src/exec/runner.rs

//! Tokio-backed process runner.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{Invocation, ProcessLauncher};
use super::capture::MergedOutput;
use super::outcome::ProcessOutcome;

/// How long output readers may keep draining after the child is gone.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

enum Ending {
    Exited(i32),
    WaitFailed(std::io::Error),
    TimedOut,
    Cancelled,
}

/// Runs one OS process with merged output, a timeout and external
/// cancellation.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    drain_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Run `argv` in `working_dir`.
    ///
    /// Returns when the process exits, `timeout` elapses or `cancel` fires,
    /// whichever comes first. In the latter two cases the child is killed
    /// (SIGKILL on Unix) and reaped before returning.
    pub async fn run(
        &self,
        argv: &[String],
        working_dir: &Path,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ProcessOutcome {
        let started = Instant::now();

        let Some((program, args)) = argv.split_first() else {
            return ProcessOutcome::launch_failed("empty command line", started.elapsed());
        };

        if cancel.is_cancelled() {
            return ProcessOutcome::cancelled("", started.elapsed());
        }

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout or stop also reaches whatever the
        // program forked (`sh` running `sleep`, `go run` running the binary).
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    program = %program,
                    cwd = %working_dir.display(),
                    error = %e,
                    "failed to spawn process"
                );
                return ProcessOutcome::launch_failed(
                    format!("failed to start '{program}': {e}"),
                    started.elapsed(),
                );
            }
        };

        debug!(program = %program, pid = ?child.id(), "process started");

        let mut output = MergedOutput::new();
        if let Some(stdout) = child.stdout.take() {
            output.attach(stdout, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            output.attach(stderr, "stderr");
        }

        let ending = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => Ending::Exited(status.code().unwrap_or(-1)),
                Err(e) => Ending::WaitFailed(e),
            },
            _ = tokio::time::sleep(timeout) => Ending::TimedOut,
            _ = cancel.cancelled() => Ending::Cancelled,
        };

        if matches!(ending, Ending::TimedOut | Ending::Cancelled | Ending::WaitFailed(_)) {
            kill_process_group(&child);
            // kill() sends SIGKILL and waits for the child to be reaped.
            if let Err(e) = child.kill().await {
                warn!(program = %program, error = %e, "failed to kill child process");
            }
        }

        let text = output.finish(self.drain_grace).await;
        let elapsed = started.elapsed();

        match ending {
            Ending::Exited(code) => {
                debug!(program = %program, exit_code = code, ?elapsed, "process exited");
                ProcessOutcome::completed(text, code, elapsed)
            }
            Ending::WaitFailed(e) => ProcessOutcome::launch_failed(
                format!("failed waiting for '{program}': {e}"),
                elapsed,
            ),
            Ending::TimedOut => {
                info!(program = %program, ?timeout, "process timed out; killed");
                ProcessOutcome::timed_out(text, elapsed)
            }
            Ending::Cancelled => {
                info!(program = %program, "process cancelled; killed");
                ProcessOutcome::cancelled(text, elapsed)
            }
        }
    }
}

/// SIGKILL every process in the child's group. Must run before the child
/// is reaped, while its pid still names the group.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this
    // child by `process_group(0)`.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == -1 {
        let err = std::io::Error::last_os_error();
        debug!(pgid, error = %err, "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

impl ProcessLauncher for ProcessRunner {
    fn launch<'a>(
        &'a self,
        invocation: &'a Invocation,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ProcessOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.run(
                &invocation.argv,
                &invocation.working_dir,
                invocation.timeout,
                &cancel,
            )
            .await
        })
    }
}
