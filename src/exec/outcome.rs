// src/exec/outcome.rs

use std::time::Duration;

/// Why a process invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The process exited on its own; `exit_code` is set.
    Completed,
    /// The timeout elapsed and the process was killed.
    TimedOut,
    /// Cancellation was requested and the process was killed.
    Cancelled,
    /// The process could not be started at all.
    LaunchFailed,
}

/// Normalised result of one OS process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Merged stdout + stderr (lossy UTF-8). For `LaunchFailed` this is the
    /// OS error message.
    pub output: String,
    /// Present only when `reason == Completed`.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub reason: TerminationReason,
}

impl ProcessOutcome {
    pub fn completed(output: impl Into<String>, exit_code: i32, elapsed: Duration) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(exit_code),
            elapsed,
            reason: TerminationReason::Completed,
        }
    }

    pub fn timed_out(output: impl Into<String>, elapsed: Duration) -> Self {
        Self::interrupted(output, elapsed, TerminationReason::TimedOut)
    }

    pub fn cancelled(output: impl Into<String>, elapsed: Duration) -> Self {
        Self::interrupted(output, elapsed, TerminationReason::Cancelled)
    }

    pub fn launch_failed(message: impl Into<String>, elapsed: Duration) -> Self {
        Self::interrupted(message, elapsed, TerminationReason::LaunchFailed)
    }

    fn interrupted(output: impl Into<String>, elapsed: Duration, reason: TerminationReason) -> Self {
        Self {
            output: output.into(),
            exit_code: None,
            elapsed,
            reason,
        }
    }

    /// Completed with exit code 0.
    pub fn is_success(&self) -> bool {
        self.reason == TerminationReason::Completed && self.exit_code == Some(0)
    }
}
