// src/engine/result.rs

//! Caller-visible execution results and the mapping from process outcomes.
//!
//! Every constructor goes through [`ExecutionResult::build`], which derives
//! `success` from `exit_code` and `error`, so the two can never disagree.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::exec::{ProcessOutcome, TerminationReason};

/// Terminal state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every step exited with code 0.
    Completed,
    /// The run step exited with a non-zero code.
    RuntimeFailed,
    CompileFailed,
    TimedOut,
    Cancelled,
    /// A process could not be started, or the source could not be written.
    LaunchFailed,
    Unsupported,
    /// Refused because the key already had a live run.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub key: String,
    pub language: String,
    pub status: ExecutionStatus,
    /// Merged output of the last step that ran.
    pub output: String,
    /// Human-readable failure summary; empty on success and on plain
    /// non-zero exits.
    pub error: String,
    /// Process exit code; -1 if a step was interrupted, 0 if no process ran.
    pub exit_code: i32,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

/// Exit code reported when a process step did not run to completion.
pub const NO_EXIT_CODE: i32 = -1;

impl ExecutionResult {
    fn build(
        key: &str,
        language: &str,
        status: ExecutionStatus,
        output: String,
        error: String,
        exit_code: i32,
        elapsed: Duration,
    ) -> Self {
        let success = exit_code == 0 && error.is_empty();
        Self {
            key: key.to_string(),
            language: language.to_string(),
            status,
            output,
            error,
            exit_code,
            execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            timestamp: Utc::now(),
            success,
        }
    }

    pub fn unsupported(key: &str, language: &str, display_name: &str) -> Self {
        Self::build(
            key,
            language,
            ExecutionStatus::Unsupported,
            String::new(),
            format!("execution not supported for {display_name}"),
            0,
            Duration::ZERO,
        )
    }

    pub fn rejected(key: &str, language: &str) -> Self {
        Self::build(
            key,
            language,
            ExecutionStatus::Rejected,
            String::new(),
            format!("execution already running for {key}"),
            0,
            Duration::ZERO,
        )
    }

    /// The source could not be prepared (write failure, missing file).
    pub fn preparation_failed(key: &str, language: &str, message: &str, elapsed: Duration) -> Self {
        Self::build(
            key,
            language,
            ExecutionStatus::LaunchFailed,
            String::new(),
            format!("Execution error: {message}"),
            0,
            elapsed,
        )
    }

    /// The driving task died without producing a result.
    pub fn internal_failure(key: &str, language: &str, message: &str) -> Self {
        Self::build(
            key,
            language,
            ExecutionStatus::LaunchFailed,
            String::new(),
            format!("Execution error: {message}"),
            NO_EXIT_CODE,
            Duration::ZERO,
        )
    }

    /// Map a compile step that did not finish with exit code 0.
    pub fn from_compile_outcome(
        key: &str,
        language: &str,
        outcome: ProcessOutcome,
        compile_timeout: Duration,
        elapsed: Duration,
    ) -> Self {
        let exit_code = outcome.exit_code.unwrap_or(NO_EXIT_CODE);
        let (status, details) = match outcome.reason {
            TerminationReason::Cancelled => return Self::cancelled(key, language, outcome.output, elapsed),
            TerminationReason::Completed => (ExecutionStatus::CompileFailed, outcome.output.clone()),
            TerminationReason::TimedOut => {
                let mut details = outcome.output.clone();
                if !details.is_empty() && !details.ends_with('\n') {
                    details.push('\n');
                }
                details.push_str(&format!(
                    "compilation timed out after {} seconds",
                    format_secs(compile_timeout)
                ));
                (ExecutionStatus::CompileFailed, details)
            }
            TerminationReason::LaunchFailed => (ExecutionStatus::LaunchFailed, outcome.output.clone()),
        };

        Self::build(
            key,
            language,
            status,
            outcome.output,
            format!("Compilation failed:\n{details}"),
            exit_code,
            elapsed,
        )
    }

    /// Map the outcome of the run step.
    pub fn from_run_outcome(
        key: &str,
        language: &str,
        outcome: ProcessOutcome,
        run_timeout: Duration,
        elapsed: Duration,
    ) -> Self {
        match outcome.reason {
            TerminationReason::Completed => {
                let code = outcome.exit_code.unwrap_or(NO_EXIT_CODE);
                let status = if code == 0 {
                    ExecutionStatus::Completed
                } else {
                    ExecutionStatus::RuntimeFailed
                };
                Self::build(key, language, status, outcome.output, String::new(), code, elapsed)
            }
            TerminationReason::TimedOut => Self::build(
                key,
                language,
                ExecutionStatus::TimedOut,
                outcome.output,
                format!("Execution timed out after {} seconds", format_secs(run_timeout)),
                NO_EXIT_CODE,
                elapsed,
            ),
            TerminationReason::Cancelled => Self::cancelled(key, language, outcome.output, elapsed),
            TerminationReason::LaunchFailed => {
                let error = format!("Execution error: {}", outcome.output);
                Self::build(
                    key,
                    language,
                    ExecutionStatus::LaunchFailed,
                    String::new(),
                    error,
                    NO_EXIT_CODE,
                    elapsed,
                )
            }
        }
    }

    /// Stopped or superseded, possibly before any step ran.
    pub fn cancelled(key: &str, language: &str, output: String, elapsed: Duration) -> Self {
        Self::build(
            key,
            language,
            ExecutionStatus::Cancelled,
            output,
            "Execution cancelled".to_string(),
            NO_EXIT_CODE,
            elapsed,
        )
    }
}

/// Whole seconds when exact, otherwise one decimal.
fn format_secs(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        d.as_secs().to_string()
    } else {
        format!("{:.1}", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(5);

    fn check_invariant(r: &ExecutionResult) {
        assert_eq!(r.success, r.exit_code == 0 && r.error.is_empty(), "{r:?}");
    }

    #[test]
    fn completed_zero_is_success() {
        let r = ExecutionResult::from_run_outcome(
            "k",
            "python",
            ProcessOutcome::completed("hi\n", 0, MS),
            Duration::from_secs(60),
            MS,
        );
        assert!(r.success);
        assert_eq!(r.status, ExecutionStatus::Completed);
        assert_eq!(r.output, "hi\n");
        assert_eq!(r.error, "");
        check_invariant(&r);
    }

    #[test]
    fn non_zero_exit_has_no_synthetic_error() {
        let r = ExecutionResult::from_run_outcome(
            "k",
            "python",
            ProcessOutcome::completed("Traceback...\n", 1, MS),
            Duration::from_secs(60),
            MS,
        );
        assert!(!r.success);
        assert_eq!(r.status, ExecutionStatus::RuntimeFailed);
        assert_eq!(r.exit_code, 1);
        assert!(r.error.is_empty());
        check_invariant(&r);
    }

    #[test]
    fn timeout_message_names_the_limit() {
        let r = ExecutionResult::from_run_outcome(
            "k",
            "python",
            ProcessOutcome::timed_out("partial", MS),
            Duration::from_secs(60),
            MS,
        );
        assert_eq!(r.error, "Execution timed out after 60 seconds");
        assert_eq!(r.output, "partial");
        assert_eq!(r.exit_code, NO_EXIT_CODE);
        check_invariant(&r);

        let r = ExecutionResult::from_run_outcome(
            "k",
            "python",
            ProcessOutcome::timed_out("", MS),
            Duration::from_millis(1500),
            MS,
        );
        assert_eq!(r.error, "Execution timed out after 1.5 seconds");
    }

    #[test]
    fn launch_failure_carries_os_message() {
        let r = ExecutionResult::from_run_outcome(
            "k",
            "python",
            ProcessOutcome::launch_failed("failed to start 'python3': No such file", MS),
            Duration::from_secs(60),
            MS,
        );
        assert_eq!(r.status, ExecutionStatus::LaunchFailed);
        assert!(r.error.starts_with("Execution error: failed to start 'python3'"));
        check_invariant(&r);
    }

    #[test]
    fn compile_failure_keeps_compiler_output_verbatim() {
        let diag = "main.cpp:3:1: error: expected ';'\n";
        let r = ExecutionResult::from_compile_outcome(
            "k",
            "cpp",
            ProcessOutcome::completed(diag, 1, MS),
            Duration::from_secs(30),
            MS,
        );
        assert_eq!(r.status, ExecutionStatus::CompileFailed);
        assert_eq!(r.error, format!("Compilation failed:\n{diag}"));
        assert_eq!(r.exit_code, 1);
        check_invariant(&r);
    }

    #[test]
    fn compile_timeout_and_missing_compiler() {
        let r = ExecutionResult::from_compile_outcome(
            "k",
            "java",
            ProcessOutcome::timed_out("", MS),
            Duration::from_secs(30),
            MS,
        );
        assert_eq!(
            r.error,
            "Compilation failed:\ncompilation timed out after 30 seconds"
        );

        let r = ExecutionResult::from_compile_outcome(
            "k",
            "java",
            ProcessOutcome::launch_failed("failed to start 'javac': not found", MS),
            Duration::from_secs(30),
            MS,
        );
        assert_eq!(r.status, ExecutionStatus::LaunchFailed);
        assert!(r.error.starts_with("Compilation failed:\nfailed to start 'javac'"));
        check_invariant(&r);
    }

    #[test]
    fn cancellation_at_either_step() {
        let r = ExecutionResult::from_compile_outcome(
            "k",
            "c",
            ProcessOutcome::cancelled("", MS),
            Duration::from_secs(30),
            MS,
        );
        assert_eq!(r.status, ExecutionStatus::Cancelled);
        assert_eq!(r.error, "Execution cancelled");

        let r = ExecutionResult::from_run_outcome(
            "k",
            "c",
            ProcessOutcome::cancelled("tick\n", MS),
            Duration::from_secs(30),
            MS,
        );
        assert_eq!(r.status, ExecutionStatus::Cancelled);
        assert_eq!(r.output, "tick\n");
        check_invariant(&r);
    }

    #[test]
    fn unsupported_and_rejected_are_failures_without_process() {
        let r = ExecutionResult::unsupported("k", "ruby", "Ruby");
        assert_eq!(r.error, "execution not supported for Ruby");
        assert_eq!(r.exit_code, 0);
        assert!(!r.success);

        let r = ExecutionResult::rejected("file-7", "python");
        assert_eq!(r.error, "execution already running for file-7");
        assert_eq!(r.status, ExecutionStatus::Rejected);
        assert!(!r.success);
    }

    #[test]
    fn serialises_for_ui() {
        let r = ExecutionResult::unsupported("k", "ruby", "Ruby");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "unsupported");
        assert_eq!(json["success"], false);
        assert!(json["timestamp"].is_string());
    }
}
