// src/exec/backend.rs

//! Pluggable process launcher abstraction.
//!
//! The coordinator talks to a [`ProcessLauncher`] instead of spawning
//! processes itself. Production code uses [`ProcessRunner`]; tests can
//! provide a launcher that records invocations and returns canned outcomes
//! without any toolchain installed.
//!
//! [`ProcessRunner`]: super::ProcessRunner

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::outcome::ProcessOutcome;

/// One fully-expanded process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl Invocation {
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Trait abstracting how a single process is run.
pub trait ProcessLauncher: Send + Sync {
    /// Run `invocation` to completion, timeout or cancellation.
    ///
    /// Implementations must never panic on process errors; every failure is
    /// reported through the returned [`ProcessOutcome`].
    fn launch<'a>(
        &'a self,
        invocation: &'a Invocation,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ProcessOutcome> + Send + 'a>>;
}
