// src/engine/pending.rs

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use tokio::task::JoinHandle;
use tracing::error;

use super::result::ExecutionResult;

enum PendingState {
    Ready(ExecutionResult),
    Running(JoinHandle<ExecutionResult>),
}

/// Handle to an execution started by
/// [`ExecutionCoordinator::execute`](super::ExecutionCoordinator::execute).
///
/// Resolves to exactly one [`ExecutionResult`]. Dropping the handle does not
/// stop the execution; use `stop(key)` for that.
pub struct PendingExecution {
    key: String,
    language: String,
    state: PendingState,
}

impl std::fmt::Debug for PendingExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingExecution")
            .field("key", &self.key)
            .field("language", &self.language)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl PendingExecution {
    pub(crate) fn ready(result: ExecutionResult) -> Self {
        Self {
            key: result.key.clone(),
            language: result.language.clone(),
            state: PendingState::Ready(result),
        }
    }

    pub(crate) fn spawned(key: String, language: String, handle: JoinHandle<ExecutionResult>) -> Self {
        Self {
            key,
            language,
            state: PendingState::Running(handle),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            PendingState::Ready(_) => true,
            PendingState::Running(handle) => handle.is_finished(),
        }
    }

    /// Wait for the result.
    ///
    /// If the driving task panicked or was aborted, a failed result is
    /// synthesised instead of propagating the panic.
    pub async fn wait(self) -> ExecutionResult {
        match self.state {
            PendingState::Ready(result) => result,
            PendingState::Running(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(key = %self.key, error = %e, "execution task failed");
                    ExecutionResult::internal_failure(
                        &self.key,
                        &self.language,
                        &format!("execution task failed: {e}"),
                    )
                }
            },
        }
    }
}

impl IntoFuture for PendingExecution {
    type Output = ExecutionResult;
    type IntoFuture = Pin<Box<dyn Future<Output = ExecutionResult> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
