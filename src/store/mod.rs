// src/store/mod.rs

//! Keyed state shared between running executions and the query surface
//! (`stop`, `is_executing`, `get_execution_result`).
//!
//! The store is injected into the coordinator as an `Arc<dyn ExecutionStore>`
//! so editors can observe or replace it. [`InMemoryExecutionStore`] is the
//! default.

use std::fmt::Debug;

use tokio_util::sync::CancellationToken;

use crate::engine::ExecutionResult;
use crate::errors::Result;
use crate::types::DuplicateRunPolicy;

pub mod memory;

pub use memory::InMemoryExecutionStore;

/// Identifier of one `execute` call, unique within a store.
pub type RunId = u64;

/// Handle returned by [`ExecutionStore::begin`] to the task driving a run.
#[derive(Debug, Clone)]
pub struct LiveRun {
    pub run_id: RunId,
    /// Fires when the run is stopped or superseded.
    pub cancel: CancellationToken,
    /// Cancelled by the driving task once the run has fully ended, i.e.
    /// its processes are gone and its result is recorded.
    pub done: CancellationToken,
    /// `done` of the previous run for the same key, if that run had not
    /// ended yet. The new run must wait for it before touching the key's
    /// build directory.
    pub after: Option<CancellationToken>,
}

pub trait ExecutionStore: Send + Sync + Debug {
    /// Register a new live run for `key`.
    ///
    /// If `key` already has a live run, `policy` decides: `Supersede` cancels
    /// the existing run and replaces its handle; `Reject` returns
    /// [`CoderunnerError::AlreadyRunning`](crate::errors::CoderunnerError::AlreadyRunning).
    ///
    /// A previous run that was stopped or superseded may still be shutting
    /// down; its `done` token is handed out as [`LiveRun::after`].
    fn begin(&self, key: &str, policy: DuplicateRunPolicy) -> Result<LiveRun>;

    /// Record the final result of `run_id` and release its live handle.
    ///
    /// The handle is only cleared if it still belongs to `run_id`. The result
    /// is stored unless a newer run for the same key already stored one.
    fn finish(&self, key: &str, run_id: RunId, result: ExecutionResult);

    /// Cancel and clear the live handle for `key`. Returns whether there was
    /// one.
    fn stop(&self, key: &str) -> bool;

    fn is_executing(&self, key: &str) -> bool;

    fn last_result(&self, key: &str) -> Option<ExecutionResult>;

    /// Keys that currently have a live run, sorted.
    fn running_keys(&self) -> Vec<String>;
}
