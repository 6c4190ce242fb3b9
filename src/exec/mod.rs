// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`outcome`] defines [`ProcessOutcome`], the normalised result of one
//!   process invocation.
//! - [`backend`] provides the [`ProcessLauncher`] trait the coordinator
//!   depends on, so tests can replace real processes.
//! - [`runner`] is the tokio implementation, [`ProcessRunner`].
//! - [`capture`] merges stdout and stderr into a single buffer.

pub mod backend;
pub mod capture;
pub mod outcome;
pub mod runner;

pub use backend::{Invocation, ProcessLauncher};
pub use outcome::{ProcessOutcome, TerminationReason};
pub use runner::ProcessRunner;
