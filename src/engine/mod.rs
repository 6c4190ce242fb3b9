// src/engine/mod.rs

//! Execution engine.
//!
//! - [`request`] is what callers submit.
//! - [`result`] is what they get back, plus the pure mapping from process
//!   outcomes to results.
//! - [`layout`] decides where a key's source and build artifacts live.
//! - [`coordinator`] drives requests through their pipeline.
//! - [`pending`] is the handle returned by `execute`.

pub mod coordinator;
pub mod layout;
pub mod pending;
pub mod request;
pub mod result;

pub use coordinator::{CoordinatorBuilder, ExecutionCoordinator, ExecutionSettings};
pub use layout::{SourceLayout, key_dir_name};
pub use pending::PendingExecution;
pub use request::ExecutionRequest;
pub use result::{ExecutionResult, ExecutionStatus};
