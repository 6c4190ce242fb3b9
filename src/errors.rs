// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Execution failures are never reported through this type; they become
//! [`ExecutionResult`](crate::engine::ExecutionResult)s. `CoderunnerError`
//! covers everything around the engine: configuration, templates and the
//! command-line front-end.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoderunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid command template: {0}")]
    TemplateError(String),

    #[error("execution already running for {0}")]
    AlreadyRunning(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CoderunnerError>;
