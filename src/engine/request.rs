// src/engine/request.rs

use std::path::PathBuf;
use std::time::Duration;

/// A unit of work submitted to the coordinator. Not persisted.
///
/// At least one of `source_path` and `source_content` must be set:
///
/// - content only: written to `<workspace>/<key dir>/<language file name>`;
/// - path and content: content is written to the path;
/// - path only: the file must already exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Caller-chosen identifier (e.g. a file id) used for de-duplication,
    /// cancellation and result lookup.
    pub key: String,
    pub language: String,
    pub source_path: Option<PathBuf>,
    pub source_content: Option<String>,
    /// Defaults to the directory containing the source file.
    pub working_directory: Option<PathBuf>,
    /// Overrides the language and coordinator defaults.
    pub run_timeout: Option<Duration>,
}

impl ExecutionRequest {
    pub fn new(key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            language: language.into(),
            source_path: None,
            source_content: None,
            working_directory: None,
            run_timeout: None,
        }
    }

    pub fn with_source_content(mut self, content: impl Into<String>) -> Self {
        self.source_content = Some(content.into());
        self
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }
}
