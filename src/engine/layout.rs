// src/engine/layout.rs

//! Filesystem layout of one execution.
//!
//! Every key owns a build directory under the workspace, named after the key
//! plus a short blake3 digest of it. Keys that sanitise to the same text
//! (`a/b` and `a_b`) still get distinct directories, so concurrent
//! executions of different keys never overwrite each other's artifacts.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::language::Language;

use super::request::ExecutionRequest;

const MAX_KEY_CHARS: usize = 40;
const DIGEST_CHARS: usize = 12;

/// Directory name used for `key` under the workspace.
pub fn key_dir_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_KEY_CHARS)
        .collect();
    if name.is_empty() {
        name.push_str("key");
    }

    let digest = blake3::hash(key.as_bytes()).to_hex();
    format!("{name}-{}", &digest[..DIGEST_CHARS])
}

/// Resolved paths for one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub source: PathBuf,
    /// Per-key directory for compile artifacts (`{dir}` in templates).
    pub build_dir: PathBuf,
    pub working_dir: PathBuf,
}

impl SourceLayout {
    pub fn resolve(
        request: &ExecutionRequest,
        language: &Language,
        workspace_dir: &Path,
    ) -> Result<Self> {
        let build_dir = absolute(&workspace_dir.join(key_dir_name(&request.key)));

        let source = match (&request.source_path, &request.source_content) {
            (Some(path), _) => absolute(path),
            (None, Some(_)) => build_dir.join(&language.file_name),
            (None, None) => bail!(
                "request '{}' has neither source content nor a source path",
                request.key
            ),
        };

        let working_dir = match &request.working_directory {
            Some(dir) => absolute(dir),
            None => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| build_dir.clone()),
        };

        Ok(Self {
            source,
            build_dir,
            working_dir,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
