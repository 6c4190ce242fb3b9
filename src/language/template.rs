// src/language/template.rs

//! Command templates with `{placeholder}` substitution.
//!
//! A pipeline step is stored as an argument vector whose elements may refer to
//! per-execution paths. Expansion happens once per execution, after the
//! coordinator has decided where the source and the build directory live.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{CoderunnerError, Result};

/// Every placeholder a template may use.
pub const PLACEHOLDERS: &[&str] = &["source", "artifact", "dir", "stem", "exe"];

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_]+)\}").expect("placeholder regex"));

/// Values substituted into templates for a single execution.
#[derive(Debug, Clone)]
pub struct TemplateVars {
    /// Absolute or working-directory-relative path of the source file.
    pub source: PathBuf,
    /// Compile artifact; `None` until the artifact template has been expanded.
    pub artifact: Option<PathBuf>,
    /// Per-key build directory.
    pub dir: PathBuf,
    /// Source file name without its extension.
    pub stem: String,
}

impl TemplateVars {
    pub fn new(source: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source,
            artifact: None,
            dir: dir.into(),
            stem,
        }
    }

    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    fn value(&self, name: &str) -> Option<String> {
        match name {
            "source" => Some(path_text(&self.source)),
            "artifact" => self.artifact.as_deref().map(path_text),
            "dir" => Some(path_text(&self.dir)),
            "stem" => Some(self.stem.clone()),
            "exe" => Some(std::env::consts::EXE_SUFFIX.to_string()),
            _ => None,
        }
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn expand_str(raw: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_RE
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            vars.value(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Reject placeholders outside `allowed`.
fn check_placeholders(raw: &str, allowed: &[&str]) -> Result<()> {
    for caps in PLACEHOLDER_RE.captures_iter(raw) {
        let name = &caps[1];
        if !allowed.contains(&name) {
            return Err(CoderunnerError::TemplateError(format!(
                "unknown placeholder {{{name}}} in {raw:?}"
            )));
        }
    }
    Ok(())
}

/// An argument vector template, e.g. `["g++", "{source}", "-o", "{artifact}"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    parts: Vec<String>,
}

impl CommandTemplate {
    /// Parse and validate a template. The first element is the program and
    /// must not be empty.
    pub fn parse<I, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        match parts.first() {
            None => {
                return Err(CoderunnerError::TemplateError(
                    "command must have at least one element".to_string(),
                ));
            }
            Some(program) if program.trim().is_empty() => {
                return Err(CoderunnerError::TemplateError(
                    "command program must not be empty".to_string(),
                ));
            }
            Some(_) => {}
        }
        for part in &parts {
            check_placeholders(part, PLACEHOLDERS)?;
        }
        Ok(Self { parts })
    }

    pub(crate) fn from_static(parts: &[&str]) -> Self {
        Self {
            parts: parts.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Expand into a concrete argv.
    pub fn expand(&self, vars: &TemplateVars) -> Vec<String> {
        self.parts.iter().map(|p| expand_str(p, vars)).collect()
    }
}

/// A single path template describing where a compile step leaves its artifact.
///
/// `{artifact}` is not allowed here for obvious reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
}

impl PathTemplate {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CoderunnerError::TemplateError(
                "artifact path must not be empty".to_string(),
            ));
        }
        check_placeholders(&raw, &["source", "dir", "stem", "exe"])?;
        Ok(Self { raw })
    }

    pub(crate) fn from_static(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expand(&self, vars: &TemplateVars) -> PathBuf {
        PathBuf::from(expand_str(&self.raw, vars))
    }
}
