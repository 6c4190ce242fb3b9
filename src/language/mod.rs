// src/language/mod.rs

//! Language table and per-language build/run pipelines.
//!
//! - [`template`] holds the `{placeholder}` command templates.
//! - [`builtin`] is the default language table shipped with the crate.
//! - [`registry`] provides [`LanguageRegistry`], the lookup the coordinator
//!   consults for every request.

use std::time::Duration;

use serde::Serialize;

pub mod builtin;
pub mod registry;
pub mod template;

pub use registry::{LanguageRegistry, Pipeline};
pub use template::{CommandTemplate, PathTemplate, TemplateVars};

/// Default limit for a compile step.
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(30);

/// How a language's source becomes a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineSpec {
    /// One process: the interpreter/launcher runs the source directly.
    RunOnly { run: CommandTemplate },
    /// Compile to an artifact, then run the artifact.
    CompileThenRun {
        compile: CommandTemplate,
        artifact: PathTemplate,
        run: CommandTemplate,
        compile_timeout: Duration,
    },
    /// Known to the editor, but not executable.
    Unsupported,
}

impl PipelineSpec {
    pub fn kind(&self) -> PipelineKind {
        match self {
            PipelineSpec::RunOnly { .. } => PipelineKind::Interpreted,
            PipelineSpec::CompileThenRun { .. } => PipelineKind::Compiled,
            PipelineSpec::Unsupported => PipelineKind::Unsupported,
        }
    }

    /// The unexpanded steps as `(label, command)` lines, for listings.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        match self {
            PipelineSpec::RunOnly { run } => vec![("run", run.parts().join(" "))],
            PipelineSpec::CompileThenRun {
                compile,
                artifact,
                run,
                compile_timeout,
            } => vec![
                ("compile", compile.parts().join(" ")),
                (
                    "artifact",
                    format!("{} ({}s limit)", artifact.as_str(), compile_timeout.as_secs()),
                ),
                ("run", run.parts().join(" ")),
            ],
            PipelineSpec::Unsupported => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Interpreted,
    Compiled,
    Unsupported,
}

/// A language the editor knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Canonical lowercase identifier, e.g. `"cpp"`.
    pub id: String,
    pub display_name: String,
    /// Source file extension without the dot.
    pub extension: String,
    /// File name used when source content has to be written for a key.
    pub file_name: String,
    /// Extra lookup names, e.g. `"c++"` for `cpp`.
    pub aliases: Vec<String>,
    pub pipeline: PipelineSpec,
    /// Overrides the coordinator's default run timeout.
    pub run_timeout: Option<Duration>,
}

impl Language {
    pub fn kind(&self) -> PipelineKind {
        self.pipeline.kind()
    }

    pub fn supports_execution(&self) -> bool {
        self.kind() != PipelineKind::Unsupported
    }
}
