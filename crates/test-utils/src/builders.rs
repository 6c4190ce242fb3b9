#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use coderunner::engine::{ExecutionCoordinator, ExecutionSettings};
use coderunner::fs::mock::MockFileSystem;
use coderunner::language::{
    CommandTemplate, DEFAULT_COMPILE_TIMEOUT, Language, LanguageRegistry, PathTemplate,
    PipelineSpec,
};
use coderunner::store::InMemoryExecutionStore;
use coderunner::types::DuplicateRunPolicy;

use crate::scripted_launcher::ScriptedLauncher;

/// Builder for ad-hoc `Language` entries in tests.
pub struct LanguageBuilder {
    lang: Language,
}

impl LanguageBuilder {
    pub fn new(id: &str, extension: &str) -> Self {
        Self {
            lang: Language {
                id: id.to_string(),
                display_name: id.to_string(),
                extension: extension.to_string(),
                file_name: format!("main.{extension}"),
                aliases: vec![],
                pipeline: PipelineSpec::Unsupported,
                run_timeout: None,
            },
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.lang.display_name = name.to_string();
        self
    }

    pub fn file_name(mut self, name: &str) -> Self {
        self.lang.file_name = name.to_string();
        self
    }

    pub fn interpreted(mut self, run: &[&str]) -> Self {
        self.lang.pipeline = PipelineSpec::RunOnly {
            run: CommandTemplate::parse(run.iter().copied()).expect("valid run template"),
        };
        self
    }

    pub fn compiled(mut self, compile: &[&str], artifact: &str, run: &[&str]) -> Self {
        self.lang.pipeline = PipelineSpec::CompileThenRun {
            compile: CommandTemplate::parse(compile.iter().copied())
                .expect("valid compile template"),
            artifact: PathTemplate::parse(artifact).expect("valid artifact template"),
            run: CommandTemplate::parse(run.iter().copied()).expect("valid run template"),
            compile_timeout: DEFAULT_COMPILE_TIMEOUT,
        };
        self
    }

    pub fn compile_timeout(mut self, timeout: Duration) -> Self {
        if let PipelineSpec::CompileThenRun {
            compile_timeout, ..
        } = &mut self.lang.pipeline
        {
            *compile_timeout = timeout;
        }
        self
    }

    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.lang.run_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Language {
        self.lang
    }
}

/// Coordinator wired to a scripted launcher and an in-memory file store.
pub struct ScriptedHarness {
    pub coordinator: ExecutionCoordinator,
    pub launcher: ScriptedLauncher,
    pub fs: MockFileSystem,
    pub workspace: PathBuf,
}

impl ScriptedHarness {
    pub fn new() -> Self {
        Self::with(LanguageRegistry::builtin(), DuplicateRunPolicy::Supersede)
    }

    pub fn with_policy(policy: DuplicateRunPolicy) -> Self {
        Self::with(LanguageRegistry::builtin(), policy)
    }

    pub fn with(registry: LanguageRegistry, policy: DuplicateRunPolicy) -> Self {
        let launcher = ScriptedLauncher::new();
        let fs = MockFileSystem::new();
        let workspace = PathBuf::from("/ws");

        let coordinator = ExecutionCoordinator::builder(registry)
            .settings(ExecutionSettings {
                workspace_dir: workspace.clone(),
                run_timeout: Duration::from_secs(60),
                on_duplicate: policy,
            })
            .store(Arc::new(InMemoryExecutionStore::new()))
            .file_system(Arc::new(fs.clone()))
            .launcher(Arc::new(launcher.clone()))
            .build();

        Self {
            coordinator,
            launcher,
            fs,
            workspace,
        }
    }
}

impl Default for ScriptedHarness {
    fn default() -> Self {
        Self::new()
    }
}
