// src/engine/coordinator.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{ConfigFile, ConfigSection};
use crate::errors::Result;
use crate::exec::{Invocation, ProcessLauncher, ProcessRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::language::{Language, LanguageRegistry, Pipeline, TemplateVars};
use crate::store::{ExecutionStore, InMemoryExecutionStore, LiveRun, RunId};
use crate::types::DuplicateRunPolicy;

use super::layout::SourceLayout;
use super::pending::PendingExecution;
use super::request::ExecutionRequest;
use super::result::ExecutionResult;

/// Coordinator-wide settings, usually taken from `[config]`.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    /// Root of the per-key build directories.
    pub workspace_dir: PathBuf,
    /// Run timeout when neither the request nor the language sets one.
    pub run_timeout: Duration,
    pub on_duplicate: DuplicateRunPolicy,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self::from(&ConfigSection::default())
    }
}

impl From<&ConfigSection> for ExecutionSettings {
    fn from(section: &ConfigSection) -> Self {
        Self {
            workspace_dir: section.workspace_dir.clone(),
            run_timeout: section.run_timeout(),
            on_duplicate: section.on_duplicate,
        }
    }
}

struct Inner {
    registry: LanguageRegistry,
    settings: ExecutionSettings,
    store: Arc<dyn ExecutionStore>,
    fs: Arc<dyn FileSystem>,
    launcher: Arc<dyn ProcessLauncher>,
}

/// Builder for [`ExecutionCoordinator`]; every collaborator has a production
/// default.
pub struct CoordinatorBuilder {
    registry: LanguageRegistry,
    settings: ExecutionSettings,
    store: Option<Arc<dyn ExecutionStore>>,
    fs: Option<Arc<dyn FileSystem>>,
    launcher: Option<Arc<dyn ProcessLauncher>>,
}

impl CoordinatorBuilder {
    pub fn settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(mut self, store: Arc<dyn ExecutionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn build(self) -> ExecutionCoordinator {
        ExecutionCoordinator {
            inner: Arc::new(Inner {
                registry: self.registry,
                settings: self.settings,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(InMemoryExecutionStore::new())),
                fs: self.fs.unwrap_or_else(|| Arc::new(RealFileSystem)),
                launcher: self
                    .launcher
                    .unwrap_or_else(|| Arc::new(ProcessRunner::new())),
            }),
        }
    }
}

/// Drives execution requests through their language pipeline.
///
/// Cheap to clone; clones share the registry, store and collaborators.
/// `execute` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ExecutionCoordinator {
    inner: Arc<Inner>,
}

impl fmt::Debug for ExecutionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionCoordinator")
            .field("settings", &self.inner.settings)
            .field("store", &self.inner.store)
            .finish_non_exhaustive()
    }
}

/// Releases the live handle if the driving task ends without a result
/// (panic or abort).
struct LiveGuard {
    store: Arc<dyn ExecutionStore>,
    key: String,
    language: String,
    run_id: RunId,
    armed: bool,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(key = %self.key, run_id = self.run_id, "execution ended without a result");
            self.store.finish(
                &self.key,
                self.run_id,
                ExecutionResult::internal_failure(
                    &self.key,
                    &self.language,
                    "execution ended unexpectedly",
                ),
            );
        }
    }
}

impl ExecutionCoordinator {
    pub fn builder(registry: LanguageRegistry) -> CoordinatorBuilder {
        CoordinatorBuilder {
            registry,
            settings: ExecutionSettings::default(),
            store: None,
            fs: None,
            launcher: None,
        }
    }

    /// Coordinator with real processes, the real filesystem and an in-memory
    /// store, configured from a validated config file.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let registry = LanguageRegistry::from_config(cfg)?;
        Ok(Self::builder(registry)
            .settings(ExecutionSettings::from(&cfg.config))
            .build())
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.inner.registry
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.inner.settings
    }

    /// Every known language, with its `supports_execution` flag.
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.inner.registry.languages()
    }

    /// Start an execution and return immediately.
    ///
    /// The live handle for `request.key` is registered before this returns,
    /// so `is_executing(key)` is already true. If the key has a live run, the
    /// configured [`DuplicateRunPolicy`] applies: `Supersede` cancels the old
    /// run, `Reject` resolves the returned handle to a `Rejected` result that
    /// is not stored.
    pub fn execute(&self, request: ExecutionRequest) -> PendingExecution {
        let live = match self
            .inner
            .store
            .begin(&request.key, self.inner.settings.on_duplicate)
        {
            Ok(live) => live,
            Err(e) => {
                warn!(key = %request.key, error = %e, "execution rejected");
                return PendingExecution::ready(ExecutionResult::rejected(
                    &request.key,
                    &request.language,
                ));
            }
        };

        let key = request.key.clone();
        let language = request.language.clone();
        let span = info_span!(
            "execution",
            key = %request.key,
            language = %request.language,
            run_id = live.run_id
        );

        let guard = LiveGuard {
            store: Arc::clone(&self.inner.store),
            key: request.key.clone(),
            language: request.language.clone(),
            run_id: live.run_id,
            armed: true,
        };

        let coordinator = self.clone();
        let handle = tokio::spawn(
            async move { coordinator.drive(request, live, guard).await }.instrument(span),
        );

        PendingExecution::spawned(key, language, handle)
    }

    /// Like [`execute`](Self::execute), delivering the result to `on_result`
    /// from a background task.
    pub fn execute_with_callback<F>(&self, request: ExecutionRequest, on_result: F)
    where
        F: FnOnce(ExecutionResult) + Send + 'static,
    {
        let pending = self.execute(request);
        tokio::spawn(async move {
            on_result(pending.wait().await);
        });
    }

    /// Execute and wait for the result.
    pub async fn run(&self, request: ExecutionRequest) -> ExecutionResult {
        self.execute(request).wait().await
    }

    /// Kill the live run for `key`, if any. Does not wait for it to finish.
    pub fn stop(&self, key: &str) -> bool {
        let stopped = self.inner.store.stop(key);
        if stopped {
            info!(key, "stop requested; live execution cancelled");
        } else {
            debug!(key, "stop requested but nothing is running");
        }
        stopped
    }

    /// Stop every live run. Returns how many were cancelled.
    pub fn stop_all(&self) -> usize {
        self.inner
            .store
            .running_keys()
            .iter()
            .filter(|key| self.stop(key))
            .count()
    }

    pub fn is_executing(&self, key: &str) -> bool {
        self.inner.store.is_executing(key)
    }

    /// Most recently stored result for `key`.
    pub fn get_execution_result(&self, key: &str) -> Option<ExecutionResult> {
        self.inner.store.last_result(key)
    }

    pub fn last_result(&self, key: &str) -> Option<ExecutionResult> {
        self.get_execution_result(key)
    }

    pub fn running_keys(&self) -> Vec<String> {
        self.inner.store.running_keys()
    }

    async fn drive(
        self,
        request: ExecutionRequest,
        live: LiveRun,
        mut guard: LiveGuard,
    ) -> ExecutionResult {
        // Fires `done` however this task ends, including panics.
        let _done = live.done.drop_guard();
        let run_id = live.run_id;
        let cancel = live.cancel;
        let started = Instant::now();

        if let Some(previous) = &live.after {
            debug!("waiting for the previous run of this key to end");
            tokio::select! {
                _ = previous.cancelled() => {}
                _ = cancel.cancelled() => {}
            }
        }

        info!("execution started");

        let result = if cancel.is_cancelled() {
            let language = self
                .inner
                .registry
                .get(&request.language)
                .map_or(request.language.as_str(), |l| l.id.as_str());
            ExecutionResult::cancelled(&request.key, language, String::new(), started.elapsed())
        } else {
            self.run_pipeline(&request, &cancel).await
        };

        info!(
            status = ?result.status,
            exit_code = result.exit_code,
            elapsed_ms = result.execution_time_ms,
            success = result.success,
            "execution finished"
        );

        guard.armed = false;
        self.inner.store.finish(&request.key, run_id, result.clone());
        result
    }

    async fn run_pipeline(
        &self,
        request: &ExecutionRequest,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let key = request.key.as_str();

        let (language, compile_step, run) = match self.inner.registry.pipeline_for(&request.language) {
            Pipeline::NotSupported { id, display_name } => {
                info!(language = id, "execution not supported");
                return ExecutionResult::unsupported(key, id, display_name);
            }
            Pipeline::RunOnly { language, run } => (language, None, run),
            Pipeline::CompileThenRun {
                language,
                compile,
                artifact,
                run,
                compile_timeout,
            } => (language, Some((compile, artifact, compile_timeout)), run),
        };
        let lang_id = language.id.as_str();

        let layout = match self.prepare_source(request, language) {
            Ok(layout) => layout,
            Err(e) => {
                let message = format!("{e:#}");
                warn!(error = %message, "could not prepare source");
                return ExecutionResult::preparation_failed(
                    key,
                    lang_id,
                    &message,
                    started.elapsed(),
                );
            }
        };

        let mut vars = TemplateVars::new(&layout.source, &layout.build_dir);

        if let Some((compile, artifact, compile_timeout)) = compile_step {
            vars = vars.clone().with_artifact(artifact.expand(&vars));
            let invocation = Invocation {
                argv: compile.expand(&vars),
                working_dir: layout.working_dir.clone(),
                timeout: compile_timeout,
            };
            debug!(argv = ?invocation.argv, "compiling");

            let outcome = self.inner.launcher.launch(&invocation, cancel.clone()).await;
            if !outcome.is_success() {
                return ExecutionResult::from_compile_outcome(
                    key,
                    lang_id,
                    outcome,
                    compile_timeout,
                    started.elapsed(),
                );
            }
        }

        let timeout = request
            .run_timeout
            .or(language.run_timeout)
            .unwrap_or(self.inner.settings.run_timeout);
        let invocation = Invocation {
            argv: run.expand(&vars),
            working_dir: layout.working_dir.clone(),
            timeout,
        };
        debug!(argv = ?invocation.argv, ?timeout, "running");

        let outcome = self.inner.launcher.launch(&invocation, cancel.clone()).await;
        ExecutionResult::from_run_outcome(key, lang_id, outcome, timeout, started.elapsed())
    }

    /// Resolve paths, create the build directory and make sure the source is
    /// on disk before any process starts.
    fn prepare_source(
        &self,
        request: &ExecutionRequest,
        language: &Language,
    ) -> anyhow::Result<SourceLayout> {
        let layout = SourceLayout::resolve(request, language, &self.inner.settings.workspace_dir)?;
        let fs = &self.inner.fs;

        fs.create_dir_all(&layout.build_dir)?;

        match &request.source_content {
            Some(content) => fs
                .write_text(&layout.source, content)
                .with_context(|| format!("failed to write source for '{}'", request.key))?,
            None if !fs.exists(&layout.source) => {
                bail!("source file not found: {}", layout.source.display())
            }
            None => {}
        }

        Ok(layout)
    }
}
