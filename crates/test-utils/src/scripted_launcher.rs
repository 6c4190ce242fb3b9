use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use coderunner::exec::{Invocation, ProcessLauncher, ProcessOutcome};
use tokio_util::sync::CancellationToken;

/// What the scripted launcher does for a given program.
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this outcome immediately.
    Return(ProcessOutcome),
    /// Behave like a process that never exits on its own: resolve as
    /// `TimedOut` after the invocation's timeout, or `Cancelled` when the
    /// token fires.
    Hang,
    /// Like `Hang`, but after cancellation keeps going for the given time
    /// before resolving, like a process that is slow to die.
    SlowKill(Duration),
}

/// A launcher that never spawns anything.
///
/// - records every invocation, in order
/// - answers per program name (`argv[0]`) from a script
/// - programs without a script "succeed" with empty output
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    script: Arc<Mutex<HashMap<String, Step>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for `program`. Later calls replace earlier ones.
    pub fn on(&self, program: impl Into<String>, step: Step) -> &Self {
        self.script.lock().unwrap().insert(program.into(), step);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// `argv[0]` of every invocation, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|inv| inv.program().unwrap_or_default().to_string())
            .collect()
    }

    fn step_for(&self, program: &str) -> Step {
        self.script
            .lock()
            .unwrap()
            .get(program)
            .cloned()
            .unwrap_or_else(|| Step::Return(ProcessOutcome::completed("", 0, Duration::ZERO)))
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch<'a>(
        &'a self,
        invocation: &'a Invocation,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ProcessOutcome> + Send + 'a>> {
        Box::pin(async move {
            let started = Instant::now();
            self.calls.lock().unwrap().push(invocation.clone());

            match self.step_for(invocation.program().unwrap_or_default()) {
                Step::Return(outcome) => outcome,
                Step::Hang => hang(invocation, &cancel, Duration::ZERO, started).await,
                Step::SlowKill(linger) => hang(invocation, &cancel, linger, started).await,
            }
        })
    }
}

async fn hang(
    invocation: &Invocation,
    cancel: &CancellationToken,
    linger: Duration,
    started: Instant,
) -> ProcessOutcome {
    tokio::select! {
        _ = cancel.cancelled() => {
            tokio::time::sleep(linger).await;
            ProcessOutcome::cancelled("", started.elapsed())
        }
        _ = tokio::time::sleep(invocation.timeout) => {
            ProcessOutcome::timed_out("", started.elapsed())
        }
    }
}
