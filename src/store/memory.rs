// src/store/memory.rs

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::ExecutionResult;
use crate::errors::{CoderunnerError, Result};
use crate::types::DuplicateRunPolicy;

use super::{ExecutionStore, LiveRun, RunId};

const SHARDS: usize = 16;

#[derive(Debug, Default)]
struct KeyState {
    live: Option<LiveRun>,
    /// `done` of the most recently started run, live or not.
    last_done: Option<CancellationToken>,
    last: Option<(RunId, ExecutionResult)>,
}

type Shard = Mutex<HashMap<String, KeyState>>;

/// Sharded in-memory store. Not durable.
///
/// Each key hashes to one of a fixed number of mutex-protected shards, so
/// operations on different keys rarely contend, while all transitions for one
/// key are serialised by its shard lock. Locks are never held across an
/// `.await`.
#[derive(Debug)]
pub struct InMemoryExecutionStore {
    shards: Vec<Shard>,
    next_run_id: AtomicU64,
}

impl Default for InMemoryExecutionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
            next_run_id: AtomicU64::new(1),
        }
    }

    fn shard(&self, key: &str) -> MutexGuard<'_, HashMap<String, KeyState>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        // A panic while holding a shard lock cannot leave a KeyState half
        // updated, so poisoning is ignored.
        self.shards[idx]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExecutionStore for InMemoryExecutionStore {
    fn begin(&self, key: &str, policy: DuplicateRunPolicy) -> Result<LiveRun> {
        let mut shard = self.shard(key);
        let state = shard.entry(key.to_string()).or_default();

        if let Some(existing) = &state.live {
            match policy {
                DuplicateRunPolicy::Reject => {
                    debug!(key, run_id = existing.run_id, %policy, "rejecting duplicate execution");
                    return Err(CoderunnerError::AlreadyRunning(key.to_string()));
                }
                DuplicateRunPolicy::Supersede => {
                    debug!(key, run_id = existing.run_id, %policy, "superseding live execution");
                    existing.cancel.cancel();
                }
            }
        }

        let done = CancellationToken::new();
        let after = state
            .last_done
            .replace(done.clone())
            .filter(|prev| !prev.is_cancelled());

        let run = LiveRun {
            run_id: self.next_run_id.fetch_add(1, Ordering::Relaxed),
            cancel: CancellationToken::new(),
            done,
            after,
        };
        state.live = Some(run.clone());
        Ok(run)
    }

    fn finish(&self, key: &str, run_id: RunId, result: ExecutionResult) {
        let mut shard = self.shard(key);
        let state = shard.entry(key.to_string()).or_default();

        if state.live.as_ref().is_some_and(|live| live.run_id == run_id) {
            state.live = None;
        }

        match &state.last {
            Some((stored, _)) if *stored > run_id => {
                debug!(key, run_id, newer = *stored, "dropping result of superseded run");
            }
            _ => state.last = Some((run_id, result)),
        }
    }

    fn stop(&self, key: &str) -> bool {
        let mut shard = self.shard(key);
        match shard.get_mut(key).and_then(|state| state.live.take()) {
            Some(live) => {
                live.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn is_executing(&self, key: &str) -> bool {
        self.shard(key)
            .get(key)
            .is_some_and(|state| state.live.is_some())
    }

    fn last_result(&self, key: &str) -> Option<ExecutionResult> {
        self.shard(key)
            .get(key)
            .and_then(|state| state.last.as_ref().map(|(_, r)| r.clone()))
    }

    fn running_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .shards
            .iter()
            .flat_map(|shard| {
                let guard = shard.lock().unwrap_or_else(|p| p.into_inner());
                guard
                    .iter()
                    .filter(|(_, state)| state.live.is_some())
                    .map(|(k, _)| k.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        keys.sort();
        keys
    }
}
