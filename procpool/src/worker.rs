//! Per-worker bookkeeping: identity, script, assigned pool, in-flight task
//! count, and the transport to the child. Created by the dispatcher on pool
//! init, crash-restart, or one-shot submission; mutated only from within the
//! dispatcher's command loop.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use procpool_proc::SpawnedChild;
use serde::{Deserialize, Serialize};
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// Sentinel pool name used by transient one-shot workers, so they appear in
/// `all_workers`/stats bookkeeping without belonging to any named pool.
pub const ONE_SHOT_POOL: &str = "one-shot";

/// Unique identifier for a live (or just-exited) worker handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(Uuid);

impl WorkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a worker handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Spawned, `INIT` sent, `INIT_DONE` not yet received. Tasks may still
    /// be dispatched to a `Starting` worker — the OS buffers stdin.
    Starting,
    /// `INIT_DONE` received; fully usable.
    Ready,
    /// The child process has exited; the handle is being removed from all
    /// indices and, if it was a pool worker, replaced.
    Exited,
}

/// Immutable spawn parameters, kept on the handle so a crash-restart can
/// respawn with exactly the same `(script, pool_name, memory_limit)`
/// instead of reconstructing it from whatever happens to be in scope.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub script: PathBuf,
    pub pool_name: String,
    pub memory_limit_mb: u32,
}

/// Number of consecutive failed stdin writes after which
/// [`WorkerHandle::is_responsive`] reports `false`.
pub const CONSECUTIVE_FAILURE_THRESHOLD: u32 = 3;

/// Bookkeeping for one live child process.
pub struct WorkerHandle {
    pub id: WorkerId,
    pub pid: u32,
    pub spec: WorkerSpec,
    pub running_tasks: u32,
    pub state: WorkerState,
    pub spawned_at: DateTime<Utc>,
    pub restart_count: u32,
    stdin: Arc<AsyncMutex<ChildStdin>>,
    send_failures: Arc<AtomicU32>,
}

impl WorkerHandle {
    pub fn new(id: WorkerId, pid: u32, spec: WorkerSpec, stdin: ChildStdin) -> Self {
        Self {
            id,
            pid,
            spec,
            running_tasks: 0,
            state: WorkerState::Starting,
            spawned_at: Utc::now(),
            restart_count: 0,
            stdin: Arc::new(AsyncMutex::new(stdin)),
            send_failures: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn pool_name(&self) -> &str {
        &self.spec.pool_name
    }

    pub fn is_one_shot(&self) -> bool {
        self.spec.pool_name == ONE_SHOT_POOL
    }

    /// Cheap handle to this worker's stdin, safe to hold across an `.await`
    /// without pinning the caller's lock on the worker table.
    pub fn stdin_handle(&self) -> Arc<AsyncMutex<ChildStdin>> {
        Arc::clone(&self.stdin)
    }

    /// Shared counter of consecutive failed stdin writes, cloned into the
    /// detached task that actually performs each write so it can report
    /// back without needing mutable access to the worker table.
    pub fn send_failure_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.send_failures)
    }

    /// `false` once [`CONSECUTIVE_FAILURE_THRESHOLD`] sends in a row have
    /// failed — a cheap signal that the child has likely wedged even though
    /// the OS hasn't reported it as exited yet.
    pub fn is_responsive(&self) -> bool {
        self.send_failures.load(Ordering::Relaxed) < CONSECUTIVE_FAILURE_THRESHOLD
    }
}

/// Splits a freshly spawned child into the pieces each owning task needs:
/// the handle's stdin (kept by the dispatcher), the stdout reader (owned by
/// a dedicated reader task), and the bare `Child` (owned by a dedicated
/// exit-watcher task).
pub struct SpawnedParts {
    pub stdin: ChildStdin,
    pub stdout: BufReader<ChildStdout>,
    pub child: Child,
}

impl From<SpawnedChild> for SpawnedParts {
    fn from(spawned: SpawnedChild) -> Self {
        Self {
            stdin: spawned.stdin,
            stdout: spawned.stdout,
            child: spawned.child,
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use procpool_proc::NoopMemoryLimit;

    fn cat_handle() -> WorkerHandle {
        let spawned =
            procpool_proc::spawn_worker("/bin/cat", 64, &NoopMemoryLimit).expect("spawn /bin/cat");
        let pid = procpool_proc::pid_of(&spawned.child).expect("pid");
        let spec = WorkerSpec {
            script: "/bin/cat".into(),
            pool_name: "p".to_string(),
            memory_limit_mb: 64,
        };
        WorkerHandle::new(WorkerId::new(), pid, spec, spawned.stdin)
    }

    #[test]
    fn fresh_worker_is_responsive() {
        let worker = cat_handle();
        assert!(worker.is_responsive());
    }

    #[test]
    fn worker_becomes_unresponsive_after_threshold_failures() {
        let worker = cat_handle();
        let counter = worker.send_failure_counter();
        for _ in 0..CONSECUTIVE_FAILURE_THRESHOLD - 1 {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        assert!(worker.is_responsive());

        counter.fetch_add(1, Ordering::Relaxed);
        assert!(!worker.is_responsive());
    }

    #[test]
    fn a_later_success_resets_the_counter() {
        let worker = cat_handle();
        let counter = worker.send_failure_counter();
        counter.fetch_add(CONSECUTIVE_FAILURE_THRESHOLD, Ordering::Relaxed);
        assert!(!worker.is_responsive());

        counter.store(0, Ordering::Relaxed);
        assert!(worker.is_responsive());
    }
}
