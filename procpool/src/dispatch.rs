//! The dispatcher: a single task that owns all pool/worker/callback state
//! and processes one [`DispatcherCommand`] at a time from its mpsc channel.
//!
//! Keeping this state behind one actor rather than a `DashMap`/`RwLock`
//! means "pick the least-loaded worker and mark it busier" is never racy —
//! there is exactly one place in the process that ever mutates a
//! [`WorkerHandle`]'s `running_tasks`.

use std::collections::HashMap;
use std::path::PathBuf;

use procpool_proc::{MemoryLimitStrategy, ProcError, ResourceProbe};
use procpool_wire::{MessageType, Reply, Task, TaskId};
use tokio::io::AsyncBufReadExt;
use tokio::process::ChildStdin;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::backoff::RestartBackoff;
use crate::config::PoolConfig;
use crate::error::SubmissionError;
use crate::stats::{ManagerStats, WorkerStats};
use crate::worker::{SpawnedParts, WorkerHandle, WorkerId, WorkerSpec, ONE_SHOT_POOL};

/// Commands accepted by the dispatcher loop. Every variant that expects a
/// result carries its own reply channel rather than the loop returning a
/// value, since the loop itself never terminates.
pub enum DispatcherCommand {
    InitPools {
        pools: Vec<PoolConfig>,
    },
    SubmitPoolTask {
        pool_name: String,
        data: serde_json::Value,
        ack: oneshot::Sender<Result<oneshot::Receiver<Reply>, SubmissionError>>,
    },
    SubmitOneShotTask {
        script: PathBuf,
        memory_limit_mb: u32,
        data: serde_json::Value,
        ack: oneshot::Sender<Result<oneshot::Receiver<Reply>, String>>,
    },
    ChildMessage {
        worker_id: WorkerId,
        reply: Reply,
    },
    ChildExited {
        worker_id: WorkerId,
    },
    GetStats {
        reply: oneshot::Sender<ManagerStats>,
    },
    Terminate {
        pool_name: Option<String>,
        done: oneshot::Sender<()>,
    },
    /// Internal: fired by a delayed task after a pool worker's backoff
    /// interval elapses. Not constructed outside this module.
    RestartWorker {
        spec: WorkerSpec,
        prior_restart_count: u32,
    },
}

/// A task dispatched to a worker, kept around only long enough to resolve
/// its callback when the reply (or a synthetic one) arrives.
struct Callback {
    sender: oneshot::Sender<Reply>,
}

struct DispatcherState {
    pools: HashMap<String, Vec<WorkerId>>,
    all_workers: HashMap<WorkerId, WorkerHandle>,
    callbacks: HashMap<TaskId, Callback>,
    task_owner: HashMap<TaskId, WorkerId>,
    backoffs: HashMap<String, RestartBackoff>,
    memory_limit: Box<dyn MemoryLimitStrategy>,
    probe: Box<dyn ResourceProbe>,
    self_tx: mpsc::Sender<DispatcherCommand>,
}

/// Spawns the dispatcher task and returns the sender half other components
/// use to talk to it. `memory_limit`/`probe` are injected so tests can run
/// without real rlimits or `sysinfo` access.
pub fn spawn(
    memory_limit: Box<dyn MemoryLimitStrategy>,
    probe: Box<dyn ResourceProbe>,
) -> mpsc::Sender<DispatcherCommand> {
    let (tx, rx) = mpsc::channel(1024);
    let state = DispatcherState {
        pools: HashMap::new(),
        all_workers: HashMap::new(),
        callbacks: HashMap::new(),
        task_owner: HashMap::new(),
        backoffs: HashMap::new(),
        memory_limit,
        probe,
        self_tx: tx.clone(),
    };
    tokio::spawn(run(state, rx));
    tx
}

async fn run(mut state: DispatcherState, mut rx: mpsc::Receiver<DispatcherCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            DispatcherCommand::InitPools { pools } => state.init_pools(pools).await,
            DispatcherCommand::SubmitPoolTask {
                pool_name,
                data,
                ack,
            } => state.submit_pool_task(pool_name, data, ack),
            DispatcherCommand::SubmitOneShotTask {
                script,
                memory_limit_mb,
                data,
                ack,
            } => state.submit_one_shot_task(script, memory_limit_mb, data, ack).await,
            DispatcherCommand::ChildMessage { worker_id, reply } => {
                state.handle_child_message(worker_id, reply).await
            }
            DispatcherCommand::ChildExited { worker_id } => {
                state.handle_child_exited(worker_id).await
            }
            DispatcherCommand::GetStats { reply } => {
                let _ = reply.send(state.snapshot_stats());
            }
            DispatcherCommand::Terminate { pool_name, done } => {
                state.terminate(pool_name).await;
                let _ = done.send(());
            }
            DispatcherCommand::RestartWorker {
                spec,
                prior_restart_count,
            } => {
                let pool_name = spec.pool_name.clone();
                match state.spawn_and_register(spec).await {
                    Ok(worker_id) => {
                        if let Some(worker) = state.all_workers.get_mut(&worker_id) {
                            worker.restart_count = prior_restart_count.saturating_add(1);
                        }
                        info!(%worker_id, pool = %pool_name, "restarted worker after crash");
                    }
                    Err(err) => error!(pool = %pool_name, %err, "failed to restart worker"),
                }
            }
        }
    }
    debug!("dispatcher command channel closed, loop exiting");
}

impl DispatcherState {
    async fn init_pools(&mut self, pools: Vec<PoolConfig>) {
        for pool in pools {
            if pool.is_incomplete() {
                warn!(pool_name = %pool.pool_name, "skipping pool with missing config");
                continue;
            }
            self.pools.entry(pool.pool_name.clone()).or_default();
            self.backoffs
                .entry(pool.pool_name.clone())
                .or_insert_with(RestartBackoff::default);
            for _ in 0..pool.worker_count {
                let spec = WorkerSpec {
                    script: pool.worker_script.clone(),
                    pool_name: pool.pool_name.clone(),
                    memory_limit_mb: pool.worker_memory_limit_mb,
                };
                if let Err(err) = self.spawn_and_register(spec).await {
                    error!(pool_name = %pool.pool_name, %err, "failed to spawn initial worker");
                }
            }
        }
    }

    async fn spawn_and_register(&mut self, spec: WorkerSpec) -> Result<WorkerId, ProcError> {
        let spawned = procpool_proc::spawn_worker(
            &spec.script,
            spec.memory_limit_mb,
            self.memory_limit.as_ref(),
        )?;
        let pid = procpool_proc::pid_of(&spawned.child)?;
        let parts: SpawnedParts = spawned.into();
        let worker_id = WorkerId::new();
        let pool_name = spec.pool_name.clone();
        let is_one_shot = pool_name == ONE_SHOT_POOL;

        let handle = WorkerHandle::new(worker_id, pid, spec, parts.stdin);
        let stdin_for_init = handle.stdin_handle();
        self.all_workers.insert(worker_id, handle);
        if !is_one_shot {
            self.pools.entry(pool_name).or_default().push(worker_id);
        }

        spawn_reader_task(worker_id, parts.stdout, self.self_tx.clone());
        spawn_waiter_task(worker_id, parts.child, self.self_tx.clone());

        if !is_one_shot {
            send_init(pid, stdin_for_init).await;
        }

        Ok(worker_id)
    }

    fn submit_pool_task(
        &mut self,
        pool_name: String,
        data: serde_json::Value,
        ack: oneshot::Sender<Result<oneshot::Receiver<Reply>, SubmissionError>>,
    ) {
        let Some(worker_ids) = self.pools.get(&pool_name) else {
            let _ = ack.send(Err(SubmissionError::UnknownPool(pool_name)));
            return;
        };
        if worker_ids.is_empty() {
            let _ = ack.send(Err(SubmissionError::EmptyPool(pool_name)));
            return;
        }

        let Some(worker_id) = self.pick_least_loaded(&pool_name) else {
            let _ = ack.send(Err(SubmissionError::EmptyPool(pool_name)));
            return;
        };
        let (tx, rx) = oneshot::channel();
        let task = Task::work(data, Some(pool_name));
        let task_id = task.id;
        self.callbacks.insert(task_id, Callback { sender: tx });
        self.task_owner.insert(task_id, worker_id);
        if let Some(worker) = self.all_workers.get_mut(&worker_id) {
            worker.running_tasks += 1;
        }
        let _ = ack.send(Ok(rx));
        self.send_task(worker_id, task);
    }

    async fn submit_one_shot_task(
        &mut self,
        script: PathBuf,
        memory_limit_mb: u32,
        data: serde_json::Value,
        ack: oneshot::Sender<Result<oneshot::Receiver<Reply>, String>>,
    ) {
        let spec = WorkerSpec {
            script,
            pool_name: ONE_SHOT_POOL.to_string(),
            memory_limit_mb,
        };
        let worker_id = match self.spawn_and_register(spec).await {
            Ok(id) => id,
            Err(err) => {
                let _ = ack.send(Err(err.to_string()));
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        let task = Task::work(data, None);
        let task_id = task.id;
        self.callbacks.insert(task_id, Callback { sender: tx });
        self.task_owner.insert(task_id, worker_id);
        if let Some(worker) = self.all_workers.get_mut(&worker_id) {
            worker.running_tasks += 1;
        }
        let _ = ack.send(Ok(rx));
        self.send_task(worker_id, task);
    }

    /// Picks the worker in `pool_name` with the fewest `running_tasks`,
    /// breaking ties by order of first appearance in the pool's worker
    /// list (i.e. the worker that's been around longest).
    fn pick_least_loaded(&self, pool_name: &str) -> Option<WorkerId> {
        let worker_ids = self.pools.get(pool_name)?;
        worker_ids
            .iter()
            .filter_map(|id| self.all_workers.get(id).map(|w| (*id, w.running_tasks)))
            .min_by_key(|(_, running)| *running)
            .map(|(id, _)| id)
    }

    async fn handle_child_message(&mut self, worker_id: WorkerId, reply: Reply) {
        match reply.kind {
            MessageType::InitDone => {
                if let Some(worker) = self.all_workers.get_mut(&worker_id) {
                    worker.state = crate::worker::WorkerState::Ready;
                    debug!(%worker_id, pool = worker.pool_name(), "worker ready");
                }
            }
            MessageType::WorkDone | MessageType::Error => {
                self.resolve_task(reply.id, reply).await;
            }
            other => {
                warn!(%worker_id, ?other, "unexpected message kind from child, ignoring");
            }
        }
    }

    /// Decrements the owning worker's `running_tasks` and resolves the
    /// caller's callback. A one-shot worker handles exactly one `WORK` task
    /// in its lifetime (spec §4.3 step 5), so once its single reply has been
    /// delivered this also sends it `TERMINATE` and lets the waiter task's
    /// exit event clean up the rest.
    async fn resolve_task(&mut self, task_id: TaskId, reply: Reply) {
        let owner = self.task_owner.remove(&task_id);
        if let Some(worker_id) = owner {
            if let Some(worker) = self.all_workers.get_mut(&worker_id) {
                worker.running_tasks = worker.running_tasks.saturating_sub(1);
            }
        }
        if let Some(callback) = self.callbacks.remove(&task_id) {
            let _ = callback.sender.send(reply);
        }
        if let Some(worker_id) = owner {
            if let Some(worker) = self.all_workers.get(&worker_id) {
                if worker.is_one_shot() {
                    send_terminate(worker.pid, worker.stdin_handle()).await;
                }
            }
        }
    }

    async fn handle_child_exited(&mut self, worker_id: WorkerId) {
        let Some(worker) = self.all_workers.remove(&worker_id) else {
            return;
        };
        let pool_name = worker.pool_name().to_string();
        if let Some(worker_ids) = self.pools.get_mut(&pool_name) {
            worker_ids.retain(|id| *id != worker_id);
        }

        let orphaned: Vec<TaskId> = self
            .task_owner
            .iter()
            .filter(|(_, owner)| **owner == worker_id)
            .map(|(task_id, _)| *task_id)
            .collect();
        for task_id in orphaned {
            self.task_owner.remove(&task_id);
            if let Some(callback) = self.callbacks.remove(&task_id) {
                let _ = callback.sender.send(Reply::synthetic_error(
                    task_id,
                    format!("worker {worker_id} exited before completing this task"),
                ));
            }
        }

        if worker.is_one_shot() {
            info!(%worker_id, "one-shot worker exited");
            return;
        }

        warn!(%worker_id, pool = %pool_name, "pool worker exited, attempting restart");
        let backoff = self
            .backoffs
            .entry(pool_name.clone())
            .or_insert_with(RestartBackoff::default);
        backoff.record_restart();
        if backoff.is_limit_exceeded() {
            error!(
                pool = %pool_name,
                "restart limit exceeded, not restarting worker; pool will run short a worker"
            );
            return;
        }
        let delay = backoff.calculate_delay();
        let spec = worker.spec.clone();
        let prior_restart_count = worker.restart_count;
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = self_tx
                .send(DispatcherCommand::RestartWorker {
                    spec,
                    prior_restart_count,
                })
                .await;
        });
    }

    fn snapshot_stats(&mut self) -> ManagerStats {
        let mut workers = Vec::with_capacity(self.all_workers.len());
        for worker in self.all_workers.values() {
            let usage = self.probe.sample(worker.pid).map(Into::into);
            workers.push(WorkerStats {
                worker_id: worker.id,
                pool_name: worker.pool_name().to_string(),
                pid: worker.pid,
                running_tasks: worker.running_tasks,
                restart_count: worker.restart_count,
                responsive: worker.is_responsive(),
                usage,
            });
        }
        ManagerStats { workers }
    }

    async fn terminate(&mut self, pool_name: Option<String>) {
        let targets: Vec<WorkerId> = match &pool_name {
            Some(name) => self.pools.get(name).cloned().unwrap_or_default(),
            None => self.all_workers.keys().copied().collect(),
        };
        for worker_id in targets {
            if let Some(worker) = self.all_workers.get(&worker_id) {
                send_terminate(worker.pid, worker.stdin_handle()).await;
                info!(%worker_id, "sent terminate to worker");
            }
        }
    }

    fn send_task(&self, worker_id: WorkerId, task: Task) {
        if let Some(worker) = self.all_workers.get(&worker_id) {
            let stdin = worker.stdin_handle();
            let failures = worker.send_failure_counter();
            let pid = worker.pid;
            tokio::spawn(async move {
                let mut guard = stdin.lock().await;
                match procpool_wire::write_line(&mut *guard, &task).await {
                    Ok(()) => failures.store(0, std::sync::atomic::Ordering::Relaxed),
                    Err(err) => {
                        failures.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        let transport = ProcError::TransportClosed { pid };
                        error!(%err, %transport, "failed writing task to worker stdin");
                    }
                }
            });
        }
    }
}

async fn send_init(pid: u32, stdin: std::sync::Arc<tokio::sync::Mutex<ChildStdin>>) {
    let mut guard = stdin.lock().await;
    if let Err(err) = procpool_wire::write_line(&mut *guard, &Task::init()).await {
        let transport = ProcError::TransportClosed { pid };
        error!(%err, %transport, "failed writing init to worker stdin");
    }
}

async fn send_terminate(pid: u32, stdin: std::sync::Arc<tokio::sync::Mutex<ChildStdin>>) {
    let mut guard = stdin.lock().await;
    if let Err(err) = procpool_wire::write_line(&mut *guard, &Task::terminate()).await {
        let transport = ProcError::TransportClosed { pid };
        error!(%err, %transport, "failed writing terminate to worker stdin");
    }
}

/// Reads framed [`Reply`] values from a worker's stdout until EOF, forwarding
/// each as a [`DispatcherCommand::ChildMessage`]. EOF is not itself treated
/// as exit — the dedicated waiter task owns that signal.
fn spawn_reader_task(
    worker_id: WorkerId,
    mut stdout: tokio::io::BufReader<tokio::process::ChildStdout>,
    tx: mpsc::Sender<DispatcherCommand>,
) {
    tokio::spawn(async move {
        loop {
            match procpool_wire::read_line::<_, Reply>(&mut stdout).await {
                Ok(Some(reply)) => {
                    if tx
                        .send(DispatcherCommand::ChildMessage { worker_id, reply })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(%worker_id, %err, "worker stdout framing error, stopping reader");
                    break;
                }
            }
        }
    });
}

fn spawn_waiter_task(
    worker_id: WorkerId,
    mut child: tokio::process::Child,
    tx: mpsc::Sender<DispatcherCommand>,
) {
    tokio::spawn(async move {
        let status = child.wait().await;
        match status {
            Ok(status) => debug!(%worker_id, ?status, "worker process exited"),
            Err(err) => warn!(%worker_id, %err, "error waiting on worker process"),
        }
        let _ = tx.send(DispatcherCommand::ChildExited { worker_id }).await;
    });
}

#[cfg(test)]
#[cfg(unix)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use procpool_proc::{NoopMemoryLimit, SysinfoProbe};

    /// Spawns `/bin/cat` as a stand-in child and wraps it in a `WorkerHandle`
    /// with `running_tasks` pre-set, so `pick_least_loaded` can be exercised
    /// directly without a full dispatcher actor or a real worker protocol.
    async fn fake_worker(pool_name: &str, running_tasks: u32) -> (WorkerId, WorkerHandle) {
        let spawned =
            procpool_proc::spawn_worker("/bin/cat", 64, &NoopMemoryLimit).expect("spawn /bin/cat");
        let pid = procpool_proc::pid_of(&spawned.child).expect("pid");
        let id = WorkerId::new();
        let spec = WorkerSpec {
            script: "/bin/cat".into(),
            pool_name: pool_name.to_string(),
            memory_limit_mb: 64,
        };
        let mut handle = WorkerHandle::new(id, pid, spec, spawned.stdin);
        handle.running_tasks = running_tasks;
        (id, handle)
    }

    /// Like `fake_worker`, but also hands back the child's stdout so a test
    /// can inspect what the dispatcher actually wrote to its stdin (`/bin/cat`
    /// echoes stdin to stdout verbatim).
    async fn fake_worker_with_stdout(
        pool_name: &str,
    ) -> (WorkerId, WorkerHandle, tokio::io::BufReader<tokio::process::ChildStdout>) {
        let spawned =
            procpool_proc::spawn_worker("/bin/cat", 64, &NoopMemoryLimit).expect("spawn /bin/cat");
        let pid = procpool_proc::pid_of(&spawned.child).expect("pid");
        let id = WorkerId::new();
        let spec = WorkerSpec {
            script: "/bin/cat".into(),
            pool_name: pool_name.to_string(),
            memory_limit_mb: 64,
        };
        let handle = WorkerHandle::new(id, pid, spec, spawned.stdin);
        (id, handle, spawned.stdout)
    }

    fn empty_state() -> (DispatcherState, mpsc::Receiver<DispatcherCommand>) {
        let (tx, rx) = mpsc::channel(8);
        let state = DispatcherState {
            pools: HashMap::new(),
            all_workers: HashMap::new(),
            callbacks: HashMap::new(),
            task_owner: HashMap::new(),
            backoffs: HashMap::new(),
            memory_limit: Box::new(NoopMemoryLimit),
            probe: Box::new(SysinfoProbe::new()),
            self_tx: tx,
        };
        (state, rx)
    }

    #[tokio::test]
    async fn least_loaded_ties_break_by_first_seen() {
        let (mut state, _rx) = empty_state();
        let (id_a, worker_a) = fake_worker("p", 0).await;
        let (id_b, worker_b) = fake_worker("p", 0).await;
        state.all_workers.insert(id_a, worker_a);
        state.all_workers.insert(id_b, worker_b);
        state.pools.insert("p".to_string(), vec![id_a, id_b]);

        assert_eq!(state.pick_least_loaded("p"), Some(id_a));
    }

    #[tokio::test]
    async fn least_loaded_prefers_smaller_running_tasks() {
        let (mut state, _rx) = empty_state();
        let (id_a, worker_a) = fake_worker("p", 3).await;
        let (id_b, worker_b) = fake_worker("p", 1).await;
        state.all_workers.insert(id_a, worker_a);
        state.all_workers.insert(id_b, worker_b);
        state.pools.insert("p".to_string(), vec![id_a, id_b]);

        assert_eq!(state.pick_least_loaded("p"), Some(id_b));
    }

    #[tokio::test]
    async fn least_loaded_returns_none_for_unknown_pool() {
        let (state, _rx) = empty_state();
        assert_eq!(state.pick_least_loaded("ghost"), None);
    }

    #[tokio::test]
    async fn abnormal_exit_resolves_dangling_callback_with_synthetic_error() {
        let (mut state, _rx) = empty_state();
        let (id_a, worker_a) = fake_worker("p", 1).await;
        state.pools.insert("p".to_string(), vec![id_a]);
        state.all_workers.insert(id_a, worker_a);

        let (cb_tx, cb_rx) = oneshot::channel();
        let task_id = TaskId::new();
        state.callbacks.insert(task_id, Callback { sender: cb_tx });
        state.task_owner.insert(task_id, id_a);

        state.handle_child_exited(id_a).await;

        assert!(!state.all_workers.contains_key(&id_a));
        assert!(state.callbacks.is_empty());
        assert!(state.task_owner.is_empty());
        let reply = cb_rx.await.expect("callback invoked exactly once");
        assert!(!reply.ok);
    }

    #[tokio::test]
    async fn resolve_task_sends_terminate_to_a_one_shot_worker() {
        let (mut state, _rx) = empty_state();
        let (id_a, worker_a, mut stdout) = fake_worker_with_stdout(ONE_SHOT_POOL).await;
        state.all_workers.insert(id_a, worker_a);

        let (cb_tx, cb_rx) = oneshot::channel();
        let task_id = TaskId::new();
        state.callbacks.insert(task_id, Callback { sender: cb_tx });
        state.task_owner.insert(task_id, id_a);

        state
            .resolve_task(task_id, Reply::work_done(task_id, serde_json::json!({})))
            .await;

        let reply = cb_rx.await.expect("callback invoked exactly once");
        assert!(reply.ok);

        let echoed: Task = procpool_wire::read_line(&mut stdout)
            .await
            .expect("read echoed line")
            .expect("terminate line present");
        assert_eq!(echoed.kind, MessageType::Terminate);
    }

    #[tokio::test]
    async fn resolve_task_does_not_terminate_a_pool_worker() {
        let (mut state, _rx) = empty_state();
        let (id_a, worker_a, mut stdout) = fake_worker_with_stdout("p").await;
        state.pools.insert("p".to_string(), vec![id_a]);
        state.all_workers.insert(id_a, worker_a);

        let (cb_tx, cb_rx) = oneshot::channel();
        let task_id = TaskId::new();
        state.callbacks.insert(task_id, Callback { sender: cb_tx });
        state.task_owner.insert(task_id, id_a);

        state
            .resolve_task(task_id, Reply::work_done(task_id, serde_json::json!({})))
            .await;

        let reply = cb_rx.await.expect("callback invoked exactly once");
        assert!(reply.ok);

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            procpool_wire::read_line::<_, Task>(&mut stdout),
        )
        .await;
        assert!(pending.is_err(), "pool worker should not receive TERMINATE");
    }

    proptest::proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        /// For any interleaving of submissions and completions, every
        /// in-flight task has exactly one `running_tasks` unit, one
        /// `callbacks` entry, and one `task_owner` entry — the three never
        /// drift apart regardless of submit/complete order. Each case spawns
        /// its own pair of `/bin/cat` stand-ins, so the case count is kept
        /// low to bound process churn.
        #[test]
        fn running_tasks_tracks_callbacks_one_to_one(
            ops in proptest::collection::vec(proptest::bool::ANY, 1..40)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let (mut state, _rx) = empty_state();
                let (id_a, worker_a) = fake_worker("p", 0).await;
                let (id_b, worker_b) = fake_worker("p", 0).await;
                state.all_workers.insert(id_a, worker_a);
                state.all_workers.insert(id_b, worker_b);
                state.pools.insert("p".to_string(), vec![id_a, id_b]);

                for submit in ops {
                    let pending: Vec<TaskId> = state.callbacks.keys().copied().collect();
                    if submit || pending.is_empty() {
                        let (ack_tx, _ack_rx) = oneshot::channel();
                        state.submit_pool_task("p".to_string(), serde_json::json!({}), ack_tx);
                    } else {
                        let task_id = pending[0];
                        state
                            .resolve_task(task_id, Reply::work_done(task_id, serde_json::json!({})))
                            .await;
                    }

                    let running_sum: u32 =
                        state.all_workers.values().map(|w| w.running_tasks).sum();
                    assert_eq!(running_sum as usize, state.callbacks.len());
                    assert_eq!(state.callbacks.len(), state.task_owner.len());
                }
            });
        }
    }
}
