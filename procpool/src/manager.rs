//! The control surface: the public façade over the dispatcher actor.
//!
//! `Manager` owns nothing but a sender handle to the dispatcher task spawned
//! by [`crate::dispatch::spawn`]. It is cheap to `Clone` — every clone talks
//! to the same dispatcher — and there is no module-level singleton; the host
//! application constructs and owns however many it needs.

use std::path::PathBuf;

use procpool_proc::{default_strategy, MemoryLimitStrategy, ResourceProbe, SysinfoProbe};
use procpool_wire::Reply;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{ManagerConfig, PoolConfig, DEFAULT_MEMORY_LIMIT_MB};
use crate::dispatch::{self, DispatcherCommand};
use crate::error::SubmissionError;
use crate::stats::ManagerStats;

/// Entry point for submitting work, inspecting stats, and tearing pools
/// down.
#[derive(Clone)]
pub struct Manager {
    tx: mpsc::Sender<DispatcherCommand>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// A manager backed by the OS-appropriate memory-limit strategy and a
    /// `sysinfo` resource probe.
    pub fn new() -> Self {
        Self::with_backends(Box::new(default_strategy()), Box::new(SysinfoProbe::new()))
    }

    /// A manager with injected backends, for tests that want a no-op memory
    /// limit or a scripted resource probe instead of touching real rlimits
    /// or `sysinfo`.
    pub fn with_backends(
        memory_limit: Box<dyn MemoryLimitStrategy>,
        probe: Box<dyn ResourceProbe>,
    ) -> Self {
        let tx = dispatch::spawn(memory_limit, probe);
        Self { tx }
    }

    /// Spawns the configured workers for each pool. Entries missing a
    /// `pool_name` or `worker_script` are logged and skipped rather than
    /// failing the whole call.
    pub async fn init_pools(&self, pools: Vec<PoolConfig>) {
        if self
            .tx
            .send(DispatcherCommand::InitPools { pools })
            .await
            .is_err()
        {
            warn!("init_pools called after the dispatcher task has exited");
        }
    }

    /// Submits a task to a named pool, returning synchronously whether the
    /// pool accepted the task. The actual reply arrives later through the
    /// returned channel — exactly once, per task.
    pub async fn submit_pool_task(
        &self,
        pool_name: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<oneshot::Receiver<Reply>, SubmissionError> {
        let pool_name = pool_name.into();
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .tx
            .send(DispatcherCommand::SubmitPoolTask {
                pool_name,
                data,
                ack: ack_tx,
            })
            .await
            .is_err()
        {
            return Err(SubmissionError::DispatcherGone);
        }
        ack_rx.await.unwrap_or(Err(SubmissionError::DispatcherGone))
    }

    /// Spawns a fresh worker for exactly one task, then terminates it once
    /// the reply arrives. Skips the `INIT` handshake entirely — the parent
    /// goes straight to `WORK`.
    pub async fn submit_one_shot_task(
        &self,
        script: impl Into<PathBuf>,
        data: serde_json::Value,
        memory_limit_mb: Option<u32>,
    ) -> Result<oneshot::Receiver<Reply>, String> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .tx
            .send(DispatcherCommand::SubmitOneShotTask {
                script: script.into(),
                memory_limit_mb: memory_limit_mb.unwrap_or(DEFAULT_MEMORY_LIMIT_MB),
                data,
                ack: ack_tx,
            })
            .await
            .is_err()
        {
            return Err("worker pool manager is no longer running".to_string());
        }
        ack_rx
            .await
            .unwrap_or(Err("worker pool manager is no longer running".to_string()))
    }

    /// Resource-usage snapshot across every live worker, optionally
    /// narrowed to one pool. Workers whose pid could not be sampled
    /// (`ProbeFailure`) are included with `usage: None` rather than
    /// dropped, matching `WorkerStats`'s documented contract.
    pub async fn get_stats(&self, pool_name: Option<&str>) -> ManagerStats {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(DispatcherCommand::GetStats { reply: reply_tx })
            .await
            .is_err()
        {
            return ManagerStats::default();
        }
        let mut stats = reply_rx.await.unwrap_or_default();
        if let Some(pool_name) = pool_name {
            stats.workers.retain(|w| w.pool_name == pool_name);
        }
        stats
    }

    /// Sends `TERMINATE` to every worker in `pool_name` (or every worker in
    /// every pool, if `None`). Does not wait for the children to actually
    /// exit — callers that need that can poll `get_stats` until it's empty.
    pub async fn terminate(&self, pool_name: Option<&str>) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .tx
            .send(DispatcherCommand::Terminate {
                pool_name: pool_name.map(str::to_string),
                done: done_tx,
            })
            .await
            .is_err()
        {
            return;
        }
        let _ = done_rx.await;
    }

    /// Spawns the periodic stats-logging loop described by `config`. A
    /// no-op (returns `None`) when `config.enable_stats_logging` is false —
    /// background work never runs unless the caller asks for it.
    pub fn spawn_stats_logger(&self, config: &ManagerConfig) -> Option<JoinHandle<()>> {
        if !config.enable_stats_logging {
            return None;
        }
        let manager = self.clone();
        let interval = config.stats_interval;
        let high_water_mark = config.pending_queue_high_water_mark;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let stats = manager.get_stats(None).await;
                if let Some(mark) = high_water_mark {
                    let in_flight: usize = stats.workers.iter().map(|w| w.running_tasks).sum();
                    if in_flight > mark {
                        warn!(
                            in_flight,
                            high_water_mark = mark,
                            "in-flight task count exceeds the configured high-water mark"
                        );
                    }
                }
                for worker in &stats.workers {
                    if !worker.responsive {
                        warn!(
                            pool = %worker.pool_name,
                            pid = worker.pid,
                            "worker has not accepted a write in a while, may be wedged"
                        );
                    }
                    match worker.usage {
                        Some(usage) => info!(
                            pool = %worker.pool_name,
                            pid = worker.pid,
                            running_tasks = worker.running_tasks,
                            cpu_percent = usage.cpu_percent,
                            memory_bytes = usage.memory_bytes,
                            "worker stats"
                        ),
                        None => info!(
                            pool = %worker.pool_name,
                            pid = worker.pid,
                            running_tasks = worker.running_tasks,
                            "worker stats (resource probe unavailable)"
                        ),
                    }
                }
            }
        }))
    }

    /// Installs `Ctrl-C` and (on Unix) `SIGTERM` handlers that call
    /// `terminate(None)` across every pool before returning. Spawned as a
    /// background task; the caller is expected to hold the process open
    /// (e.g. an HTTP server's own shutdown future) until it wants these
    /// hooks to fire.
    pub fn spawn_shutdown_hooks(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            info!("shutdown signal received, terminating all worker pools");
            manager.terminate(None).await;
        })
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%err, "failed to install SIGTERM handler, falling back to ctrl-c only");
            let _ = ctrl_c.await;
            return;
        }
    };
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
