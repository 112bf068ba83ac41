//! A worker-pool manager that offloads tasks to isolated child processes.
//!
//! Callers submit a task against either a named, long-lived pool
//! ([`Manager::submit_pool_task`]) or a transient one-shot worker
//! ([`Manager::submit_one_shot_task`]) and receive the worker's reply
//! asynchronously through a [`tokio::sync::oneshot::Receiver`]. Internally,
//! a single actor task (spawned by [`dispatch::spawn`]) owns every mutable
//! piece of state — pools, live workers, the callback map, and the
//! task-to-worker reverse index — so "pick the least-loaded worker and bump
//! its counter" never races, regardless of how many callers submit
//! concurrently.
//!
//! See `procpool-wire` for the parent/child wire protocol and
//! `procpool-proc` for the OS-process primitives (spawning, signalling,
//! resource probing) this crate builds pool bookkeeping on top of.

mod backoff;
mod config;
mod dispatch;
mod error;
mod manager;
mod stats;
mod worker;

pub use config::{
    load_manager_config, load_pool_configs, ManagerConfig, PoolConfig, DEFAULT_MEMORY_LIMIT_MB,
    DEFAULT_WORKER_COUNT,
};
pub use error::SubmissionError;
pub use manager::Manager;
pub use stats::{ManagerStats, ResourceUsageDto, WorkerStats};
pub use worker::{WorkerId, WorkerState, ONE_SHOT_POOL};

// Re-exported so downstream crates (e.g. an HTTP front-end) can build
// `Task`/`Reply` values without an extra direct dependency on the wire
// crate.
pub use procpool_wire::{MessageType, Reply, Task, TaskId};
