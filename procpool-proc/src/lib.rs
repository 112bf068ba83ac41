//! OS-process primitives backing the worker pool manager: spawning a child
//! with its memory ceiling applied, an NDJSON stdio transport, signalling
//! by pid, and resource-usage sampling.
//!
//! This crate has no notion of pools, tasks, or dispatch — it only knows how
//! to start, talk to, signal, and measure one child process at a time. The
//! `procpool` crate builds pool bookkeeping on top of it.

mod error;
mod memory_limit;
mod probe;
mod signal;
mod spawn;

pub use error::{ProcError, ProcResult};
pub use memory_limit::{default_strategy, MemoryLimitStrategy, NoopMemoryLimit};
pub use probe::{ResourceProbe, ResourceUsage, SysinfoProbe};
pub use signal::kill;
pub use spawn::{pid_of, spawn_worker, SpawnedChild, FORCE_GC_ENV};

#[cfg(unix)]
pub use memory_limit::RlimitMemoryLimit;
