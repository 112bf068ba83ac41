//! Snapshot types returned by `Manager::get_stats`.

use procpool_proc::ResourceUsage;
use serde::{Deserialize, Serialize};

use crate::worker::WorkerId;

/// Usage snapshot for one live worker. `usage` is `None` when the resource
/// probe failed to find the pid (already exited, or platform denial) —
/// callers display that worker without usage figures rather than dropping
/// it entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker_id: WorkerId,
    pub pool_name: String,
    pub pid: u32,
    pub running_tasks: u32,
    pub restart_count: u32,
    /// `false` once enough consecutive stdin writes have failed that the
    /// child is probably wedged, even though it hasn't exited yet.
    pub responsive: bool,
    pub usage: Option<ResourceUsageDto>,
}

/// Wire-friendly mirror of [`procpool_proc::ResourceUsage`] (that type isn't
/// `Serialize`d by its own crate since it's a process-local sampling result,
/// not a wire type).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceUsageDto {
    pub cpu_percent: f32,
    pub memory_bytes: u64,
}

impl From<ResourceUsage> for ResourceUsageDto {
    fn from(usage: ResourceUsage) -> Self {
        Self {
            cpu_percent: usage.cpu_percent,
            memory_bytes: usage.memory_bytes,
        }
    }
}

/// Stats across every pool, keyed by pool name, plus one-shot workers still
/// in flight under [`crate::worker::ONE_SHOT_POOL`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerStats {
    pub workers: Vec<WorkerStats>,
}

impl ManagerStats {
    pub fn for_pool(&self, pool_name: &str) -> impl Iterator<Item = &WorkerStats> {
        self.workers.iter().filter(move |w| w.pool_name == pool_name)
    }
}
