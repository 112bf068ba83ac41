//! Resource-usage sampling for live worker processes.
//!
//! Stats reporting needs a per-pid CPU/memory snapshot. The exact sampling
//! mechanism is a pluggable dependency; [`ResourceProbe`] is the seam,
//! [`SysinfoProbe`] the concrete implementation used in production.

use sysinfo::{Pid, System};

/// A CPU/memory snapshot for one process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    /// CPU usage percentage since the probe's last refresh.
    pub cpu_percent: f32,
    /// Resident memory, in bytes.
    pub memory_bytes: u64,
}

/// Samples resource usage for a pid. Returns `None` when the pid cannot be
/// found (process already exited, or the platform denies access) — callers
/// treat that as `ProbeFailure` and silently exclude the worker from stats.
pub trait ResourceProbe: Send + Sync {
    fn sample(&mut self, pid: u32) -> Option<ResourceUsage>;
}

/// [`ResourceProbe`] backed by `sysinfo`.
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&mut self, pid: u32) -> Option<ResourceUsage> {
        let sys_pid = Pid::from_u32(pid);
        self.system.refresh_processes(
            sysinfo::ProcessesToUpdate::Some(&[sys_pid]),
            true,
        );
        let process = self.system.process(sys_pid)?;
        Some(ResourceUsage {
            cpu_percent: process.cpu_usage(),
            memory_bytes: process.memory(),
        })
    }
}
