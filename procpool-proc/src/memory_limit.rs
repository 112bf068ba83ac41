//! Pluggable memory-ceiling enforcement.
//!
//! Some worker runtimes take a heap-ceiling flag on their own command line
//! (e.g. `--max-old-space-size`). Rust worker scripts have no equivalent
//! argument, so the ceiling is enforced at the OS level instead:
//! `RLIMIT_AS` on Unix, applied in the child right after `fork`+before
//! `exec` via `pre_exec`. Targets without a usable OS-level limit fall back
//! to a no-op strategy that only warns once.

use tokio::process::Command;

/// Strategy for enforcing a worker's memory ceiling.
///
/// Implementations mutate the [`Command`] before it spawns. This is a
/// trait (rather than a single hardcoded function) so tests can substitute
/// a no-op strategy and so a future Windows job-object implementation can
/// slot in without touching call sites.
pub trait MemoryLimitStrategy: Send + Sync {
    /// Arranges for `command`'s eventual child process to be capped at
    /// `memory_limit_mb` megabytes of address space.
    fn apply(&self, command: &mut Command, memory_limit_mb: u32);
}

/// Enforces `RLIMIT_AS` on Unix targets.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct RlimitMemoryLimit;

#[cfg(unix)]
impl MemoryLimitStrategy for RlimitMemoryLimit {
    fn apply(&self, command: &mut Command, memory_limit_mb: u32) {
        use std::io;

        let limit_bytes = u64::from(memory_limit_mb) * 1024 * 1024;
        // SAFETY: the closure only calls the async-signal-safe `setrlimit`
        // syscall between fork and exec, as required by `pre_exec`.
        unsafe {
            command.pre_exec(move || {
                nix::sys::resource::setrlimit(
                    nix::sys::resource::Resource::RLIMIT_AS,
                    limit_bytes,
                    limit_bytes,
                )
                .map_err(|errno| io::Error::from_raw_os_error(errno as i32))?;
                Ok(())
            });
        }
    }
}

/// No-op strategy used on targets with no usable OS-level memory ceiling.
///
/// Warns once per process via `tracing` rather than on every spawn, since
/// every pool worker would otherwise repeat the same message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMemoryLimit;

static WARNED: std::sync::Once = std::sync::Once::new();

impl MemoryLimitStrategy for NoopMemoryLimit {
    fn apply(&self, _command: &mut Command, memory_limit_mb: u32) {
        WARNED.call_once(|| {
            tracing::warn!(
                memory_limit_mb,
                "no OS-level memory ceiling is available on this target; worker memory is unbounded"
            );
        });
    }
}

/// Returns the best memory-limit strategy for the current target.
#[cfg(unix)]
pub fn default_strategy() -> impl MemoryLimitStrategy {
    RlimitMemoryLimit
}

#[cfg(not(unix))]
pub fn default_strategy() -> impl MemoryLimitStrategy {
    NoopMemoryLimit
}
