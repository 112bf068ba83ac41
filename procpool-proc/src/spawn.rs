//! Spawning a child worker process and wiring up its NDJSON stdio transport.

use std::path::Path;
use std::process::Stdio;

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::{ProcError, ProcResult};
use crate::memory_limit::MemoryLimitStrategy;

/// Environment variable a worker script MAY read to decide whether to force
/// a GC cycle after memory-heavy work. The protocol does not require the
/// child to act on it; on targets with manual memory management it is a
/// no-op.
pub const FORCE_GC_ENV: &str = "PROCPOOL_FORCE_GC";

/// A spawned child process plus its stdio handles, split for independent
/// read/write tasks.
pub struct SpawnedChild {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: BufReader<ChildStdout>,
}

/// Spawns `script` as a child process with piped stdio and the worker's
/// memory ceiling applied.
///
/// `argv` beyond the script path is unused by the protocol; the forced-GC
/// accommodation and the memory ceiling are both conveyed outside argv
/// instead (an environment variable and an OS-level rlimit, respectively).
pub fn spawn_worker(
    script: impl AsRef<Path>,
    memory_limit_mb: u32,
    memory_limit: &dyn MemoryLimitStrategy,
) -> ProcResult<SpawnedChild> {
    let script = script.as_ref();
    let mut command = Command::new(script);
    command
        .env(FORCE_GC_ENV, "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    memory_limit.apply(&mut command, memory_limit_mb);

    let mut child = command.spawn().map_err(|e| {
        ProcError::spawn_failed(script.to_string_lossy().into_owned(), e.to_string())
    })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| ProcError::process_error("spawn", "child stdin was not piped"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ProcError::process_error("spawn", "child stdout was not piped"))?;

    Ok(SpawnedChild {
        child,
        stdin,
        stdout: BufReader::new(stdout),
    })
}

/// Returns the OS pid of a spawned child, failing if it already exited.
pub fn pid_of(child: &Child) -> ProcResult<u32> {
    child
        .id()
        .ok_or_else(|| ProcError::process_error("pid", "process has already exited"))
}
