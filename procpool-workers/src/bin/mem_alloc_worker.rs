//! Reference worker that allocates a caller-specified amount of memory and
//! holds it for the task's duration — used to exercise the manager's
//! memory-limit enforcement (`RLIMIT_AS` on Unix) and crash-restart path:
//! a task that requests more than the worker's configured ceiling should
//! get the process killed out from under it rather than a clean reply.
//!
//! `data` is `{"size_mb": <u64>, "hold_ms": <u64>}` (defaults: 16 MB, 0ms).
//! After releasing the buffer, honors [`procpool_workers`]'s forced-GC
//! convention by checking `PROCPOOL_FORCE_GC`; Rust has no GC, so this is a
//! documented no-op read of the env var rather than an actual collection.

async fn allocate(data: serde_json::Value) -> Result<serde_json::Value, String> {
    let size_mb = data
        .get("size_mb")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(16);
    let hold_ms = data
        .get("hold_ms")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);

    let bytes = (size_mb as usize).saturating_mul(1024 * 1024);
    let buffer = tokio::task::spawn_blocking(move || vec![0u8; bytes])
        .await
        .map_err(|err| format!("allocation task panicked: {err}"))?;

    if hold_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(hold_ms)).await;
    }

    let checksum: u64 = buffer.iter().take(4096).map(|b| *b as u64).sum();
    drop(buffer);

    // The protocol only requires that a child MAY honor this; there is
    // nothing to force-collect in a Rust binary, so this just acknowledges
    // the convention for parity with runtimes that do have a GC.
    let _ = std::env::var(procpool_proc::FORCE_GC_ENV);

    Ok(serde_json::json!({ "size_mb": size_mb, "checksum": checksum }))
}

#[tokio::main]
async fn main() {
    procpool_workers::init_worker_logging();
    procpool_workers::run_worker_loop(allocate).await;
}
