//! Reference worker that burns CPU for a caller-specified duration.
//!
//! `data` is `{"duration_ms": <u64>}` (default 100ms if absent/malformed).
//! The burn runs on a blocking thread so it doesn't starve this process's
//! async runtime from servicing other concurrent `WORK` messages.

async fn burn(data: serde_json::Value) -> Result<serde_json::Value, String> {
    let duration_ms = data
        .get("duration_ms")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(100);

    let iterations = tokio::task::spawn_blocking(move || {
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(duration_ms);
        let mut counter: u64 = 0;
        while std::time::Instant::now() < deadline {
            counter = counter.wrapping_add(counter.wrapping_mul(2654435761).wrapping_add(1));
        }
        counter
    })
    .await
    .map_err(|err| format!("burn task panicked: {err}"))?;

    Ok(serde_json::json!({ "duration_ms": duration_ms, "checksum": iterations }))
}

#[tokio::main]
async fn main() {
    procpool_workers::init_worker_logging();
    procpool_workers::run_worker_loop(burn).await;
}
