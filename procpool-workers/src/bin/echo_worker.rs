//! Reference worker that echoes its input back as the result.
//!
//! Used by integration tests to exercise the round-trip property that a
//! reply's data always equals the request's data.

#[tokio::main]
async fn main() {
    procpool_workers::init_worker_logging();
    procpool_workers::run_worker_loop(|data: serde_json::Value| async move { Ok(data) }).await;
}
