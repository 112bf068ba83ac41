//! A small harness implementing the child side of the `procpool` protocol,
//! shared by every binary in this crate.
//!
//! Each binary only supplies a `Workload`: an async function from the
//! opaque `data` of a `WORK` message to either a result value or an error
//! message. Everything else — the `INIT`/`TERMINATE` handshake, NDJSON
//! framing, concurrent in-flight tasks, and converting a panicking workload
//! into an `ERROR` reply instead of taking the process down — is handled
//! here.
//!
//! Workloads run concurrently: the read loop never blocks on a `WORK`
//! reply, since the manager may have multiple tasks in flight on the same
//! worker (`running_tasks` is not capped at one). Each `WORK` message is
//! handed to its own `tokio::task`; replies are serialized onto stdout
//! through a shared lock so concurrent writers never interleave a line.

use std::future::Future;
use std::sync::Arc;

use procpool_wire::{MessageType, Reply, Task};
use tokio::io::{AsyncWrite, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// A child workload: takes the opaque `data` of a `WORK` task, returns the
/// result payload or a human-readable error message.
pub trait Workload: Clone + Send + Sync + 'static {
    type Future: Future<Output = Result<serde_json::Value, String>> + Send + 'static;

    fn call(&self, data: serde_json::Value) -> Self::Future;
}

impl<F, Fut> Workload for F
where
    F: Fn(serde_json::Value) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, String>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, data: serde_json::Value) -> Self::Future {
        (self)(data)
    }
}

/// Runs the child-side protocol loop over stdin/stdout until `TERMINATE` is
/// received or stdin closes. Never returns normally on `TERMINATE` — it
/// calls `std::process::exit(0)` directly, per the protocol's "exit
/// immediately, without replying" rule.
pub async fn run_worker_loop<W: Workload>(workload: W) {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));

    loop {
        let task: Task = match procpool_wire::read_line(&mut reader).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                debug!("stdin closed, worker exiting");
                break;
            }
            Err(err) => {
                warn!(%err, "malformed message from manager, ignoring");
                continue;
            }
        };

        match task.kind {
            MessageType::Init => {
                let pid = std::process::id();
                let reply = Reply::init_done(task.id, pid);
                write_reply(&stdout, reply).await;
            }
            MessageType::Work => {
                let workload = workload.clone();
                let stdout = Arc::clone(&stdout);
                let data = task.data.unwrap_or(serde_json::Value::Null);
                tokio::spawn(async move {
                    let reply = run_one_task(task.id, &workload, data).await;
                    write_reply(&stdout, reply).await;
                });
            }
            MessageType::Terminate => {
                std::process::exit(0);
            }
            other => {
                warn!(?other, "unexpected message type from manager, ignoring");
            }
        }
    }
}

async fn run_one_task<W: Workload>(
    id: procpool_wire::TaskId,
    workload: &W,
    data: serde_json::Value,
) -> Reply {
    match tokio::spawn(workload.call(data)).await {
        Ok(Ok(result)) => Reply::work_done(id, result),
        Ok(Err(message)) => Reply::error(id, message),
        Err(join_err) => {
            error!(%join_err, "workload panicked");
            Reply::error(id, format!("workload panicked: {join_err}"))
        }
    }
}

async fn write_reply<W: AsyncWrite + Unpin>(stdout: &Arc<Mutex<W>>, reply: Reply) {
    let mut guard = stdout.lock().await;
    if let Err(err) = procpool_wire::write_line(&mut *guard, &reply).await {
        error!(%err, "failed to write reply to stdout");
    }
}

/// Installs a `tracing` subscriber that writes to stderr (stdout is the
/// protocol channel), reading `RUST_LOG` the same way the rest of the
/// workspace does.
pub fn init_worker_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
