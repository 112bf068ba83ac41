//! Errors surfaced synchronously from the control surface, before a task is
//! ever handed to a worker.

use thiserror::Error;

/// Rejections returned by `submit_pool_task` before dispatch is attempted.
/// Every variant is synchronous — the caller learns about them without
/// waiting on any worker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Worker pool {0} does not exist")]
    UnknownPool(String),

    #[error("pool '{0}' has no workers configured")]
    EmptyPool(String),

    /// The dispatcher task has already shut down. Only reachable if a
    /// `Manager` outlives its own dispatcher, which should not happen under
    /// normal operation since the dispatcher only exits when every `Manager`
    /// clone (and thus every sender) has been dropped.
    #[error("worker pool manager is no longer running")]
    DispatcherGone,
}
