use thiserror::Error;

/// Result type alias for process-primitive operations.
pub type ProcResult<T> = Result<T, ProcError>;

/// Structured errors for spawning, signalling, and probing child processes.
#[derive(Error, Debug)]
pub enum ProcError {
    #[error("failed to spawn '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("process operation failed: {operation}: {reason}")]
    ProcessError { operation: String, reason: String },

    #[error("transport closed for pid {pid}")]
    TransportClosed { pid: u32 },
}

impl ProcError {
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn process_error(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProcessError {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
