use serde::{Deserialize, Serialize};

use crate::ids::TaskId;
use crate::task::MessageType;

/// A message sent from a child process back to the manager.
///
/// `id` always echoes the originating [`Task::id`](crate::Task::id). `ok` is
/// `true` for `InitDone`/`WorkDone` and `false` for `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub ok: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Reply {
    /// Builds an `INIT_DONE` reply carrying the child's own pid.
    pub fn init_done(id: TaskId, pid: u32) -> Self {
        Self {
            id,
            kind: MessageType::InitDone,
            ok: true,
            data: serde_json::json!({ "pid": pid }),
        }
    }

    /// Builds a `WORK_DONE` reply carrying the workload's result.
    pub fn work_done(id: TaskId, result: serde_json::Value) -> Self {
        Self {
            id,
            kind: MessageType::WorkDone,
            ok: true,
            data: result,
        }
    }

    /// Builds an `ERROR` reply carrying a human-readable failure message.
    pub fn error(id: TaskId, message: impl Into<String>) -> Self {
        Self {
            id,
            kind: MessageType::Error,
            ok: false,
            data: serde_json::Value::String(message.into()),
        }
    }

    /// A synthetic `ERROR` reply the manager fabricates on the child's
    /// behalf — abnormal exit, or a pool that disappeared before dispatch.
    /// Not produced by a child; documented separately so callers can tell
    /// the two apart if they need to (the wire shape is identical).
    pub fn synthetic_error(id: TaskId, message: impl Into<String>) -> Self {
        Self::error(id, message)
    }

    /// The error message, if this is an `Error` reply with string `data`.
    pub fn error_message(&self) -> Option<&str> {
        if self.ok {
            None
        } else {
            self.data.as_str()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn error_reply_is_not_ok() {
        let reply = Reply::error(TaskId::new(), "boom");
        assert!(!reply.ok);
        assert_eq!(reply.error_message(), Some("boom"));
    }

    #[test]
    fn work_done_echoes_input_data() {
        let id = TaskId::new();
        let reply = Reply::work_done(id, serde_json::json!({"echo": true}));
        assert_eq!(reply.id, id);
        assert!(reply.ok);
        assert_eq!(reply.data["echo"], true);
    }
}
