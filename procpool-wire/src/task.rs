use serde::{Deserialize, Serialize};

use crate::ids::TaskId;

/// Closed set of message kinds exchanged between parent and child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Init,
    InitDone,
    Work,
    WorkDone,
    Terminate,
    Error,
}

/// A message sent from the manager to a child process.
///
/// `pool_name` is only meaningful for `Work`; it is `None` for `Init`,
/// `Terminate`, and for one-shot workers (which skip `Init` entirely).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_name: Option<String>,
}

impl Task {
    /// Builds the `INIT` message sent immediately after spawning a worker.
    pub fn init() -> Self {
        Self {
            id: TaskId::new(),
            kind: MessageType::Init,
            data: None,
            pool_name: None,
        }
    }

    /// Builds a `WORK` message carrying `data`, bound to `pool_name` (`None`
    /// for one-shot workers).
    pub fn work(data: serde_json::Value, pool_name: Option<String>) -> Self {
        Self {
            id: TaskId::new(),
            kind: MessageType::Work,
            data: Some(data),
            pool_name,
        }
    }

    /// Builds the `TERMINATE` message. The child must exit without replying.
    pub fn terminate() -> Self {
        Self {
            id: TaskId::new(),
            kind: MessageType::Terminate,
            data: None,
            pool_name: None,
        }
    }
}
