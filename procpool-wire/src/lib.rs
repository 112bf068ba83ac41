//! Wire protocol between a worker pool manager and its child worker processes.
//!
//! Messages cross the parent/child boundary as newline-delimited JSON (NDJSON):
//! one [`Task`] or [`Reply`] object per line, `\n`-terminated. This crate only
//! defines the schema and the small set of framing helpers; process spawning,
//! pool bookkeeping, and dispatch live in `procpool`.
//!
//! # Protocol summary
//!
//! | Incoming `type` | Child behavior |
//! |---|---|
//! | `Init` | one-time setup, reply `InitDone { pid }` |
//! | `Work` | run the workload, reply `WorkDone { result }` or `Error { message }` |
//! | `Terminate` | exit(0) immediately, no reply |
//! | anything else | log to stderr, ignore |
//!
//! A child must never reply more than once for the same [`TaskId`].

mod framing;
mod ids;
mod reply;
mod task;

pub use framing::{read_line, write_line, FramingError};
pub use ids::TaskId;
pub use reply::Reply;
pub use task::{MessageType, Task};
