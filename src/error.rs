//! Typed errors surfaced to store callers.
//!
//! Host primitives and task bodies stay on `anyhow::Result`; only the
//! conditions a caller is expected to branch on get a variant here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Table name rejected at open time.
    #[error("InitializationError: table name '{name}' {reason}")]
    Initialization { name: String, reason: String },

    /// Key exceeds the length limit; nothing was queued.
    #[error("KeyLengthError: key '{key}' has {len} chars (max {max})")]
    KeyLength { key: String, len: usize, max: usize },

    /// The queued task this handle waited on failed or panicked.
    /// Details were logged by the queue when it happened.
    #[error("task #{seq} '{label}' failed, no result")]
    TaskFailed { seq: u64, label: String },

    /// Blocking wait issued from the queue worker itself.
    #[error("blocking wait from the task queue worker would deadlock")]
    WaitOnWorker,
}

pub type StoreResult<T> = Result<T, StoreError>;
