//! TaskHandle: settable result of one queued task.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

use super::Shared;

/// Dropping the handle does not cancel the task.
pub struct TaskHandle<T> {
    seq: u64,
    label: String,
    rx: mpsc::Receiver<T>,
    shared: Arc<Shared>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(seq: u64, label: String, rx: mpsc::Receiver<T>, shared: Arc<Shared>) -> Self {
        Self {
            seq,
            label,
            rx,
            shared,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn failed(&self) -> StoreError {
        StoreError::TaskFailed {
            seq: self.seq,
            label: self.label.clone(),
        }
    }

    /// Block until the task finished.
    pub fn wait(self) -> StoreResult<T> {
        if self.shared.on_worker() {
            return Err(StoreError::WaitOnWorker);
        }
        self.rx.recv().map_err(|_| self.failed())
    }

    /// Ok(None) on timeout; the handle stays usable.
    pub fn wait_timeout(&self, timeout: Duration) -> StoreResult<Option<T>> {
        if self.shared.on_worker() {
            return Err(StoreError::WaitOnWorker);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(v) => Ok(Some(v)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(self.failed()),
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("seq", &self.seq)
            .field("label", &self.label)
            .finish()
    }
}
