//! In-process change notifications for tables.
//!
//! Scope:
//! - After a set / set_items / delete task commits, the worker publishes a
//!   ChangeEvent to subscribers of that table whose key prefix matches.
//! - Drop of SubscriptionHandle unsubscribes.
//!
//! Notes:
//! - Callbacks run synchronously on the queue worker right after the task's
//!   staging work. Keep them fast; they must not block on the queue
//!   (TaskHandle::wait / wait_idle return WaitOnWorker there).
//! - The registry is owned by StageContext (one per shared staging area).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::util::lock_recover;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    SetItems,
    Delete,
    DeleteItems,
}

/// One committed change.
/// - seq: per-context change counter, starts at 1 and only grows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub key: String,
    pub kind: ChangeKind,
    pub seq: u64,
}

pub type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync + 'static>;

struct Sub {
    table: String,
    prefix: String,
    cb: Callback,
}

#[derive(Default)]
struct SubInner {
    next_id: u64,
    subs: HashMap<u64, Sub>,
}

pub struct SubRegistry {
    inner: Mutex<SubInner>,
}

impl SubRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SubInner::default()),
        })
    }

    /// Subscribe for events of `table` whose key starts with `prefix`.
    pub fn subscribe(self: &Arc<Self>, table: &str, prefix: &str, cb: Callback) -> SubscriptionHandle {
        let mut g = lock_recover(&self.inner);
        let id = g.next_id;
        g.next_id = g.next_id.wrapping_add(1);
        g.subs.insert(
            id,
            Sub {
                table: table.to_string(),
                prefix: prefix.to_string(),
                cb,
            },
        );
        drop(g);
        SubscriptionHandle {
            id,
            reg: Arc::downgrade(self),
        }
    }

    pub fn publish(&self, ev: &ChangeEvent) {
        let callbacks: Vec<Callback> = {
            let g = lock_recover(&self.inner);
            g.subs
                .values()
                .filter(|s| s.table == ev.table && ev.key.starts_with(&s.prefix))
                .map(|s| s.cb.clone())
                .collect()
        };
        // Execute outside the lock
        for cb in callbacks {
            cb(ev);
        }
    }

    pub fn len(&self) -> usize {
        lock_recover(&self.inner).subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unsubscribe(&self, id: u64) {
        lock_recover(&self.inner).subs.remove(&id);
    }
}

/// RAII handle: unsubscribes on drop.
pub struct SubscriptionHandle {
    id: u64,
    reg: Weak<SubRegistry>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(reg) = self.reg.upgrade() {
            reg.unsubscribe(self.id);
        }
    }
}

pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&ChangeEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
