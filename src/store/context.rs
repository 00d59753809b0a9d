//! StageContext: the shared staging resource.
//!
//! One context owns the host, the record cache and the task queue. Every table
//! opened on it serializes its staging work through that one queue, so two
//! tables never use the staging area at the same time. Tables only differ by
//! identifier prefix.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::StageConfig;
use crate::error::StoreResult;
use crate::host::StagingHost;
use crate::queue::{QueueStats, TaskQueue};
use crate::subs::{ChangeEvent, ChangeKind, SubRegistry};
use crate::util::lock_recover;

use super::cache::{CacheStats, RecordCache};
use super::id::CompositeId;

/// State reachable from queued tasks.
/// Lock order: host, then cache.
pub(crate) struct StoreShared<H: StagingHost> {
    pub(crate) cfg: StageConfig,
    pub(crate) host: Mutex<H>,
    pub(crate) cache: Mutex<RecordCache<H::Record>>,
    pub(crate) zone_ready: AtomicBool,
    pub(crate) subs: Arc<SubRegistry>,
    change_seq: AtomicU64,
}

impl<H: StagingHost> StoreShared<H> {
    pub(crate) fn notify(&self, id: &CompositeId, kind: ChangeKind) {
        if self.subs.is_empty() {
            return;
        }
        let seq = self.change_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.subs.publish(&ChangeEvent {
            table: id.table.clone(),
            key: id.key.clone(),
            kind,
            seq,
        });
    }
}

pub struct StageContext<H: StagingHost> {
    shared: Arc<StoreShared<H>>,
    queue: TaskQueue,
}

impl<H: StagingHost> StageContext<H> {
    /// Context with configuration from the environment.
    pub fn new(host: H) -> Result<Arc<Self>> {
        Self::with_config(host, StageConfig::from_env())
    }

    pub fn with_config(host: H, cfg: StageConfig) -> Result<Arc<Self>> {
        let queue = TaskQueue::new("stage")?;
        Ok(Arc::new(Self {
            shared: Arc::new(StoreShared {
                cfg,
                host: Mutex::new(host),
                cache: Mutex::new(RecordCache::new()),
                zone_ready: AtomicBool::new(false),
                subs: SubRegistry::new(),
                change_seq: AtomicU64::new(0),
            }),
            queue,
        }))
    }

    pub fn config(&self) -> &StageConfig {
        &self.shared.cfg
    }

    /// Block until every queued task (of every table) has run.
    pub fn wait_idle(&self) -> StoreResult<()> {
        self.queue.wait_idle()
    }

    pub fn wait_idle_timeout(&self, timeout: Duration) -> StoreResult<bool> {
        self.queue.wait_idle_timeout(timeout)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        lock_recover(&self.shared.cache).stats()
    }

    /// True once the staging region has been prepared.
    pub fn zone_ready(&self) -> bool {
        self.shared.zone_ready.load(Ordering::Acquire)
    }

    /// Direct access to the host for inspection.
    /// Blocks while a task is staging; must not be called from inside a task.
    pub fn with_host<T>(&self, f: impl FnOnce(&mut H) -> T) -> T {
        let mut g = lock_recover(&self.shared.host);
        f(&mut g)
    }

    pub(crate) fn shared(&self) -> Arc<StoreShared<H>> {
        self.shared.clone()
    }

    pub(crate) fn queue(&self) -> &TaskQueue {
        &self.queue
    }
}
