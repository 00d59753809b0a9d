//! Lightweight global metrics for StageDB.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Task queue
//! - Record cache
//! - Staging cycles (save/restore) и удаления снапшотов
//! - Load-on-open

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Task queue -----
static TASKS_ENQUEUED: AtomicU64 = AtomicU64::new(0);
static TASKS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static TASKS_FAILED: AtomicU64 = AtomicU64::new(0);

// ----- Cache -----
static CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static CACHE_MISSES: AtomicU64 = AtomicU64::new(0);

// ----- Staging -----
static STAGE_SAVES: AtomicU64 = AtomicU64::new(0);
static STAGE_RESTORES: AtomicU64 = AtomicU64::new(0);
static SNAPSHOTS_DELETED: AtomicU64 = AtomicU64::new(0);

// ----- Load-on-open -----
static RECORDS_LOADED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub tasks_enqueued: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,

    pub cache_hits: u64,
    pub cache_misses: u64,

    pub stage_saves: u64,
    pub stage_restores: u64,
    pub snapshots_deleted: u64,

    pub records_loaded: u64,
}

impl MetricsSnapshot {
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

// ----- Recorders (queue) -----
pub fn record_task_enqueued() {
    TASKS_ENQUEUED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_task_completed() {
    TASKS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_task_failed() {
    TASKS_FAILED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (cache) -----
pub fn record_cache_hit() {
    CACHE_HITS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_cache_miss() {
    CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (staging) -----
pub fn record_stage_save() {
    STAGE_SAVES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_stage_restore() {
    STAGE_RESTORES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_snapshot_deleted() {
    SNAPSHOTS_DELETED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_records_loaded(n: usize) {
    RECORDS_LOADED.fetch_add(n as u64, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        tasks_enqueued: TASKS_ENQUEUED.load(Ordering::Relaxed),
        tasks_completed: TASKS_COMPLETED.load(Ordering::Relaxed),
        tasks_failed: TASKS_FAILED.load(Ordering::Relaxed),

        cache_hits: CACHE_HITS.load(Ordering::Relaxed),
        cache_misses: CACHE_MISSES.load(Ordering::Relaxed),

        stage_saves: STAGE_SAVES.load(Ordering::Relaxed),
        stage_restores: STAGE_RESTORES.load(Ordering::Relaxed),
        snapshots_deleted: SNAPSHOTS_DELETED.load(Ordering::Relaxed),

        records_loaded: RECORDS_LOADED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    TASKS_ENQUEUED.store(0, Ordering::Relaxed);
    TASKS_COMPLETED.store(0, Ordering::Relaxed);
    TASKS_FAILED.store(0, Ordering::Relaxed);

    CACHE_HITS.store(0, Ordering::Relaxed);
    CACHE_MISSES.store(0, Ordering::Relaxed);

    STAGE_SAVES.store(0, Ordering::Relaxed);
    STAGE_RESTORES.store(0, Ordering::Relaxed);
    SNAPSHOTS_DELETED.store(0, Ordering::Relaxed);

    RECORDS_LOADED.store(0, Ordering::Relaxed);
}
