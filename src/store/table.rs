//! Table: one key namespace on a shared StageContext.
//!
//! Что внутри:
//! - open: валидация имени, одна задача «zone init + load» (прогрев кэша из снапшотов);
//! - set/set_items: задача evict snapshot -> evict cache -> stage -> snapshot -> capture -> unstage;
//! - get/has/get_items: только кэш, синхронно;
//! - get_async/has_async/get_all_keys/...: через очередь, как и всё, что трогает хост;
//! - delete: кэш чистится сразу и ещё раз внутри задачи;
//! - clear: кэш чистится внутри задачи, по мере удаления снапшотов.
//!
//! Queued operations return a TaskHandle; ignoring it is fine (fire-and-forget).
//! Validation errors are returned before anything is queued.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::StoreResult;
use crate::host::{SnapshotMode, StagingHost};
use crate::metrics::{record_records_loaded, record_snapshot_deleted};
use crate::queue::TaskHandle;
use crate::subs::{callback, ChangeEvent, ChangeKind, SubscriptionHandle};
use crate::util::lock_recover;

use super::context::{StageContext, StoreShared};
use super::id::{validate_key, validate_table_name, CompositeId, SlotKind};
use super::stage::{ensure_zone, evict_snapshot, restore_cycle, save_cycle};

pub struct Table<H: StagingHost> {
    name: String,
    mode: SnapshotMode,
    ctx: Arc<StageContext<H>>,
}

impl<H: StagingHost> Clone for Table<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            mode: self.mode,
            ctx: self.ctx.clone(),
        }
    }
}

impl<H: StagingHost> Table<H> {
    /// Open table `name`; snapshots are written with `mode`.
    ///
    /// Returns as soon as the load task is queued. Operations issued
    /// afterwards are queued behind it, so they observe the loaded state.
    pub fn open(ctx: &Arc<StageContext<H>>, name: &str, mode: SnapshotMode) -> StoreResult<Self> {
        validate_table_name(name)?;
        let table = Self {
            name: name.to_string(),
            mode,
            ctx: ctx.clone(),
        };

        let shared = ctx.shared();
        let tname = table.name.clone();
        ctx.queue().enqueue(format!("open {}", tname), move || {
            let mut host = lock_recover(&shared.host);
            ensure_zone(&shared, &mut *host)?;
            if !shared.cfg.load_on_open {
                debug!("table '{}': load_on_open disabled", tname);
                return Ok(());
            }
            let loaded = load_table(&shared, &mut *host, &tname)?;
            record_records_loaded(loaded);
            info!("table '{}': loaded {} key(s) into cache", tname, loaded);
            Ok(())
        });
        Ok(table)
    }

    /// Open with the context's configured snapshot mode.
    pub fn open_default(ctx: &Arc<StageContext<H>>, name: &str) -> StoreResult<Self> {
        let mode = ctx.config().snapshot_mode;
        Self::open(ctx, name, mode)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> SnapshotMode {
        self.mode
    }

    pub fn context(&self) -> &Arc<StageContext<H>> {
        &self.ctx
    }

    fn id(&self, kind: SlotKind, key: &str) -> CompositeId {
        CompositeId::new(&self.name, kind, key)
    }

    // ----------------- single record -----------------

    /// Replace the record under `key`. The cached value becomes whatever the
    /// staging area hands back, which may be a normalized form of `record`.
    pub fn set(&self, key: &str, record: H::Record) -> StoreResult<TaskHandle<()>> {
        validate_key(key)?;
        Ok(self.enqueue_save(self.id(SlotKind::One, key), vec![record]))
    }

    /// Cache-only lookup.
    pub fn get(&self, key: &str) -> Option<H::Record> {
        let id = self.id(SlotKind::One, key);
        lock_recover(&self.ctx.shared().cache).get_one(&id)
    }

    /// Read the record back from its snapshot. A hit refreshes the cache,
    /// a missing snapshot evicts any cached value.
    pub fn get_async(&self, key: &str) -> TaskHandle<Option<H::Record>> {
        let id = self.id(SlotKind::One, key);
        let shared = self.ctx.shared();
        self.ctx
            .queue()
            .enqueue_with_result(format!("get_async {}", id), move || {
                let mut host = lock_recover(&shared.host);
                ensure_zone(&shared, &mut *host)?;
                let restored = restore_cycle(&mut *host, &shared.cfg, &id.host_id())?;
                drop(host);
                let rec = restored.and_then(|v| v.into_iter().next());
                let mut cache = lock_recover(&shared.cache);
                match &rec {
                    Some(r) => cache.put_one(id, r.clone()),
                    None => {
                        cache.remove(&id);
                    }
                }
                Ok(rec)
            })
    }

    /// `get` followed by `delete`; the delete is queued whether or not the key was cached.
    pub fn get_once(&self, key: &str) -> Option<H::Record> {
        let r = self.get(key);
        let _ = self.delete(key);
        r
    }

    /// Remove snapshot and cache entry. The handle yields whether a snapshot existed.
    pub fn delete(&self, key: &str) -> TaskHandle<bool> {
        self.enqueue_delete(self.id(SlotKind::One, key), ChangeKind::Delete)
    }

    /// Cache-only presence check.
    pub fn has(&self, key: &str) -> bool {
        let id = self.id(SlotKind::One, key);
        lock_recover(&self.ctx.shared().cache).contains(&id)
    }

    /// Snapshot presence check.
    pub fn has_async(&self, key: &str) -> TaskHandle<bool> {
        let id = self.id(SlotKind::One, key);
        let shared = self.ctx.shared();
        self.ctx
            .queue()
            .enqueue_with_result(format!("has_async {}", id), move || {
                let host = lock_recover(&shared.host);
                Ok(host.snapshot_exists(&id.host_id()))
            })
    }

    /// Keys with a snapshot in this table, in host enumeration order.
    pub fn get_all_keys(&self) -> TaskHandle<Vec<String>> {
        let shared = self.ctx.shared();
        let tname = self.name.clone();
        self.ctx
            .queue()
            .enqueue_with_result(format!("keys {}", tname), move || {
                let host = lock_recover(&shared.host);
                list_keys(&*host, &tname, SlotKind::One)
            })
    }

    /// `get` over `get_all_keys`. Blocks until the key listing ran.
    pub fn get_all(&self) -> StoreResult<Vec<Option<H::Record>>> {
        let keys = self.get_all_keys().wait()?;
        Ok(keys.iter().map(|k| self.get(k)).collect())
    }

    /// `get_async` over every key, as a single task.
    pub fn get_all_async(&self) -> TaskHandle<Vec<Option<H::Record>>> {
        let shared = self.ctx.shared();
        let tname = self.name.clone();
        self.ctx
            .queue()
            .enqueue_with_result(format!("get_all_async {}", tname), move || {
                let mut host = lock_recover(&shared.host);
                ensure_zone(&shared, &mut *host)?;
                let keys = list_keys(&*host, &tname, SlotKind::One)?;
                let mut out = Vec::with_capacity(keys.len());
                for k in keys {
                    let id = CompositeId::new(&tname, SlotKind::One, &k);
                    // сбой одного ключа не валит весь список: слот = None, кэш не трогаем
                    let rec = match restore_cycle(&mut *host, &shared.cfg, &id.host_id()) {
                        Ok(v) => v.and_then(|v| v.into_iter().next()),
                        Err(e) => {
                            warn!("table '{}': get_all_async skip '{}': {:#}", tname, id, e);
                            out.push(None);
                            continue;
                        }
                    };
                    let mut cache = lock_recover(&shared.cache);
                    match &rec {
                        Some(r) => cache.put_one(id, r.clone()),
                        None => {
                            cache.remove(&id);
                        }
                    }
                    out.push(rec);
                }
                Ok(out)
            })
    }

    /// Delete every key of this table (both single and multi-record).
    /// The handle yields true once everything listed was removed. A cache
    /// entry is dropped only after its snapshot is gone, so on failure the
    /// keys that survived on the host stay readable.
    pub fn clear(&self) -> TaskHandle<bool> {
        let shared = self.ctx.shared();
        let tname = self.name.clone();
        self.ctx
            .queue()
            .enqueue_with_result(format!("clear {}", tname), move || {
                let mut host = lock_recover(&shared.host);
                let mut removed = 0usize;
                for kind in [SlotKind::One, SlotKind::Many] {
                    for k in list_keys(&*host, &tname, kind)? {
                        let id = CompositeId::new(&tname, kind, &k);
                        if host.snapshot_delete(&id.host_id())? {
                            record_snapshot_deleted();
                            removed += 1;
                        }
                        lock_recover(&shared.cache).remove(&id);
                    }
                }
                drop(host);
                // ключи без снапшота (кэш пережил внешний delete) тоже уходят
                lock_recover(&shared.cache).remove_table(&tname);
                debug!("table '{}': cleared {} snapshot(s)", tname, removed);
                Ok(true)
            })
    }

    // ----------------- batches -----------------

    /// `set` per entry; one result per entry, in input order.
    pub fn set_many<I, K>(&self, entries: I) -> Vec<StoreResult<TaskHandle<()>>>
    where
        I: IntoIterator<Item = (K, H::Record)>,
        K: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|(k, r)| self.set(k.as_ref(), r))
            .collect()
    }

    pub fn get_many<I, K>(&self, keys: I) -> Vec<Option<H::Record>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter().map(|k| self.get(k.as_ref())).collect()
    }

    pub fn delete_many<I, K>(&self, keys: I) -> Vec<TaskHandle<bool>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter().map(|k| self.delete(k.as_ref())).collect()
    }

    // ----------------- multi-record -----------------

    /// Store an ordered collection of records under one key.
    pub fn set_items(&self, key: &str, records: Vec<H::Record>) -> StoreResult<TaskHandle<()>> {
        validate_key(key)?;
        Ok(self.enqueue_save(self.id(SlotKind::Many, key), records))
    }

    pub fn get_items(&self, key: &str) -> Option<Vec<H::Record>> {
        let id = self.id(SlotKind::Many, key);
        lock_recover(&self.ctx.shared().cache).get_many(&id)
    }

    pub fn get_items_async(&self, key: &str) -> TaskHandle<Option<Vec<H::Record>>> {
        let id = self.id(SlotKind::Many, key);
        let shared = self.ctx.shared();
        self.ctx
            .queue()
            .enqueue_with_result(format!("get_items_async {}", id), move || {
                let mut host = lock_recover(&shared.host);
                ensure_zone(&shared, &mut *host)?;
                let restored = restore_cycle(&mut *host, &shared.cfg, &id.host_id())?;
                drop(host);
                let mut cache = lock_recover(&shared.cache);
                match &restored {
                    Some(v) => cache.put_many(id, v.clone()),
                    None => {
                        cache.remove(&id);
                    }
                }
                Ok(restored)
            })
    }

    pub fn has_items(&self, key: &str) -> bool {
        let id = self.id(SlotKind::Many, key);
        lock_recover(&self.ctx.shared().cache).contains(&id)
    }

    pub fn delete_items(&self, key: &str) -> TaskHandle<bool> {
        self.enqueue_delete(self.id(SlotKind::Many, key), ChangeKind::DeleteItems)
    }

    // ----------------- notifications -----------------

    /// Call `f` after every committed change in this table whose key starts with `prefix`.
    pub fn subscribe_prefix<F>(&self, prefix: &str, f: F) -> SubscriptionHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.ctx
            .shared()
            .subs
            .subscribe(&self.name, prefix, callback(f))
    }

    // ----------------- task builders -----------------

    fn enqueue_save(&self, id: CompositeId, records: Vec<H::Record>) -> TaskHandle<()> {
        let shared = self.ctx.shared();
        let mode = self.mode;
        let label = match id.kind {
            SlotKind::One => format!("set {}", id),
            SlotKind::Many => format!("set_items {}", id),
        };
        self.ctx.queue().enqueue_with_result(label, move || {
            let mut host = lock_recover(&shared.host);
            ensure_zone(&shared, &mut *host)?;
            // старый снапшот удаляем до кэша: при сбое оба остаются согласованы
            evict_snapshot(&mut *host, &id.host_id())?;
            lock_recover(&shared.cache).remove(&id);
            let captured = save_cycle(&mut *host, &shared.cfg, &id.host_id(), &records, mode)?;
            drop(host);

            let kind = match id.kind {
                SlotKind::One => {
                    let rec = captured
                        .into_iter()
                        .next()
                        .ok_or_else(|| anyhow!("set {}: staging area returned nothing", id))?;
                    lock_recover(&shared.cache).put_one(id.clone(), rec);
                    ChangeKind::Set
                }
                SlotKind::Many => {
                    lock_recover(&shared.cache).put_many(id.clone(), captured);
                    ChangeKind::SetItems
                }
            };
            shared.notify(&id, kind);
            Ok(())
        })
    }

    fn enqueue_delete(&self, id: CompositeId, kind: ChangeKind) -> TaskHandle<bool> {
        let shared = self.ctx.shared();
        // Вытесняем сразу: последующий get() не должен видеть удаляемое значение.
        lock_recover(&shared.cache).remove(&id);
        self.ctx
            .queue()
            .enqueue_with_result(format!("delete {}", id), move || {
                let mut host = lock_recover(&shared.host);
                let existed = host.snapshot_delete(&id.host_id())?;
                drop(host);
                // ещё раз: set, поставленный до delete, мог успеть заполнить кэш
                lock_recover(&shared.cache).remove(&id);
                if existed {
                    record_snapshot_deleted();
                    shared.notify(&id, kind);
                }
                Ok(existed)
            })
    }
}

/// Keys of `table`/`kind` that have a snapshot, prefix stripped.
fn list_keys<H: StagingHost>(host: &H, table: &str, kind: SlotKind) -> Result<Vec<String>> {
    let keys = host
        .snapshot_list_ids()?
        .into_iter()
        .filter_map(|hid| CompositeId::from_host_id(table, kind, &hid).map(|id| id.key))
        .collect();
    Ok(keys)
}

/// Restore every snapshot of `table` into the cache; returns the number of keys loaded.
/// A snapshot that fails to restore is logged and skipped; a failed listing fails the load.
fn load_table<H: StagingHost>(shared: &StoreShared<H>, host: &mut H, table: &str) -> Result<usize> {
    let mut loaded = 0usize;
    for kind in [SlotKind::One, SlotKind::Many] {
        for key in list_keys(&*host, table, kind)? {
            let id = CompositeId::new(table, kind, &key);
            let records = match restore_cycle(host, &shared.cfg, &id.host_id()) {
                Ok(Some(v)) => v,
                Ok(None) => continue,
                Err(e) => {
                    warn!("table '{}': skip '{}' on load: {:#}", table, id, e);
                    continue;
                }
            };
            let mut cache = lock_recover(&shared.cache);
            match kind {
                SlotKind::One => match records.into_iter().next() {
                    Some(r) => {
                        cache.put_one(id, r);
                        loaded += 1;
                    }
                    None => warn!("table '{}': snapshot '{}' is empty, not cached", table, id),
                },
                SlotKind::Many => {
                    cache.put_many(id, records);
                    loaded += 1;
                }
            }
        }
    }
    Ok(loaded)
}
