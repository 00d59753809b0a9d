//! MemoryHost: staging host kept entirely in process memory.
//!
//! Both snapshot tiers live in one map (the tier is only recorded), so nothing
//! survives the host instance. Counts every primitive call in `HostStats` and
//! supports one-shot failure injection; tests use both to observe what the
//! store did (or did not do) to the staging area.

use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};

use super::world::{LiveWorld, SnapshotData};
use super::{BlockPos, EntityHandle, Region, SnapshotMode, StageRecord, StagingHost};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    pub regions_prepared: u64,
    pub materialized: u64,
    pub removed: u64,
    pub cleared: u64,
    pub snapshots_created: u64,
    pub snapshots_placed: u64,
    pub snapshots_deleted: u64,
}

/// Primitive that can be told to fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOp {
    Materialize,
    SnapshotCreate,
    SnapshotPlace,
    SnapshotDelete,
}

#[derive(Debug)]
pub struct MemoryHost<R> {
    world: LiveWorld<R>,
    prepared: HashSet<BlockPos>,
    snapshots: HashMap<String, (SnapshotMode, SnapshotData<R>)>,
    fail_once: Vec<HostOp>,
    stats: HostStats,
}

impl<R: StageRecord> Default for MemoryHost<R> {
    fn default() -> Self {
        Self {
            world: LiveWorld::new(),
            prepared: HashSet::new(),
            snapshots: HashMap::new(),
            fail_once: Vec::new(),
            stats: HostStats::default(),
        }
    }
}

impl<R: StageRecord> MemoryHost<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    /// Number of live entities anywhere in the world.
    pub fn live_count(&self) -> usize {
        self.world.len()
    }

    pub fn snapshot_mode(&self, id: &str) -> Option<SnapshotMode> {
        self.snapshots.get(id).map(|(m, _)| *m)
    }

    pub fn is_prepared(&self, pos: BlockPos) -> bool {
        self.prepared.contains(&pos)
    }

    /// Next call of `op` returns an error (consumed on use).
    pub fn fail_next(&mut self, op: HostOp) {
        self.fail_once.push(op);
    }

    /// Spawn live material directly, bypassing the store (stray entities in tests).
    pub fn spawn_stray(&mut self, record: &R, pos: BlockPos) -> EntityHandle {
        self.world.spawn(record, pos)
    }

    fn take_failure(&mut self, op: HostOp) -> Result<()> {
        if let Some(i) = self.fail_once.iter().position(|o| *o == op) {
            self.fail_once.remove(i);
            return Err(anyhow!("memory host: injected failure in {:?}", op));
        }
        Ok(())
    }
}

impl<R: StageRecord> StagingHost for MemoryHost<R> {
    type Record = R;

    fn prepare_region(&mut self, pos: BlockPos) -> Result<()> {
        if self.prepared.insert(pos) {
            self.stats.regions_prepared += 1;
        }
        Ok(())
    }

    fn materialize(&mut self, record: &R, pos: BlockPos) -> Result<EntityHandle> {
        self.take_failure(HostOp::Materialize)?;
        self.stats.materialized += 1;
        Ok(self.world.spawn(record, pos))
    }

    fn read_live(&self, handle: EntityHandle) -> Option<R> {
        self.world.get(handle)
    }

    fn live_near(&self, pos: BlockPos, radius: u32) -> Vec<(EntityHandle, R)> {
        self.world.near(pos, radius)
    }

    fn remove_live(&mut self, handle: EntityHandle) -> Result<bool> {
        let gone = self.world.remove(handle);
        if gone {
            self.stats.removed += 1;
        }
        Ok(gone)
    }

    fn clear_live_near(&mut self, pos: BlockPos, radius: u32) -> Result<usize> {
        let n = self.world.clear_near(pos, radius);
        self.stats.cleared += n as u64;
        Ok(n)
    }

    fn snapshot_create(&mut self, id: &str, region: Region, mode: SnapshotMode) -> Result<()> {
        self.take_failure(HostOp::SnapshotCreate)?;
        let data = self.world.capture(region);
        self.snapshots.insert(id.to_string(), (mode, data));
        self.stats.snapshots_created += 1;
        Ok(())
    }

    fn snapshot_place(&mut self, id: &str, region: Region) -> Result<bool> {
        self.take_failure(HostOp::SnapshotPlace)?;
        let data = match self.snapshots.get(id) {
            Some((_, d)) => d.clone(),
            None => return Ok(false),
        };
        self.world.place(&data, region.min);
        self.stats.snapshots_placed += 1;
        Ok(true)
    }

    fn snapshot_delete(&mut self, id: &str) -> Result<bool> {
        self.take_failure(HostOp::SnapshotDelete)?;
        let existed = self.snapshots.remove(id).is_some();
        if existed {
            self.stats.snapshots_deleted += 1;
        }
        Ok(existed)
    }

    fn snapshot_exists(&self, id: &str) -> bool {
        self.snapshots.contains_key(id)
    }

    fn snapshot_list_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.snapshots.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_roundtrip_through_world() -> Result<()> {
        let mut h: MemoryHost<String> = MemoryHost::new();
        let p = BlockPos::new(0, 64, 0);
        h.prepare_region(p)?;
        h.prepare_region(p)?;
        assert_eq!(h.stats().regions_prepared, 1, "prepare must be idempotent");

        let e = h.materialize(&"v".to_string(), p)?;
        h.snapshot_create("t_item:k", Region::point(p), SnapshotMode::Memory)?;
        assert!(h.remove_live(e)?);
        assert_eq!(h.live_count(), 0);

        assert!(h.snapshot_place("t_item:k", Region::point(p))?);
        let live = h.live_near(p, 0);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].1, "v");
        assert_eq!(h.snapshot_mode("t_item:k"), Some(SnapshotMode::Memory));

        assert!(!h.snapshot_place("missing", Region::point(p))?);
        assert!(h.snapshot_delete("t_item:k")?);
        assert!(!h.snapshot_delete("t_item:k")?);
        Ok(())
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut h: MemoryHost<String> = MemoryHost::new();
        h.fail_next(HostOp::Materialize);
        let p = BlockPos::new(0, 0, 0);
        assert!(h.materialize(&"a".to_string(), p).is_err());
        assert!(h.materialize(&"a".to_string(), p).is_ok());
    }
}
