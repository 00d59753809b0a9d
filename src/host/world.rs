//! LiveWorld: in-process model of live material shared by the bundled hosts.
//!
//! Entities live at integer positions and are kept in spawn order
//! (BTreeMap by handle id), so region/radius queries are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BlockPos, EntityHandle, Region, StageRecord};

#[derive(Clone, Debug)]
struct LiveEntity<R> {
    pos: BlockPos,
    record: R,
}

/// Contents of one snapshot: entities with offsets relative to `region.min`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SnapshotData<R> {
    pub region: Region,
    pub entities: Vec<SnapEntity<R>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SnapEntity<R> {
    pub offset: BlockPos,
    pub record: R,
}

#[derive(Debug)]
pub struct LiveWorld<R> {
    next_id: u64,
    entities: BTreeMap<u64, LiveEntity<R>>,
}

impl<R> Default for LiveWorld<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entities: BTreeMap::new(),
        }
    }
}

impl<R: StageRecord> LiveWorld<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the normalized form of `record` at `pos`.
    pub fn spawn(&mut self, record: &R, pos: BlockPos) -> EntityHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.entities.insert(
            id,
            LiveEntity {
                pos,
                record: record.normalized(),
            },
        );
        EntityHandle(id)
    }

    pub fn get(&self, h: EntityHandle) -> Option<R> {
        self.entities.get(&h.0).map(|e| e.record.clone())
    }

    pub fn remove(&mut self, h: EntityHandle) -> bool {
        self.entities.remove(&h.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn near(&self, pos: BlockPos, radius: u32) -> Vec<(EntityHandle, R)> {
        let r2 = (radius as i64) * (radius as i64);
        self.entities
            .iter()
            .filter(|(_, e)| e.pos.dist_sq(pos) <= r2)
            .map(|(id, e)| (EntityHandle(*id), e.record.clone()))
            .collect()
    }

    pub fn clear_near(&mut self, pos: BlockPos, radius: u32) -> usize {
        let r2 = (radius as i64) * (radius as i64);
        let before = self.entities.len();
        self.entities.retain(|_, e| e.pos.dist_sq(pos) > r2);
        before - self.entities.len()
    }

    /// Copy everything inside `region` (live material stays in place).
    pub fn capture(&self, region: Region) -> SnapshotData<R> {
        let entities = self
            .entities
            .values()
            .filter(|e| region.contains(e.pos))
            .map(|e| SnapEntity {
                offset: e.pos.delta_from(region.min),
                record: e.record.clone(),
            })
            .collect();
        SnapshotData { region, entities }
    }

    /// Re-spawn snapshot contents relative to `origin`; returns new handles.
    pub fn place(&mut self, data: &SnapshotData<R>, origin: BlockPos) -> Vec<EntityHandle> {
        data.entities
            .iter()
            .map(|se| self.spawn(&se.record, origin.offset(se.offset)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_near_clear() {
        let mut w: LiveWorld<String> = LiveWorld::new();
        let o = BlockPos::new(0, 64, 0);
        let a = w.spawn(&"a".to_string(), o);
        let _b = w.spawn(&"b".to_string(), BlockPos::new(1, 64, 0));
        let _far = w.spawn(&"far".to_string(), BlockPos::new(50, 64, 0));

        let near: Vec<String> = w.near(o, 2).into_iter().map(|(_, r)| r).collect();
        assert_eq!(near, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(w.get(a).as_deref(), Some("a"));

        assert_eq!(w.clear_near(o, 2), 2);
        assert_eq!(w.len(), 1, "far entity must survive");
        assert!(w.get(a).is_none());
    }

    #[test]
    fn capture_and_place_keep_offsets() {
        let mut w: LiveWorld<String> = LiveWorld::new();
        let o = BlockPos::new(10, 10, 10);
        w.spawn(&"x".to_string(), o);
        let data = w.capture(Region::point(o));
        assert_eq!(data.entities.len(), 1);
        assert_eq!(data.entities[0].offset, BlockPos::new(0, 0, 0));

        w.clear_near(o, 0);
        assert!(w.is_empty());

        let hs = w.place(&data, BlockPos::new(0, 0, 0));
        assert_eq!(hs.len(), 1);
        assert_eq!(w.near(BlockPos::new(0, 0, 0), 0).len(), 1);
    }
}
