//! host: граница со средой, которая умеет материализовать записи и снимать снапшоты.
//!
//! Подмодули:
//! - world.rs  - LiveWorld: модель «живых» сущностей (handle, позиция, запись).
//! - memory.rs - MemoryHost: всё в памяти, счётчики операций, инъекция сбоев (тесты).
//! - file.rs   - FileHost: durable-снапшоты в JSON-файлах под <root>/snapshots.
//!
//! Хост не знает ни о таблицах, ни о кэше: он видит только строковые id снапшотов
//! и одну staging-координату, которую ему передают.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod file;
pub mod memory;
pub mod world;

pub use file::FileHost;
pub use memory::{HostStats, MemoryHost};
pub use world::LiveWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, d: BlockPos) -> BlockPos {
        BlockPos::new(self.x + d.x, self.y + d.y, self.z + d.z)
    }

    pub fn delta_from(self, origin: BlockPos) -> BlockPos {
        BlockPos::new(self.x - origin.x, self.y - origin.y, self.z - origin.z)
    }

    /// Squared euclidean distance (no sqrt needed for radius checks).
    pub fn dist_sq(self, other: BlockPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(t: (i32, i32, i32)) -> Self {
        BlockPos::new(t.0, t.1, t.2)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Inclusive axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Region {
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn point(p: BlockPos) -> Self {
        Self { min: p, max: p }
    }

    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Live material handle issued by `materialize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

/// Persistence tier of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotMode {
    /// Survives the process (world save).
    Durable,
    /// Lives only as long as the host instance.
    Memory,
}

impl SnapshotMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "durable" | "world" => Some(SnapshotMode::Durable),
            "memory" | "transient" => Some(SnapshotMode::Memory),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotMode::Durable => "durable",
            SnapshotMode::Memory => "memory",
        }
    }
}

/// Payload that can pass through the staging area.
///
/// `normalized` is what comes back after materialization; hosts store the
/// normalized form, so a read may differ from what was written.
pub trait StageRecord: Clone + Send + Sync + fmt::Debug + 'static {
    fn normalized(&self) -> Self {
        self.clone()
    }
}

impl StageRecord for String {}
impl StageRecord for Vec<u8> {}

/// Staging primitive provided by the environment.
///
/// All calls are made from the task queue worker, one task at a time.
pub trait StagingHost: Send + 'static {
    type Record: StageRecord;

    /// One-time setup that makes `pos` safe to reuse. Must be idempotent.
    fn prepare_region(&mut self, pos: BlockPos) -> Result<()>;

    fn materialize(&mut self, record: &Self::Record, pos: BlockPos) -> Result<EntityHandle>;

    /// Current (normalized) record of a live entity, None if it is gone.
    fn read_live(&self, handle: EntityHandle) -> Option<Self::Record>;

    /// Live entities within `radius` of `pos`, in spawn order.
    fn live_near(&self, pos: BlockPos, radius: u32) -> Vec<(EntityHandle, Self::Record)>;

    fn remove_live(&mut self, handle: EntityHandle) -> Result<bool>;

    /// Remove stray live material; returns how many entities were removed.
    fn clear_live_near(&mut self, pos: BlockPos, radius: u32) -> Result<usize>;

    /// Persist whatever live material occupies `region` under `id` (overwrites).
    fn snapshot_create(&mut self, id: &str, region: Region, mode: SnapshotMode) -> Result<()>;

    /// Re-materialize the snapshot at `region.min`. Ok(false) if `id` is unknown.
    fn snapshot_place(&mut self, id: &str, region: Region) -> Result<bool>;

    /// Ok(true) if a snapshot was removed.
    fn snapshot_delete(&mut self, id: &str) -> Result<bool>;

    fn snapshot_exists(&self, id: &str) -> bool;

    /// Every snapshot id in both tiers. Err if the host cannot enumerate them.
    fn snapshot_list_ids(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_normalizes_corners_and_contains() {
        let r = Region::new(BlockPos::new(2, 5, -1), BlockPos::new(0, 3, 1));
        assert_eq!(r.min, BlockPos::new(0, 3, -1));
        assert_eq!(r.max, BlockPos::new(2, 5, 1));
        assert!(r.contains(BlockPos::new(1, 4, 0)));
        assert!(!r.contains(BlockPos::new(3, 4, 0)));
        assert!(Region::point(BlockPos::new(1, 1, 1)).contains(BlockPos::new(1, 1, 1)));
    }

    #[test]
    fn snapshot_mode_parse() {
        assert_eq!(SnapshotMode::parse("World"), Some(SnapshotMode::Durable));
        assert_eq!(SnapshotMode::parse("memory"), Some(SnapshotMode::Memory));
        assert_eq!(SnapshotMode::parse("disk"), None);
    }
}
