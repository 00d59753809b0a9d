//! FileHost: staging host with durable snapshots on disk.
//!
//! Layout under <root>:
//! - LOCK                      - exclusive fs2 lock while the host is open.
//! - zone.json                 - prepared staging positions (prepare_region is idempotent across runs).
//! - snapshots/<b64>.snap.json - one durable snapshot per file; <b64> = URL-safe base64 (no pad) of the id.
//!
//! Snapshot file:
//! {"version":1,"id":"t1_item:a","mode":"Durable","crc32":<u32>,"data":{...}}
//! crc32 covers the JSON serialization of "data" and is verified on every read.
//!
//! Замечания:
//! - Memory-снапшоты живут только в этом экземпляре (HashMap), на диск не попадают.
//! - Живые сущности (LiveWorld) тоже только в памяти: после выхода процесса staging-зона пуста.
//! - Запись атомарна через tmp+rename.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use crc32fast::Hasher as Crc32;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::consts::{SNAPSHOT_DIR, SNAPSHOT_EXT, SNAPSHOT_FILE_VERSION, ZONE_FILE};
use crate::lock::{try_lock_root, RootLock};

use super::world::{LiveWorld, SnapshotData};
use super::{BlockPos, EntityHandle, Region, SnapshotMode, StageRecord, StagingHost};

#[derive(Serialize, Deserialize)]
struct SnapFile<D> {
    version: u32,
    id: String,
    mode: SnapshotMode,
    crc32: u32,
    data: D,
}

#[derive(Serialize, Deserialize, Default)]
struct ZoneFile {
    prepared: Vec<BlockPos>,
}

pub struct FileHost<R> {
    root: PathBuf,
    snap_dir: PathBuf,
    world: LiveWorld<R>,
    memory: HashMap<String, SnapshotData<R>>,
    prepared: BTreeSet<BlockPos>,
    _lock: RootLock,
}

fn crc_of(bytes: &[u8]) -> u32 {
    let mut h = Crc32::new();
    h.update(bytes);
    h.finalize()
}

fn file_name_for(id: &str) -> String {
    format!("{}.{}", URL_SAFE_NO_PAD.encode(id.as_bytes()), SNAPSHOT_EXT)
}

fn id_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(SNAPSHOT_EXT)?.strip_suffix('.')?;
    let raw = URL_SAFE_NO_PAD.decode(stem).ok()?;
    String::from_utf8(raw).ok()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp)
        .with_context(|| format!("open {}", tmp.display()))?;
    f.write_all(bytes)?;
    let _ = f.sync_all();
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

impl<R> FileHost<R>
where
    R: StageRecord + Serialize + DeserializeOwned,
{
    /// Open (or create) a host rooted at `root`. Fails if another owner holds the root lock.
    pub fn open(root: &Path) -> Result<Self> {
        let snap_dir = root.join(SNAPSHOT_DIR);
        fs::create_dir_all(&snap_dir)
            .with_context(|| format!("create snapshot dir {}", snap_dir.display()))?;
        let lock = try_lock_root(root)?;

        let zone_path = root.join(ZONE_FILE);
        let prepared = if zone_path.exists() {
            let bytes = fs::read(&zone_path).with_context(|| format!("read {}", zone_path.display()))?;
            let z: ZoneFile = serde_json::from_slice(&bytes).context("parse zone.json")?;
            z.prepared.into_iter().collect()
        } else {
            BTreeSet::new()
        };

        Ok(Self {
            root: root.to_path_buf(),
            snap_dir,
            world: LiveWorld::new(),
            memory: HashMap::new(),
            prepared,
            _lock: lock,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_prepared(&self, pos: BlockPos) -> bool {
        self.prepared.contains(&pos)
    }

    pub fn live_count(&self) -> usize {
        self.world.len()
    }

    fn snap_path(&self, id: &str) -> PathBuf {
        self.snap_dir.join(file_name_for(id))
    }

    fn save_zone(&self) -> Result<()> {
        let z = ZoneFile {
            prepared: self.prepared.iter().copied().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&z).context("serialize zone.json")?;
        write_atomic(&self.root.join(ZONE_FILE), &bytes)
    }

    fn write_durable(&self, id: &str, data: &SnapshotData<R>) -> Result<()> {
        let body = serde_json::to_vec(data).context("serialize snapshot data")?;
        let file = SnapFile {
            version: SNAPSHOT_FILE_VERSION,
            id: id.to_string(),
            mode: SnapshotMode::Durable,
            crc32: crc_of(&body),
            data,
        };
        let bytes = serde_json::to_vec(&file).context("serialize snapshot file")?;
        write_atomic(&self.snap_path(id), &bytes)
    }

    fn read_durable(&self, id: &str) -> Result<Option<SnapshotData<R>>> {
        let p = self.snap_path(id);
        if !p.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&p).with_context(|| format!("read {}", p.display()))?;
        let file: SnapFile<SnapshotData<R>> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse snapshot {}", p.display()))?;
        if file.version != SNAPSHOT_FILE_VERSION {
            return Err(anyhow!(
                "snapshot {}: unsupported version {}",
                p.display(),
                file.version
            ));
        }
        if file.id != id {
            return Err(anyhow!(
                "snapshot {}: id mismatch (file says '{}', expected '{}')",
                p.display(),
                file.id,
                id
            ));
        }
        let body = serde_json::to_vec(&file.data).context("serialize snapshot data")?;
        let crc = crc_of(&body);
        if crc != file.crc32 {
            return Err(anyhow!(
                "snapshot {}: crc mismatch (stored={:#010x}, actual={:#010x})",
                p.display(),
                file.crc32,
                crc
            ));
        }
        Ok(Some(file.data))
    }
}

impl<R> StagingHost for FileHost<R>
where
    R: StageRecord + Serialize + DeserializeOwned,
{
    type Record = R;

    fn prepare_region(&mut self, pos: BlockPos) -> Result<()> {
        if self.prepared.insert(pos) {
            self.save_zone()?;
        }
        Ok(())
    }

    fn materialize(&mut self, record: &R, pos: BlockPos) -> Result<EntityHandle> {
        Ok(self.world.spawn(record, pos))
    }

    fn read_live(&self, handle: EntityHandle) -> Option<R> {
        self.world.get(handle)
    }

    fn live_near(&self, pos: BlockPos, radius: u32) -> Vec<(EntityHandle, R)> {
        self.world.near(pos, radius)
    }

    fn remove_live(&mut self, handle: EntityHandle) -> Result<bool> {
        Ok(self.world.remove(handle))
    }

    fn clear_live_near(&mut self, pos: BlockPos, radius: u32) -> Result<usize> {
        Ok(self.world.clear_near(pos, radius))
    }

    fn snapshot_create(&mut self, id: &str, region: Region, mode: SnapshotMode) -> Result<()> {
        let data = self.world.capture(region);
        // один id - один снапшот: запись в одном тире вытесняет другой
        match mode {
            SnapshotMode::Durable => {
                self.write_durable(id, &data)?;
                self.memory.remove(id);
            }
            SnapshotMode::Memory => {
                let p = self.snap_path(id);
                if p.exists() {
                    fs::remove_file(&p).with_context(|| format!("remove {}", p.display()))?;
                }
                self.memory.insert(id.to_string(), data);
            }
        }
        Ok(())
    }

    fn snapshot_place(&mut self, id: &str, region: Region) -> Result<bool> {
        let data = match self.memory.get(id) {
            Some(d) => d.clone(),
            None => match self.read_durable(id)? {
                Some(d) => d,
                None => return Ok(false),
            },
        };
        self.world.place(&data, region.min);
        Ok(true)
    }

    fn snapshot_delete(&mut self, id: &str) -> Result<bool> {
        let in_mem = self.memory.remove(id).is_some();
        let p = self.snap_path(id);
        let on_disk = if p.exists() {
            fs::remove_file(&p).with_context(|| format!("remove {}", p.display()))?;
            true
        } else {
            false
        };
        Ok(in_mem || on_disk)
    }

    fn snapshot_exists(&self, id: &str) -> bool {
        self.memory.contains_key(id) || self.snap_path(id).exists()
    }

    fn snapshot_list_ids(&self) -> Result<Vec<String>> {
        let mut ids: BTreeSet<String> = self.memory.keys().cloned().collect();
        let rd = fs::read_dir(&self.snap_dir)
            .with_context(|| format!("list snapshots in {}", self.snap_dir.display()))?;
        for entry in rd {
            let entry = entry.with_context(|| format!("list snapshots in {}", self.snap_dir.display()))?;
            // посторонние файлы (*.tmp после сбоя, мусор) пропускаем
            if let Some(id) = entry.file_name().to_str().and_then(id_from_file_name) {
                ids.insert(id);
            }
        }
        Ok(ids.into_iter().collect())
    }
}
