//! Centralized configuration and builder for StageDB.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - StageConfig::from_env() reads SDB_* variables on top of defaults.
//! - ContextBuilder returns a StageConfig that StageContext consumes.
//!
//! ENV:
//! - SDB_STAGING_POS   = "x,y,z"            (default 0,64,0)
//! - SDB_CLEAR_RADIUS  = <u32>              (default 2)
//! - SDB_SNAPSHOT_MODE = durable|memory     (default durable)
//! - SDB_LOAD_ON_OPEN  = 0|1|true|false|... (default true)
//!
//! Unparseable values are ignored and the default is kept.

use std::fmt;

use crate::consts::{DEFAULT_CLEAR_RADIUS, DEFAULT_STAGING_POS};
use crate::host::{BlockPos, SnapshotMode};
use crate::util::{env_bool, env_parse, parse_triplet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageConfig {
    /// The one coordinate every table stages through.
    /// Env: SDB_STAGING_POS
    pub staging_pos: BlockPos,

    /// Radius around the staging coordinate that is swept for stray live
    /// material and scanned when reading a placed snapshot back.
    /// Env: SDB_CLEAR_RADIUS
    pub clear_radius: u32,

    /// Tier used by `Table::open_default`.
    /// Env: SDB_SNAPSHOT_MODE
    pub snapshot_mode: SnapshotMode,

    /// Warm the cache from existing snapshots when a table opens.
    /// Env: SDB_LOAD_ON_OPEN
    pub load_on_open: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            staging_pos: BlockPos::from(DEFAULT_STAGING_POS),
            clear_radius: DEFAULT_CLEAR_RADIUS,
            snapshot_mode: SnapshotMode::Durable,
            load_on_open: true,
        }
    }
}

impl StageConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SDB_STAGING_POS") {
            if let Some(t) = parse_triplet(&v) {
                cfg.staging_pos = BlockPos::from(t);
            }
        }
        if let Some(r) = env_parse::<u32>("SDB_CLEAR_RADIUS") {
            cfg.clear_radius = r;
        }
        if let Ok(v) = std::env::var("SDB_SNAPSHOT_MODE") {
            if let Some(m) = SnapshotMode::parse(&v) {
                cfg.snapshot_mode = m;
            }
        }
        if let Some(b) = env_bool("SDB_LOAD_ON_OPEN") {
            cfg.load_on_open = b;
        }

        cfg
    }

    // ----- fluent setters (builder-style) -----

    pub fn with_staging_pos(mut self, pos: BlockPos) -> Self {
        self.staging_pos = pos;
        self
    }

    pub fn with_clear_radius(mut self, r: u32) -> Self {
        self.clear_radius = r;
        self
    }

    pub fn with_snapshot_mode(mut self, m: SnapshotMode) -> Self {
        self.snapshot_mode = m;
        self
    }

    pub fn with_load_on_open(mut self, on: bool) -> Self {
        self.load_on_open = on;
        self
    }

    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for StageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StageConfig {{ staging_pos: {}, clear_radius: {}, snapshot_mode: {}, load_on_open: {} }}",
            self.staging_pos,
            self.clear_radius,
            self.snapshot_mode.as_str(),
            self.load_on_open,
        )
    }
}

/// Lightweight builder that produces a StageConfig.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    cfg: StageConfig,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            cfg: StageConfig::from_env(),
        }
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: StageConfig::default(),
        }
    }

    pub fn staging_pos(mut self, pos: BlockPos) -> Self {
        self.cfg.staging_pos = pos;
        self
    }

    pub fn clear_radius(mut self, r: u32) -> Self {
        self.cfg.clear_radius = r;
        self
    }

    pub fn snapshot_mode(mut self, m: SnapshotMode) -> Self {
        self.cfg.snapshot_mode = m;
        self
    }

    pub fn load_on_open(mut self, on: bool) -> Self {
        self.cfg.load_on_open = on;
        self
    }

    pub fn build(self) -> StageConfig {
        self.cfg
    }
}
