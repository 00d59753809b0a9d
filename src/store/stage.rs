//! Staging cycles: the only code that drives the host's staging area.
//!
//! Вызывается исключительно из задач очереди, с удержанным локом хоста.
//!
//! evict:   delete old snapshot (отдельный шаг: вызывающий чистит кэш только после успеха)
//! save:    clear strays -> materialize -> snapshot_create
//!          -> read back normalized records -> remove live -> clear
//! restore: exists? -> clear strays -> snapshot_place -> collect live near pos -> clear
//!
//! StagingGuard clears the staging area on every exit path, so a failed step
//! never leaves material behind for the next task to capture.

use anyhow::{anyhow, Result};
use log::{debug, warn};
use std::sync::atomic::Ordering;

use crate::config::StageConfig;
use crate::host::{BlockPos, Region, SnapshotMode, StagingHost};
use crate::metrics::{record_snapshot_deleted, record_stage_restore, record_stage_save};

use super::context::StoreShared;

struct StagingGuard<'a, H: StagingHost> {
    host: &'a mut H,
    pos: BlockPos,
    radius: u32,
    armed: bool,
}

impl<'a, H: StagingHost> StagingGuard<'a, H> {
    fn begin(host: &'a mut H, pos: BlockPos, radius: u32) -> Result<Self> {
        let strays = host.clear_live_near(pos, radius)?;
        if strays > 0 {
            debug!("staging: cleared {} stray entit(ies) near {}", strays, pos);
        }
        Ok(Self {
            host,
            pos,
            radius,
            armed: true,
        })
    }

    fn host(&mut self) -> &mut H {
        &mut *self.host
    }

    fn finish(mut self) -> Result<()> {
        self.armed = false;
        self.host.clear_live_near(self.pos, self.radius)?;
        Ok(())
    }
}

impl<'a, H: StagingHost> Drop for StagingGuard<'a, H> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.host.clear_live_near(self.pos, self.radius) {
                warn!("staging: cleanup after failed cycle at {}: {:#}", self.pos, e);
            }
        }
    }
}

/// Prepare the shared staging region once per context (host side is idempotent too).
pub(crate) fn ensure_zone<H: StagingHost>(shared: &StoreShared<H>, host: &mut H) -> Result<()> {
    if shared.zone_ready.load(Ordering::Acquire) {
        return Ok(());
    }
    host.prepare_region(shared.cfg.staging_pos)?;
    shared.zone_ready.store(true, Ordering::Release);
    debug!("staging: zone prepared at {}", shared.cfg.staging_pos);
    Ok(())
}

/// Delete the previous snapshot of `id`, if any. Ok(true) if one existed.
pub(crate) fn evict_snapshot<H: StagingHost>(host: &mut H, id: &str) -> Result<bool> {
    let existed = host.snapshot_delete(id)?;
    if existed {
        record_snapshot_deleted();
        debug!("staging: evicted previous snapshot '{}'", id);
    }
    Ok(existed)
}

/// Persist `records` under `id`; returns the records as read back from the
/// staging area (normalized by the host). The previous snapshot must already
/// be gone (`evict_snapshot`).
pub(crate) fn save_cycle<H: StagingHost>(
    host: &mut H,
    cfg: &StageConfig,
    id: &str,
    records: &[H::Record],
    mode: SnapshotMode,
) -> Result<Vec<H::Record>> {
    let pos = cfg.staging_pos;
    let mut st = StagingGuard::begin(host, pos, cfg.clear_radius)?;
    let mut handles = Vec::with_capacity(records.len());
    for r in records {
        handles.push(st.host().materialize(r, pos)?);
    }
    st.host().snapshot_create(id, Region::point(pos), mode)?;

    let mut captured = Vec::with_capacity(handles.len());
    for h in &handles {
        match st.host().read_live(*h) {
            Some(r) => captured.push(r),
            None => {
                return Err(anyhow!(
                    "staging: entity {:?} for '{}' vanished before capture",
                    h,
                    id
                ))
            }
        }
    }
    for h in handles {
        st.host().remove_live(h)?;
    }
    st.finish()?;

    record_stage_save();
    debug!(
        "staging: saved '{}' ({} record(s), {})",
        id,
        captured.len(),
        mode.as_str()
    );
    Ok(captured)
}

/// Materialize snapshot `id` and read its records back. Ok(None) if there is no such snapshot.
pub(crate) fn restore_cycle<H: StagingHost>(
    host: &mut H,
    cfg: &StageConfig,
    id: &str,
) -> Result<Option<Vec<H::Record>>> {
    if !host.snapshot_exists(id) {
        return Ok(None);
    }
    let pos = cfg.staging_pos;
    let mut st = StagingGuard::begin(host, pos, cfg.clear_radius)?;
    if !st.host().snapshot_place(id, Region::point(pos))? {
        st.finish()?;
        return Ok(None);
    }
    let records: Vec<H::Record> = st
        .host()
        .live_near(pos, cfg.clear_radius)
        .into_iter()
        .map(|(_, r)| r)
        .collect();
    st.finish()?;

    record_stage_restore();
    debug!("staging: restored '{}' ({} record(s))", id, records.len());
    Ok(Some(records))
}
