//! Advisory lock on a FileHost root.
//!
//! The store assumes one process owns the staging area and the snapshot
//! directory. FileHost takes an exclusive fs2 lock on <root>/LOCK when it
//! opens and keeps it until Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE;

#[derive(Debug)]
pub struct RootLock {
    file: std::fs::File,
}

impl Drop for RootLock {
    fn drop(&mut self) {
        // unlock errors on drop are ignored; the OS drops the lock with the fd anyway
        let _ = self.file.unlock();
    }
}

fn open_lock_file(root: &Path) -> Result<(std::fs::File, PathBuf)> {
    let path = root.join(LOCK_FILE);
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))?;
    Ok((f, path))
}

/// Try to take the root exclusively. Err if another owner holds it.
pub fn try_lock_root(root: &Path) -> Result<RootLock> {
    let (file, path) = open_lock_file(root)?;
    file.try_lock_exclusive()
        .with_context(|| format!("root {} is in use (lock {})", root.display(), path.display()))?;
    Ok(RootLock { file })
}
