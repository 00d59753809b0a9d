use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use StageDB::{FileHost, ItemStack, StageContext, Table};

pub type CliContext = Arc<StageContext<FileHost<ItemStack>>>;
pub type CliTable = Table<FileHost<ItemStack>>;

/// Open the file host under `root`, open `table` and wait until its
/// snapshots are loaded into the cache.
pub fn open_table(root: &Path, table: &str) -> Result<(CliContext, CliTable)> {
    let host = FileHost::open(root)?;
    let ctx = StageContext::new(host)?;
    let t = Table::open_default(&ctx, table)
        .with_context(|| format!("open table '{}'", table))?;
    ctx.wait_idle()?;
    Ok((ctx, t))
}

pub fn parse_item(s: &str) -> Result<ItemStack> {
    s.parse::<ItemStack>()
        .with_context(|| format!("parse item '{}'", s))
}

pub fn print_json<T: serde::Serialize>(v: &T) -> Result<()> {
    let s = serde_json::to_string(v).context("serialize json output")?;
    println!("{}", s);
    Ok(())
}
