use anyhow::Result;
use std::path::PathBuf;

use super::util::open_table;

pub fn exec(root: PathBuf, table: String) -> Result<()> {
    let (ctx, t) = open_table(&root, &table)?;
    let before = t.get_all_keys().wait()?.len();
    t.clear().wait()?;
    ctx.wait_idle()?;
    println!("CLEARED '{}': {} key(s)", table, before);
    Ok(())
}
