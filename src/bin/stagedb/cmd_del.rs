use anyhow::Result;
use std::path::PathBuf;

use super::util::open_table;

pub fn exec(root: PathBuf, table: String, key: String, items: bool) -> Result<()> {
    let (_ctx, t) = open_table(&root, &table)?;
    let h = if items { t.delete_items(&key) } else { t.delete(&key) };
    if h.wait()? {
        println!("DELETED '{}'", key);
    } else {
        println!("NOT FOUND '{}'", key);
    }
    Ok(())
}
