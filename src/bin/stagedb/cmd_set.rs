use anyhow::Result;
use std::path::PathBuf;

use super::util::{open_table, parse_item};

pub fn exec(root: PathBuf, table: String, key: String, item: String) -> Result<()> {
    let it = parse_item(&item)?;
    let (_ctx, t) = open_table(&root, &table)?;
    t.set(&key, it)?.wait()?;
    match t.get(&key) {
        Some(stored) => println!("OK set '{}' = {}", key, stored),
        None => println!("OK set '{}'", key),
    }
    Ok(())
}
