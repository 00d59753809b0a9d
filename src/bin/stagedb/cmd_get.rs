use anyhow::Result;
use std::path::PathBuf;

use super::util::{open_table, print_json};

pub fn exec(root: PathBuf, table: String, key: String, fresh: bool, json: bool) -> Result<()> {
    let (_ctx, t) = open_table(&root, &table)?;
    let v = if fresh {
        t.get_async(&key).wait()?
    } else {
        t.get(&key)
    };
    if json {
        return print_json(&v);
    }
    match v {
        Some(it) => println!("FOUND '{}': {}", key, it),
        None => println!("NOT FOUND '{}'", key),
    }
    Ok(())
}
