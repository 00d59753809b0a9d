use anyhow::Result;
use std::path::PathBuf;

use super::util::{open_table, print_json};

pub fn exec(root: PathBuf, table: String, json: bool) -> Result<()> {
    let (_ctx, t) = open_table(&root, &table)?;
    let keys = t.get_all_keys().wait()?;
    if json {
        return print_json(&keys);
    }
    for k in &keys {
        println!("{}", k);
    }
    println!("-- {} key(s)", keys.len());
    Ok(())
}
