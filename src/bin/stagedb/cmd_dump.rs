use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::util::{open_table, print_json};

pub fn exec(root: PathBuf, table: String, json: bool) -> Result<()> {
    let (_ctx, t) = open_table(&root, &table)?;
    let keys = t.get_all_keys().wait()?;
    let values = t.get_many(&keys);
    let rows: BTreeMap<String, _> = keys.into_iter().zip(values).collect();
    if json {
        return print_json(&rows);
    }
    for (k, v) in &rows {
        match v {
            Some(it) => println!("{} = {}", k, it),
            None => println!("{} = (not cached)", k),
        }
    }
    println!("-- {} key(s)", rows.len());
    Ok(())
}
