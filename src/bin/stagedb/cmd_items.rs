use anyhow::Result;
use std::path::PathBuf;

use super::util::{open_table, parse_item, print_json};

pub fn exec_set(root: PathBuf, table: String, key: String, items: Vec<String>) -> Result<()> {
    let parsed = items
        .iter()
        .map(|s| parse_item(s))
        .collect::<Result<Vec<_>>>()?;
    let (_ctx, t) = open_table(&root, &table)?;
    t.set_items(&key, parsed)?.wait()?;
    let n = t.get_items(&key).map(|v| v.len()).unwrap_or(0);
    println!("OK set-items '{}': {} item(s)", key, n);
    Ok(())
}

pub fn exec_get(root: PathBuf, table: String, key: String, json: bool) -> Result<()> {
    let (_ctx, t) = open_table(&root, &table)?;
    let v = t.get_items(&key);
    if json {
        return print_json(&v);
    }
    match v {
        Some(list) => {
            let rendered: Vec<String> = list.iter().map(|it| it.to_string()).collect();
            println!("FOUND '{}': [{}]", key, rendered.join(", "));
        }
        None => println!("NOT FOUND '{}'", key),
    }
    Ok(())
}
