use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("sdbtest-cli-{prefix}-{pid}-{t}-{id}"))
}

/// Run the binary; Ok(stdout) on exit code 0.
fn stagedb(root: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new(env!("CARGO_BIN_EXE_stagedb"))
        .arg(args[0])
        .arg("--root")
        .arg(root)
        .arg("--table")
        .arg("inv")
        .args(&args[1..])
        .env_remove("SDB_LOAD_ON_OPEN")
        .env_remove("SDB_SNAPSHOT_MODE")
        .output()?;
    if !out.status.success() {
        return Err(anyhow!(
            "stagedb {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(String::from_utf8(out.stdout)?)
}

#[test]
fn cli_values_survive_between_processes() -> Result<()> {
    let root = unique_root("persist");
    fs::create_dir_all(&root)?;

    let out = stagedb(&root, &["set", "--key", "a", "--item", "minecraft:dirt*100"])?;
    assert!(out.contains("OK set 'a' = minecraft:dirt*64"), "got: {}", out);

    stagedb(&root, &["set-items", "--key", "bag", "--item", "minecraft:stick*2,minecraft:apple"])?;

    let out = stagedb(&root, &["get", "--key", "a"])?;
    assert!(out.contains("FOUND 'a': minecraft:dirt*64"), "got: {}", out);

    let out = stagedb(&root, &["get-items", "--key", "bag", "--json"])?;
    let v: serde_json::Value = serde_json::from_str(out.trim())?;
    assert_eq!(v.as_array().map(|a| a.len()), Some(2));

    let out = stagedb(&root, &["keys", "--json"])?;
    let keys: Vec<String> = serde_json::from_str(out.trim())?;
    assert_eq!(keys, vec!["a".to_string()]);

    let out = stagedb(&root, &["status", "--json"])?;
    let st: serde_json::Value = serde_json::from_str(out.trim())?;
    assert_eq!(st["keys"], 1);
    assert_eq!(st["config"]["snapshot_mode"], "durable");

    let out = stagedb(&root, &["del", "--key", "a"])?;
    assert!(out.contains("DELETED 'a'"), "got: {}", out);
    let out = stagedb(&root, &["get", "--key", "a"])?;
    assert!(out.contains("NOT FOUND 'a'"), "got: {}", out);

    stagedb(&root, &["clear"])?;
    let out = stagedb(&root, &["get-items", "--key", "bag"])?;
    assert!(out.contains("NOT FOUND 'bag'"), "got: {}", out);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn cli_rejects_long_keys() -> Result<()> {
    let root = unique_root("longkey");
    fs::create_dir_all(&root)?;
    let r = stagedb(&root, &["set", "--key", "thirteen-char", "--item", "minecraft:dirt"]);
    let err = r.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("KeyLengthError"), "got: {}", err);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}
