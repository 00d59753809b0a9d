use anyhow::Result;

use StageDB::{ItemStack, MemoryHost, SnapshotMode, StageConfig, StageContext, StageRecord, Table};

// порядок намеренно не отсортирован; последний элемент нормализуется (200 -> 64)
fn stacks() -> Vec<ItemStack> {
    vec![
        ItemStack::new("minecraft:stick", 1).with_name("wand"),
        ItemStack::new("minecraft:diamond", 3),
        ItemStack::new("minecraft:apple", 7),
        ItemStack::new("minecraft:dirt", 200),
    ]
}

fn normalized(v: Vec<ItemStack>) -> Vec<ItemStack> {
    v.iter().map(|s| s.normalized()).collect()
}

#[test]
fn items_roundtrip_and_namespace() -> Result<()> {
    let ctx = StageContext::with_config(MemoryHost::<ItemStack>::new(), StageConfig::default())?;
    let t = Table::open(&ctx, "chest", SnapshotMode::Durable)?;

    t.set_items("box", stacks())?.wait()?;
    let got = t.get_items("box").expect("cached");
    assert_eq!(got, normalized(stacks()), "order and normalization preserved in cache");
    assert!(t.has_items("box"));

    // single-record namespace не пересекается с multi-record
    assert_eq!(t.get("box"), None);
    assert!(!t.has("box"));
    assert!(t.get_all_keys().wait()?.is_empty());

    let fresh = t.get_items_async("box").wait()?.expect("snapshot exists");
    assert_eq!(fresh, normalized(stacks()), "order preserved through the snapshot");

    assert!(t.delete_items("box").wait()?);
    assert_eq!(t.get_items("box"), None);
    assert_eq!(t.get_items_async("box").wait()?, None);
    Ok(())
}

#[test]
fn empty_collection_is_stored() -> Result<()> {
    let ctx = StageContext::with_config(MemoryHost::<ItemStack>::new(), StageConfig::default())?;
    let t = Table::open(&ctx, "chest", SnapshotMode::Durable)?;

    t.set_items("none", Vec::new())?.wait()?;
    assert_eq!(t.get_items("none"), Some(Vec::new()));
    assert_eq!(t.get_items_async("none").wait()?, Some(Vec::new()));
    Ok(())
}

#[test]
fn one_and_many_with_same_key_coexist() -> Result<()> {
    let ctx = StageContext::with_config(MemoryHost::<ItemStack>::new(), StageConfig::default())?;
    let t = Table::open(&ctx, "chest", SnapshotMode::Durable)?;

    t.set("k", ItemStack::new("minecraft:apple", 5))?;
    t.set_items("k", stacks())?;
    ctx.wait_idle()?;

    assert_eq!(t.get("k").map(|s| s.amount), Some(5));
    assert_eq!(t.get_items("k").map(|v| v.len()), Some(4));

    // clear сносит оба пространства
    assert!(t.clear().wait()?);
    assert_eq!(t.get("k"), None);
    assert_eq!(t.get_items("k"), None);
    let left = ctx.with_host(|h| StageDB::StagingHost::snapshot_list_ids(h))?;
    assert!(left.is_empty());
    Ok(())
}
