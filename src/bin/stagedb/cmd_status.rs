use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use StageDB::metrics;

use super::util::{open_table, print_json};

pub fn exec(root: PathBuf, table: String, json: bool) -> Result<()> {
    let (ctx, t) = open_table(&root, &table)?;
    let keys = t.get_all_keys().wait()?;
    let qs = ctx.queue_stats();
    let cs = ctx.cache_stats();
    let ms = metrics::snapshot();
    let cfg = ctx.config();

    if json {
        let v = json!({
            "root": root.display().to_string(),
            "table": t.name(),
            "keys": keys.len(),
            "config": {
                "staging_pos": cfg.staging_pos.to_string(),
                "clear_radius": cfg.clear_radius,
                "snapshot_mode": cfg.snapshot_mode.as_str(),
                "load_on_open": cfg.load_on_open,
            },
            "queue": {
                "enqueued": qs.enqueued,
                "completed": qs.completed,
                "failed": qs.failed,
                "pending": qs.pending,
            },
            "cache": {
                "entries": cs.entries,
                "hits": cs.hits,
                "misses": cs.misses,
            },
            "metrics": {
                "stage_saves": ms.stage_saves,
                "stage_restores": ms.stage_restores,
                "records_loaded": ms.records_loaded,
                "cache_hit_ratio": ms.cache_hit_ratio(),
            },
        });
        return print_json(&v);
    }

    println!("StageDB status:");
    println!("  root        = {}", root.display());
    println!("  table       = {}", t.name());
    println!("  keys        = {}", keys.len());
    println!("  config      = {}", cfg);
    println!(
        "  queue       = enqueued={} completed={} failed={} pending={}",
        qs.enqueued, qs.completed, qs.failed, qs.pending
    );
    println!(
        "  cache       = entries={} hits={} misses={}",
        cs.entries, cs.hits, cs.misses
    );
    println!(
        "  staging     = saves={} restores={} loaded={}",
        ms.stage_saves, ms.stage_restores, ms.records_loaded
    );
    Ok(())
}
