use anyhow::Result;

use StageDB::{BlockPos, ContextBuilder, MemoryHost, SnapshotMode, StageConfig, StageContext, Table};

#[test]
fn env_overrides_defaults() -> Result<()> {
    // единственный тест в этом бинаре, трогающий env
    std::env::set_var("SDB_STAGING_POS", "7, 80, -7");
    std::env::set_var("SDB_CLEAR_RADIUS", "5");
    std::env::set_var("SDB_SNAPSHOT_MODE", "memory");
    std::env::set_var("SDB_LOAD_ON_OPEN", "off");

    let cfg = StageConfig::from_env();
    assert_eq!(cfg.staging_pos, BlockPos::new(7, 80, -7));
    assert_eq!(cfg.clear_radius, 5);
    assert_eq!(cfg.snapshot_mode, SnapshotMode::Memory);
    assert!(!cfg.load_on_open);

    // ContextBuilder::new() стартует с env, сеттеры перекрывают его
    let built = ContextBuilder::new().clear_radius(1).build();
    assert_eq!(built.staging_pos, BlockPos::new(7, 80, -7));
    assert_eq!(built.clear_radius, 1);

    // мусор в env игнорируется
    std::env::set_var("SDB_STAGING_POS", "nope");
    std::env::set_var("SDB_CLEAR_RADIUS", "-1");
    std::env::set_var("SDB_SNAPSHOT_MODE", "bogus");
    let cfg = StageConfig::from_env();
    assert_eq!(cfg.staging_pos, StageConfig::default().staging_pos);
    assert_eq!(cfg.clear_radius, StageConfig::default().clear_radius);
    assert_eq!(cfg.snapshot_mode, SnapshotMode::Durable);

    for k in ["SDB_STAGING_POS", "SDB_CLEAR_RADIUS", "SDB_SNAPSHOT_MODE", "SDB_LOAD_ON_OPEN"] {
        std::env::remove_var(k);
    }
    Ok(())
}

#[test]
fn context_stages_at_configured_position() -> Result<()> {
    let pos = BlockPos::new(100, 10, 100);
    let cfg = ContextBuilder::from_default()
        .staging_pos(pos)
        .clear_radius(0)
        .build();
    let ctx = StageContext::with_config(MemoryHost::<String>::new(), cfg.clone())?;
    assert_eq!(ctx.config(), &cfg);

    let t = Table::open(&ctx, "inv", SnapshotMode::Durable)?;
    t.set("a", "v".to_string())?.wait()?;
    assert_eq!(t.get_async("a").wait()?.as_deref(), Some("v"));

    ctx.with_host(|h| {
        assert!(h.is_prepared(pos));
        assert!(!h.is_prepared(StageConfig::default().staging_pos));
        assert_eq!(h.stats().regions_prepared, 1, "zone is prepared once per context");
    });
    Ok(())
}
