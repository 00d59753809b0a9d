//! Store: tables over a shared staging context.
//!
//! Раскладка:
//! - id.rs:      CompositeId (table, kind, key), проверки имён/ключей
//! - cache.rs:   RecordCache (синхронные чтения идут только сюда)
//! - context.rs: StageContext (host + cache + очередь, общий для всех таблиц)
//! - stage.rs:   save/restore циклы через зону стейджинга
//! - table.rs:   Table - публичные операции

pub mod cache;
pub mod context;
pub mod id;
mod stage;
pub mod table;

pub use cache::{CacheStats, CachedValue, RecordCache};
pub use context::StageContext;
pub use id::{CompositeId, SlotKind};
pub use table::Table;
