#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod util;

// Хост: зона стейджинга + снапшоты (memory / file)
pub mod host; // src/host/{mod,world,memory,file}.rs
pub mod item;
pub mod lock;

// Очередь задач (single worker, FIFO)
pub mod queue; // src/queue/{mod,handle}.rs

// Таблицы, кэш, контекст
pub mod store; // src/store/{mod,id,cache,context,stage,table}.rs

// In-process change notifications
pub mod subs;

// Удобные реэкспорты
pub use config::{ContextBuilder, StageConfig};
pub use error::{StoreError, StoreResult};
pub use host::{BlockPos, FileHost, MemoryHost, SnapshotMode, StageRecord, StagingHost};
pub use item::ItemStack;
pub use queue::{QueueState, QueueStats, TaskHandle, TaskQueue};
pub use store::{CompositeId, SlotKind, StageContext, Table};
pub use subs::{ChangeEvent, ChangeKind, SubscriptionHandle};
