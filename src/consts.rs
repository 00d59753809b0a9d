//! Общие константы: лимиты имён, схема идентификаторов, дефолты staging-зоны.

// -------- Limits --------
// Имя таблицы и ключ встраиваются в идентификатор снапшота, отсюда жёсткий лимит.
pub const MAX_NAME_LEN: usize = 12;
pub const MAX_KEY_LEN: usize = 12;

// -------- Identifiers --------
// <table>_item:<key>  - одна запись на ключ
// <table>_items:<key> - упорядоченный набор записей на ключ
pub const ONE_INFIX: &str = "_item:";
pub const MANY_INFIX: &str = "_items:";

// Запрещён в имени таблицы: иначе префиксы двух таблиц могут пересечься.
pub const NAME_FORBIDDEN_CHAR: char = ':';

// -------- Staging zone --------
pub const DEFAULT_STAGING_POS: (i32, i32, i32) = (0, 64, 0);
pub const DEFAULT_CLEAR_RADIUS: u32 = 2;

// -------- FileHost layout --------
pub const SNAPSHOT_DIR: &str = "snapshots";
pub const SNAPSHOT_EXT: &str = "snap.json";
pub const ZONE_FILE: &str = "zone.json";
pub const LOCK_FILE: &str = "LOCK";
pub const SNAPSHOT_FILE_VERSION: u32 = 1;

// -------- Items --------
pub const ITEM_MAX_STACK: u8 = 64;
