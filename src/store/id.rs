//! Composite identifiers and name/key validation.
//!
//! Внутри стора ключ - структурная пара (table, kind, key); строка вида
//! `<table>_item:<key>` собирается только на границе с хостом.

use std::fmt;

use crate::consts::{MANY_INFIX, MAX_KEY_LEN, MAX_NAME_LEN, NAME_FORBIDDEN_CHAR, ONE_INFIX};
use crate::error::{StoreError, StoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// One record per key.
    One,
    /// Ordered collection of records per key.
    Many,
}

impl SlotKind {
    fn infix(self) -> &'static str {
        match self {
            SlotKind::One => ONE_INFIX,
            SlotKind::Many => MANY_INFIX,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeId {
    pub table: String,
    pub kind: SlotKind,
    pub key: String,
}

impl CompositeId {
    pub fn new(table: &str, kind: SlotKind, key: &str) -> Self {
        Self {
            table: table.to_string(),
            kind,
            key: key.to_string(),
        }
    }

    /// Namespace prefix of a table for the given slot kind.
    pub fn prefix(table: &str, kind: SlotKind) -> String {
        format!("{}{}", table, kind.infix())
    }

    /// Identifier passed to the host.
    pub fn host_id(&self) -> String {
        format!("{}{}{}", self.table, self.kind.infix(), self.key)
    }

    /// Inverse of `host_id` for a known table/kind; None if `host_id` is outside that namespace.
    pub fn from_host_id(table: &str, kind: SlotKind, host_id: &str) -> Option<Self> {
        let key = host_id.strip_prefix(&Self::prefix(table, kind))?;
        Some(Self::new(table, kind, key))
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host_id())
    }
}

pub fn validate_table_name(name: &str) -> StoreResult<()> {
    let len = name.chars().count();
    let reason = if len == 0 {
        Some("is empty".to_string())
    } else if len > MAX_NAME_LEN {
        Some(format!("has {} chars (max {})", len, MAX_NAME_LEN))
    } else if name.contains(NAME_FORBIDDEN_CHAR) {
        Some(format!("contains '{}'", NAME_FORBIDDEN_CHAR))
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StoreError::Initialization {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

pub fn validate_key(key: &str) -> StoreResult<()> {
    let len = key.chars().count();
    if len > MAX_KEY_LEN {
        return Err(StoreError::KeyLength {
            key: key.to_string(),
            len,
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}
