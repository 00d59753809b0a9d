//! RecordCache: in-memory mirror of what has been staged and snapshotted.
//!
//! Entries are inserted after a successful save/restore cycle and removed on
//! delete. Synchronous reads (`Table::get`, `has`, `get_items`) are served
//! from here only and never touch the staging area.

use std::collections::HashMap;

use crate::metrics::{record_cache_hit, record_cache_miss};

use super::id::CompositeId;

#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue<R> {
    One(R),
    Many(Vec<R>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct RecordCache<R> {
    map: HashMap<CompositeId, CachedValue<R>>,
    hits: u64,
    misses: u64,
}

impl<R> Default for RecordCache<R> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<R: Clone> RecordCache<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn count(&mut self, hit: bool) {
        if hit {
            self.hits = self.hits.saturating_add(1);
            record_cache_hit();
        } else {
            self.misses = self.misses.saturating_add(1);
            record_cache_miss();
        }
    }

    pub fn get_one(&mut self, id: &CompositeId) -> Option<R> {
        let got = match self.map.get(id) {
            Some(CachedValue::One(r)) => Some(r.clone()),
            _ => None,
        };
        self.count(got.is_some());
        got
    }

    pub fn get_many(&mut self, id: &CompositeId) -> Option<Vec<R>> {
        let got = match self.map.get(id) {
            Some(CachedValue::Many(v)) => Some(v.clone()),
            _ => None,
        };
        self.count(got.is_some());
        got
    }

    pub fn contains(&self, id: &CompositeId) -> bool {
        self.map.contains_key(id)
    }

    pub fn put_one(&mut self, id: CompositeId, r: R) {
        self.map.insert(id, CachedValue::One(r));
    }

    pub fn put_many(&mut self, id: CompositeId, v: Vec<R>) {
        self.map.insert(id, CachedValue::Many(v));
    }

    pub fn remove(&mut self, id: &CompositeId) -> bool {
        self.map.remove(id).is_some()
    }

    /// Drop every entry of `table`; returns how many were removed.
    pub fn remove_table(&mut self, table: &str) -> usize {
        let before = self.map.len();
        self.map.retain(|id, _| id.table != table);
        before - self.map.len()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.map.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::id::SlotKind;

    #[test]
    fn one_and_many_slots_are_distinct() {
        let mut c: RecordCache<String> = RecordCache::new();
        let one = CompositeId::new("t", SlotKind::One, "k");
        let many = CompositeId::new("t", SlotKind::Many, "k");
        c.put_one(one.clone(), "x".into());
        c.put_many(many.clone(), vec!["a".into(), "b".into()]);

        assert_eq!(c.get_one(&one).as_deref(), Some("x"));
        assert_eq!(c.get_many(&many).map(|v| v.len()), Some(2));
        assert_eq!(c.get_many(&one), None, "One slot must not read as Many");

        let st = c.stats();
        assert_eq!(st.entries, 2);
        assert_eq!(st.hits, 2);
        assert_eq!(st.misses, 1);
    }

    #[test]
    fn remove_table_keeps_other_tables() {
        let mut c: RecordCache<u8> = RecordCache::new();
        c.put_one(CompositeId::new("a", SlotKind::One, "1"), 1);
        c.put_one(CompositeId::new("a", SlotKind::One, "2"), 2);
        c.put_one(CompositeId::new("b", SlotKind::One, "1"), 3);
        assert_eq!(c.remove_table("a"), 2);
        assert_eq!(c.len(), 1);
        assert!(c.contains(&CompositeId::new("b", SlotKind::One, "1")));
    }
}
