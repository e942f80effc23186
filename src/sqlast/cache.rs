//! Parse-tree cache keyed by `(sql, dialect)`, an LRU of at least 256
//! entries (spec §4.11).

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use sqlparser::ast::Statement;

use crate::db::Dialect;

const DEFAULT_CAPACITY: usize = 256;

pub struct ParseCache {
    inner: Mutex<LruCache<(String, Dialect), Vec<Statement>>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self { inner: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn get(&self, sql: &str, dialect: Dialect) -> Option<Vec<Statement>> {
        let mut cache = self.inner.lock().expect("parse cache mutex poisoned");
        cache.get(&(sql.to_string(), dialect)).cloned()
    }

    pub fn insert(&self, sql: &str, dialect: Dialect, statements: Vec<Statement>) {
        let mut cache = self.inner.lock().expect("parse cache mutex poisoned");
        cache.put((sql.to_string(), dialect), statements);
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_and_returns_parsed_statements() {
        let cache = ParseCache::new();
        assert!(cache.get("SELECT 1", Dialect::Postgres).is_none());
        cache.insert("SELECT 1", Dialect::Postgres, Vec::new());
        assert!(cache.get("SELECT 1", Dialect::Postgres).is_some());
    }

    #[test]
    fn evicts_least_recently_used_entry_past_capacity() {
        let cache = ParseCache::with_capacity(2);
        cache.insert("a", Dialect::Generic, Vec::new());
        cache.insert("b", Dialect::Generic, Vec::new());
        cache.insert("c", Dialect::Generic, Vec::new());
        assert!(cache.get("a", Dialect::Generic).is_none());
        assert!(cache.get("c", Dialect::Generic).is_some());
    }
}
