//! FILENAME: core/pivot-engine/src/cache.rs
//! Memo Cache - results keyed by the full input tuple.
//!
//! Every computation in this crate is a pure function of its query, so a
//! cached result is always interchangeable with a fresh one. The cache is
//! bounded; once full, the oldest insertion is evicted first.

use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Default number of results kept per cache.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct MemoCache<K, V> {
    entries: FxHashMap<K, Arc<V>>,
    /// Insertion order, oldest first.
    order: VecDeque<K>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq + Clone, V> MemoCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        MemoCache {
            entries: FxHashMap::default(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    /// Returns the cached result for `key`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&mut self, key: &K, compute: F) -> Arc<V>
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(hit) = self.entries.get(key) {
            self.hits += 1;
            return Arc::clone(hit);
        }

        self.misses += 1;
        let value = Arc::new(compute(key));
        self.insert(key.clone(), Arc::clone(&value));
        value
    }

    fn insert(&mut self, key: K, value: Arc<V>) {
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    /// Drops every entry, e.g. after the underlying data is replaced.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl<K: Hash + Eq + Clone, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
