//! Multiset of live references per shared resource key.
//!
//! A key is either absent or stored with a strictly positive count. Hitting
//! zero removes the entry, so "count is 0" and "never seen" behave the same.
//! A `decrement` that returns exactly `0` is the caller's cue to dispose the
//! resource behind the key.

use std::{collections::HashMap, hash::Hash};

#[derive(Debug)]
pub struct Counter<K> {
    values: HashMap<K, usize>,
}

impl<K: Eq + Hash> Counter<K> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Add one reference to `key` and return the new count (always >= 1).
    pub fn increment(&mut self, key: K) -> usize {
        let count = self.values.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Drop one reference to `key` and return the new count.
    ///
    /// Decrementing an absent key is a no-op that returns `0`; it never
    /// underflows and never recreates the entry.
    pub fn decrement(&mut self, key: &K) -> usize {
        match self.values.get_mut(key) {
            None => 0,
            Some(count) if *count <= 1 => {
                self.values.remove(key);
                0
            }
            Some(count) => {
                *count -= 1;
                *count
            }
        }
    }

    pub fn peek(&self, key: &K) -> usize {
        self.values.get(key).copied().unwrap_or(0)
    }

    /// Number of keys with at least one live reference.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.values.keys()
    }
}

impl<K: Eq + Hash> Default for Counter<K> {
    fn default() -> Self {
        Self::new()
    }
}
