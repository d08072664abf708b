//! Shared backing resources and their disposal.
//!
//! Emotes never own their texture. They carry a key, the pipeline counts how
//! many active emotes use each key, and when the count drops to zero it asks
//! a [`Dispose`] implementation to release the resource. [`TextureCache`] is
//! the default implementation: a key-to-resource map that destroys the entry
//! on disposal.

use std::{collections::HashMap, fmt::Debug, hash::Hash};

pub mod animation;

/// Something expensive that has to be released explicitly.
pub trait SharedResource {
    fn dispose(&mut self);
}

/// Outbound disposal hook of the update loop.
///
/// Called exactly once per key each time its reference count goes from one
/// to zero.
pub trait Dispose<K> {
    fn dispose(&mut self, key: &K);
}

impl<K, F> Dispose<K> for F
where
    F: FnMut(&K),
{
    fn dispose(&mut self, key: &K) {
        self(key)
    }
}

/// Resources by key. Handles are looked up by emote constructors and removed
/// (and disposed) by the update loop.
#[derive(Debug)]
pub struct TextureCache<K, R> {
    entries: HashMap<K, R>,
    disposed: usize,
}

impl<K, R> TextureCache<K, R>
where
    K: Eq + Hash,
    R: SharedResource,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            disposed: 0,
        }
    }

    /// Register `resource` under `key`, returning the previous entry if the
    /// key was already taken. The previous entry is not disposed.
    pub fn insert(&mut self, key: K, resource: R) -> Option<R> {
        self.entries.insert(key, resource)
    }

    pub fn get(&self, key: &K) -> Option<&R> {
        self.entries.get(key)
    }

    /// Reuse a resource if it is still alive, otherwise build and insert it.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> R) -> &R {
        self.entries.entry(key).or_insert_with(make)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many resources have been released so far.
    pub fn disposed(&self) -> usize {
        self.disposed
    }
}

impl<K, R> Default for TextureCache<K, R>
where
    K: Eq + Hash,
    R: SharedResource,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, R> Dispose<K> for TextureCache<K, R>
where
    K: Eq + Hash + Debug,
    R: SharedResource,
{
    fn dispose(&mut self, key: &K) {
        match self.entries.remove(key) {
            Some(mut resource) => {
                resource.dispose();
                self.disposed += 1;
                log::debug!("disposed of texture {:?}", key);
            }
            None => log::warn!("asked to dispose unknown texture {:?}", key),
        }
    }
}
