//! Entity resolution cache.
//!
//! Maps a natural key (`Author_123`, a sanitized organization name) to the
//! value created for it during one population stage. The cache is discarded
//! when the stage ends; the next stage re-derives it from the entities already
//! present in the loaded snapshot via [`EntityCache::from_existing`].

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

/// Per-stage natural key → entity mapping.
#[derive(Debug)]
pub struct EntityCache<V> {
    entries: FxHashMap<String, V>,
    created: usize,
    reused: usize,
}

impl<V> EntityCache<V> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            created: 0,
            reused: 0,
        }
    }

    /// Seed the cache from entities loaded with the previous snapshot.
    ///
    /// Seeded entries count as neither created nor reused.
    pub fn from_existing(existing: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut cache = Self::new();
        cache.entries.extend(existing);
        cache
    }

    /// Return the entry for `key`, constructing it with `ctor` on first use.
    ///
    /// This is the only path through which a stage creates entities of a
    /// given kind, so repeated keys converge to one entity.
    pub fn resolve(&mut self, key: &str, ctor: impl FnOnce(&str) -> V) -> &mut V {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                self.reused += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.created += 1;
                let value = ctor(entry.key());
                entry.insert(value)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries constructed by [`resolve`](Self::resolve) in this stage.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Cache hits served by [`resolve`](Self::resolve) in this stage.
    pub fn reused(&self) -> usize {
        self.reused
    }
}

impl<V> Default for EntityCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_constructs_once() {
        let mut cache = EntityCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache.resolve("Author_1", |k| {
                calls += 1;
                k.to_uppercase()
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("Author_1").map(String::as_str), Some("AUTHOR_1"));
        assert_eq!(cache.created(), 1);
        assert_eq!(cache.reused(), 2);
    }

    #[test]
    fn resolve_returns_mutable_entry() {
        let mut cache: EntityCache<Vec<u32>> = EntityCache::new();
        cache.resolve("k", |_| Vec::new()).push(1);
        cache.resolve("k", |_| Vec::new()).push(2);
        assert_eq!(cache.get("k"), Some(&vec![1, 2]));
    }

    #[test]
    fn seeded_entries_are_not_recreated() {
        let mut cache =
            EntityCache::from_existing([("Harvard".to_string(), 7u32), ("MIT".to_string(), 9)]);
        assert_eq!(cache.created(), 0);

        let v = *cache.resolve("Harvard", |_| panic!("must not construct"));
        assert_eq!(v, 7);
        cache.resolve("Stanford", |_| 11);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.created(), 1);
        assert_eq!(cache.reused(), 1);
        assert!(cache.contains("MIT"));
    }
}
