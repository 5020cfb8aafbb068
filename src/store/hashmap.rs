//! HashMap-backed adapter for [`BackingMap`].
//!
//! ## Architecture
//! - Covers every `HashMap<K, V, S>` whose hasher is cloneable, so the std
//!   `RandomState` map and `rustc_hash::FxHashMap` share one adapter.
//! - No-overwrite insertion and upsert go through the entry API; each
//!   operation hashes the key once.
//!
//! ## Example Usage
//! ```rust
//! use rustc_hash::FxHashMap;
//! use tallykit::store::AnyMap;
//!
//! let mut fx: FxHashMap<u64, &str> = FxHashMap::default();
//! fx.insert(1, "one");
//!
//! let map = AnyMap::from_backing(fx);
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert!(map.backing_name().contains("HashMap"));
//! ```
//!
//! ## Type Constraints
//! - `K: Eq + Hash + Clone` for lookup and deep copies.
//! - `S: BuildHasher + Clone` so copies keep the same hasher state.
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::{BuildHasher, Hash};

use crate::store::traits::BackingMap;

impl<K, V, S> BackingMap<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn BackingMap<K, V>> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }

    fn get_or_insert_with(&mut self, key: K, make: &mut dyn FnMut() -> V) -> &mut V {
        self.entry(key).or_insert_with(make)
    }

    fn get(&self, key: &K) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        HashMap::get_key_value(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        HashMap::get_mut(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        HashMap::contains_key(self, key)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(HashMap::iter(self))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (&K, &mut V)> + '_> {
        Box::new(HashMap::iter_mut(self))
    }

    fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        match self.entry(key) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => (entry.insert(value), true),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        HashMap::remove(self, key)
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }
}
