//! BTreeMap-backed adapter for [`BackingMap`].
//!
//! Ordered backing: traversal yields keys in ascending order, which makes
//! renderings and `max_value` tie-breaking deterministic. Lookups are
//! O(log n) instead of O(1), so an ordered map is the cheaper *left* operand
//! of an equality check and the dearer *right* one.
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::store::traits::BackingMap;

impl<K, V> BackingMap<K, V> for BTreeMap<K, V>
where
    K: Ord + Clone + 'static,
    V: Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn BackingMap<K, V>> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn get_or_insert_with(&mut self, key: K, make: &mut dyn FnMut() -> V) -> &mut V {
        self.entry(key).or_insert_with(make)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        BTreeMap::get_key_value(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        BTreeMap::get_mut(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        BTreeMap::contains_key(self, key)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(BTreeMap::iter(self))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (&K, &mut V)> + '_> {
        Box::new(BTreeMap::iter_mut(self))
    }

    fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        match self.entry(key) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => (entry.insert(value), true),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }
}
