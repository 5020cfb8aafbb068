//! Value-semantic, type-erased associative container.
//!
//! [`AnyMap<K, V>`] hides the concrete map implementation behind one static
//! type. The backing container is chosen at construction time and fixed for
//! the lifetime of the wrapper.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │        AnyMap<K, V>          │
//!   │                              │
//!   │  inner: Box<dyn BackingMap>  │──────┐
//!   └──────────────────────────────┘      │ exclusively owned
//!                                         ▼
//!            ┌───────────────────────────────────────────────┐
//!            │          dyn BackingMap<K, V>                 │
//!            │  clone_box / len / get / insert / iter / ...  │
//!            └───────────┬───────────────────────┬───────────┘
//!                        │                       │
//!                        ▼                       ▼
//!            HashMap<K, V, S> adapter     BTreeMap<K, V> adapter
//!            (std, FxHash, custom S)      (ordered traversal)
//! ```
//!
//! ## Value Semantics
//!
//! - `Clone` deep-copies the backing container through `clone_box`; the copy
//!   and the source never alias.
//! - Moving transfers the box without copying. `std::mem::take` leaves the
//!   source as an empty default-backed map.
//! - Equality is by content and ignores the backing type: equal sizes and
//!   every `(key, value)` of the left side found with an equal value on the
//!   right side.
//!
//! ## Performance Notes
//!
//! Equality traverses the left operand and probes the right one, so
//! `ordered == hashed` is cheaper than `hashed == ordered` for large maps.
//! The *result* is symmetric; only the cost is not.
//!
//! ## Example Usage
//!
//! ```
//! use std::collections::{BTreeMap, HashMap};
//!
//! use tallykit::store::AnyMap;
//!
//! let mut hashed: AnyMap<&str, u32> = AnyMap::from_backing(HashMap::new());
//! let mut ordered: AnyMap<&str, u32> = AnyMap::from_backing(BTreeMap::new());
//!
//! for (k, v) in [("one", 1), ("two", 2)] {
//!     hashed.insert(k, v);
//!     ordered.insert(k, v);
//! }
//!
//! // Same contents, different containers.
//! assert_eq!(hashed, ordered);
//!
//! // Indexed access inserts a default value on a miss.
//! *hashed.get_or_insert_default("three") += 3;
//! assert_eq!(hashed.len(), 3);
//! assert_ne!(hashed, ordered);
//!
//! // Checked access fails instead.
//! assert!(ordered.at(&"three").is_err());
//! ```
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::{Fuse, FusedIterator};

use crate::error::OutOfRange;
use crate::store::traits::BackingMap;

/// Type-erased map owning exactly one backing container.
pub struct AnyMap<K, V> {
    inner: Box<dyn BackingMap<K, V>>,
}

impl<K, V> AnyMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Creates an empty map backed by a std `HashMap`.
    pub fn new() -> Self {
        Self::from_backing(HashMap::<K, V, RandomState>::new())
    }

    /// Creates an empty `HashMap`-backed map with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_backing(HashMap::<K, V, RandomState>::with_capacity(capacity))
    }
}

impl<K, V> AnyMap<K, V> {
    /// Wraps `backing`, taking ownership of it.
    ///
    /// Pass `backing.clone()` to keep the original container.
    pub fn from_backing<M>(backing: M) -> Self
    where
        M: BackingMap<K, V> + 'static,
    {
        Self {
            inner: Box::new(backing),
        }
    }

    /// Type name of the concrete backing container.
    pub fn backing_name(&self) -> &'static str {
        self.inner.type_name()
    }

    /// Exchanges backing containers with `other` without copying entries.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns the largest number of entries the backing container supports.
    pub fn max_len(&self) -> usize {
        self.inner.max_len()
    }

    /// Returns the value for `key`, inserting `V::default()` if absent.
    ///
    /// Grows the map by one on a miss.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.inner.get_or_insert_with(key, &mut V::default)
    }

    /// Returns the value for `key`, inserting `make()` if absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, mut make: F) -> &mut V
    where
        F: FnMut() -> V,
    {
        self.inner.get_or_insert_with(key, &mut make)
    }

    /// Checked lookup.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if `key` is not stored.
    pub fn at(&self, key: &K) -> Result<&V, OutOfRange> {
        let backing = self.inner.type_name();
        self.inner
            .get(key)
            .ok_or_else(|| OutOfRange::missing_key(backing))
    }

    /// Checked mutable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if `key` is not stored.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, OutOfRange> {
        let backing = self.inner.type_name();
        self.inner
            .get_mut(key)
            .ok_or_else(|| OutOfRange::missing_key(backing))
    }

    /// Fetch a value by key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Fetch a mutable value by key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    /// Locates the stored entry for `key`; `None` plays the role of the
    /// past-the-end position.
    pub fn find(&self, key: &K) -> Option<(&K, &V)> {
        self.inner.get_key_value(key)
    }

    /// Returns `true` if `key` is stored.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of entries stored under `key` (0 or 1).
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.inner.contains_key(key))
    }

    /// Forward iterator over `(key, value)` pairs in backing order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.inner.iter().fuse(),
        }
    }

    /// Forward iterator with mutable access to values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.inner.iter_mut().fuse(),
        }
    }

    /// Iterator over stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterator over stored values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Inserts `value` under `key` unless the key already exists.
    ///
    /// Returns the stored value together with `true` when inserted, or the
    /// untouched existing value with `false` on a duplicate.
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        self.inner.insert(key, value)
    }

    /// Inserts every pair from `entries` individually with the same
    /// no-overwrite rule as [`insert`](Self::insert).
    pub fn insert_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.inner.insert(key, value);
        }
    }

    /// Removes `key`, returning how many entries were erased (0 or 1).
    pub fn erase(&mut self, key: &K) -> usize {
        usize::from(self.inner.remove(key).is_some())
    }

    /// Removes `key`, returning its value if it was stored.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<K, V> Clone for AnyMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl<K, V> Default for AnyMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for AnyMap<K, V>
where
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
    }
}

impl<K, V> Eq for AnyMap<K, V> where V: Eq {}

impl<K, V> fmt::Debug for AnyMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for AnyMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher + Clone + 'static,
{
    fn from(map: HashMap<K, V, S>) -> Self {
        Self::from_backing(map)
    }
}

impl<K, V> From<BTreeMap<K, V>> for AnyMap<K, V>
where
    K: Ord + Clone + 'static,
    V: Clone + 'static,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::from_backing(map)
    }
}

impl<K, V> FromIterator<(K, V)> for AnyMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Builds a `HashMap`-backed map; the first occurrence of a key wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.insert_all(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a AnyMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut AnyMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

// ---------------------------------------------------------------------------
// Opaque iterators
// ---------------------------------------------------------------------------

/// Single-pass forward iterator over an [`AnyMap`], whatever its backing.
pub struct Iter<'a, K, V> {
    inner: Fuse<Box<dyn Iterator<Item = (&'a K, &'a V)> + 'a>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

// Fused over any backing, including ones whose iterators are not.
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}

/// Single-pass forward iterator yielding mutable values.
pub struct IterMut<'a, K, V> {
    inner: Fuse<Box<dyn Iterator<Item = (&'a K, &'a mut V)> + 'a>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<K, V> fmt::Debug for IterMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;

    use super::*;

    const NEW_KEY: &str = "brand-new";

    fn words() -> Vec<(&'static str, i32)> {
        vec![("one", 1), ("two", 2), ("three", 3), ("four", 4)]
    }

    fn hashed() -> AnyMap<&'static str, i32> {
        AnyMap::from_backing(words().into_iter().collect::<HashMap<_, _>>())
    }

    fn ordered() -> AnyMap<&'static str, i32> {
        AnyMap::from_backing(words().into_iter().collect::<BTreeMap<_, _>>())
    }

    // -- construction -----------------------------------------------------

    #[test]
    fn default_map_is_empty_hashmap() {
        let map: AnyMap<u32, u32> = AnyMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert!(map.backing_name().contains("HashMap"));
    }

    #[test]
    fn from_backing_keeps_contents() {
        let map = ordered();
        assert_eq!(map.len(), 4);
        assert!(map.backing_name().contains("BTreeMap"));
        assert_eq!(map.get(&"three"), Some(&3));
    }

    #[test]
    fn from_conversions_pick_backing() {
        let a: AnyMap<u8, u8> = HashMap::from([(1, 1)]).into();
        let b: AnyMap<u8, u8> = BTreeMap::from([(1, 1)]).into();
        assert!(a.backing_name().contains("HashMap"));
        assert!(b.backing_name().contains("BTreeMap"));
        assert_eq!(a, b);
    }

    #[test]
    fn clone_is_independent() {
        let original = ordered();
        let mut copy = original.clone();
        *copy.get_or_insert_default("one") = 100;
        copy.insert(NEW_KEY, 0);
        assert_eq!(original.get(&"one"), Some(&1));
        assert_eq!(original.len(), 4);
        assert_eq!(copy.len(), 5);
        assert!(copy.backing_name().contains("BTreeMap"));
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = hashed();
        let moved = std::mem::take(&mut source);
        assert_eq!(moved.len(), 4);
        assert!(source.is_empty());
    }

    #[test]
    fn swap_exchanges_backings() {
        let mut a = hashed();
        let mut b: AnyMap<&str, i32> = AnyMap::from_backing(BTreeMap::new());
        a.swap(&mut b);
        assert!(a.is_empty());
        assert!(a.backing_name().contains("BTreeMap"));
        assert_eq!(b.len(), 4);
        assert!(b.backing_name().contains("HashMap"));
    }

    // -- lookup -----------------------------------------------------------

    #[test]
    fn get_or_insert_default_inserts_on_miss() {
        let mut map = hashed();
        assert_eq!(*map.get_or_insert_default("two"), 2);
        assert_eq!(map.count(&NEW_KEY), 0);
        assert_eq!(*map.get_or_insert_default(NEW_KEY), 0);
        assert_eq!(map.count(&NEW_KEY), 1);
        assert_eq!(map.len(), 5);
        assert!(map.len() < map.max_len());
    }

    #[test]
    fn at_fails_with_out_of_range_on_missing_key() {
        let mut map = ordered();
        assert_eq!(map.at(&"four"), Ok(&4));
        *map.at_mut(&"four").unwrap() += 1;
        assert_eq!(map.at(&"four"), Ok(&5));

        let err = map.at(&NEW_KEY).unwrap_err();
        assert!(err.message().contains("BTreeMap"));
        assert!(map.at_mut(&NEW_KEY).is_err());
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn find_returns_stored_entry_or_none() {
        let map = hashed();
        assert_eq!(map.find(&"one"), Some((&"one", &1)));
        assert_eq!(map.find(&NEW_KEY), None);
        assert!(map.contains_key(&"one"));
        assert!(!map.contains_key(&NEW_KEY));
    }

    // -- traversal --------------------------------------------------------

    #[test]
    fn empty_map_iterator_is_exhausted() {
        let map: AnyMap<u32, u32> = AnyMap::new();
        assert_eq!(map.iter().next(), None);
    }

    #[test]
    fn iteration_visits_every_entry_once() {
        let map = hashed();
        let mut seen: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        seen.sort();
        let mut expected = words();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(map.keys().count(), 4);
        assert_eq!(map.values().sum::<i32>(), 10);
    }

    /// Backing whose iterators resume after reporting exhaustion.
    #[derive(Clone, Default)]
    struct Resuming(BTreeMap<u8, i32>);

    /// Yields `None` once between passes over `entries`.
    struct Restart<T> {
        entries: Vec<T>,
        pos: usize,
    }

    impl<T: Copy> Iterator for Restart<T> {
        type Item = T;

        fn next(&mut self) -> Option<T> {
            let item = self.entries.get(self.pos).copied();
            self.pos = if item.is_some() { self.pos + 1 } else { 0 };
            item
        }
    }

    impl BackingMap<u8, i32> for Resuming {
        fn clone_box(&self) -> Box<dyn BackingMap<u8, i32>> {
            Box::new(self.clone())
        }

        fn len(&self) -> usize {
            self.0.len()
        }

        fn get_or_insert_with(&mut self, key: u8, make: &mut dyn FnMut() -> i32) -> &mut i32 {
            self.0.entry(key).or_insert_with(make)
        }

        fn get(&self, key: &u8) -> Option<&i32> {
            self.0.get(key)
        }

        fn get_key_value(&self, key: &u8) -> Option<(&u8, &i32)> {
            self.0.get_key_value(key)
        }

        fn get_mut(&mut self, key: &u8) -> Option<&mut i32> {
            self.0.get_mut(key)
        }

        fn iter(&self) -> Box<dyn Iterator<Item = (&u8, &i32)> + '_> {
            Box::new(Restart {
                entries: self.0.iter().collect(),
                pos: 0,
            })
        }

        fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (&u8, &mut i32)> + '_> {
            Box::new(self.0.iter_mut())
        }

        fn insert(&mut self, key: u8, value: i32) -> (&mut i32, bool) {
            let inserted = !self.0.contains_key(&key);
            (self.0.entry(key).or_insert(value), inserted)
        }

        fn remove(&mut self, key: &u8) -> Option<i32> {
            self.0.remove(key)
        }

        fn clear(&mut self) {
            self.0.clear();
        }
    }

    #[test]
    fn iterators_stay_exhausted_over_resuming_backing() {
        let mut map = AnyMap::from_backing(Resuming::default());
        map.insert(1, 10);
        map.insert(2, 20);

        let mut iter = map.iter();
        assert_eq!(iter.by_ref().count(), 2);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
        assert_eq!(map.keys().count(), 2);
        assert_eq!(map.values().sum::<i32>(), 30);
    }

    #[test]
    fn ordered_backing_iterates_sorted() {
        let map = ordered();
        let keys: Vec<_> = (&map).into_iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["four", "one", "three", "two"]);
    }

    #[test]
    fn iter_mut_updates_values() {
        let mut map = hashed();
        for (_, v) in &mut map {
            *v *= 2;
        }
        assert_eq!(map.get(&"four"), Some(&8));
    }

    // -- modifiers --------------------------------------------------------

    #[test]
    fn insert_does_not_overwrite() {
        let mut map = hashed();
        let (value, inserted) = map.insert("one", 99);
        assert!(!inserted);
        assert_eq!(*value, 1);

        let (value, inserted) = map.insert(NEW_KEY, 7);
        assert!(inserted);
        assert_eq!(*value, 7);
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn insert_all_adds_missing_keys_only() {
        let mut map = ordered();
        map.insert_all([("one", 10), ("five", 5), ("six", 6)]);
        assert_eq!(map.len(), 6);
        assert_eq!(map.get(&"one"), Some(&1));
        assert_eq!(map.get(&"six"), Some(&6));
    }

    #[test]
    fn from_iterator_first_occurrence_wins() {
        let map: AnyMap<&str, i32> = [("a", 1), ("a", 2)].into_iter().collect();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&"a"), Some(&1));
    }

    #[test]
    fn erase_reports_removed_count() {
        let mut map = hashed();
        assert_eq!(map.erase(&"one"), 1);
        assert_eq!(map.erase(&"one"), 0);
        assert_eq!(map.remove(&"two"), Some(2));
        assert_eq!(map.remove(&"two"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn clear_empties_map() {
        let mut map = ordered();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    // -- equality ---------------------------------------------------------

    #[test]
    fn empty_maps_are_equal_across_backings() {
        let a: AnyMap<&str, i32> = AnyMap::from_backing(HashMap::new());
        let b: AnyMap<&str, i32> = AnyMap::from_backing(BTreeMap::new());
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(a, a);
    }

    #[test]
    fn equality_is_content_based_and_symmetric() {
        let a = hashed();
        let b = ordered();
        let c: AnyMap<&str, i32> =
            AnyMap::from_backing(words().into_iter().collect::<FxHashMap<_, _>>());
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(b, c);

        let mut d = b.clone();
        *d.get_or_insert_default("one") = -1;
        assert_ne!(a, d);
        assert_ne!(d, a);

        let mut e = b.clone();
        e.insert(NEW_KEY, 0);
        assert_ne!(a, e);
        assert_ne!(e, a);
    }

    #[test]
    fn debug_renders_as_map() {
        let mut map: AnyMap<&str, i32> = AnyMap::from_backing(BTreeMap::new());
        map.insert("a", 1);
        assert_eq!(format!("{:?}", map), r#"{"a": 1}"#);
    }
}
