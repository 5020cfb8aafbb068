//! Two-level key → counter mapping for conditional frequency distributions.
//!
//! A [`CounterMap<K, V>`] associates each top-level key with a nested
//! [`Counter<V>`]. Nested counters are manufactured lazily by an owned
//! [`CounterFactory`] the first time a key is written, and the grand total
//! over every nested count is cached in a relaxed [`NumCache`].
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │                        CounterMap<K, V>                           │
//!   │                                                                   │
//!   │   counters: AnyMap<K, Counter<V>>                                 │
//!   │   ┌─────────┬──────────────────────────┐                          │
//!   │   │ "the"   │ Counter { cat:2, dog:1 } │                          │
//!   │   │ "a"     │ Counter { cat:1 }        │                          │
//!   │   └─────────┴──────────────────────────┘                          │
//!   │                                                                   │
//!   │   factory: Box<dyn CounterFactory<V>>   (owned, cloned on copy)   │
//!   │   total:   NumCache<Count>              (always relaxed)          │
//!   └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Path
//!
//! Every write goes through [`ensure_counter`](CounterMap::ensure_counter),
//! which creates the nested counter on a miss and invalidates the grand
//! total. The grand total is recomputed from the nested counters' own
//! (possibly cached) totals on the next [`total_count`](CounterMap::total_count).
//!
//! ## Key Lifetime
//!
//! Removing a value never removes its key: after
//! `remove_value(&k, &v)` empties the nested counter, `contains(&k)` is still
//! `true` and `len_of(&k)` is 0. Only [`remove`](CounterMap::remove) drops a
//! key.
//!
//! ## Example Usage
//!
//! ```
//! use tallykit::counter_map::CounterMap;
//!
//! let mut follows: CounterMap<&str, &str> = CounterMap::new();
//! follows.increment_count("the", "cat", 1.0);
//! follows.increment_count("the", "cat", 1.0);
//! follows.increment_count("the", "dog", 1.0);
//! follows.increment_count("a", "cat", 1.0);
//!
//! assert_eq!(follows.len(), 2);
//! assert_eq!(follows.get_count(&"the", &"cat"), 2.0);
//! assert_eq!(follows.total_count(), 4.0);
//!
//! follows.conditional_normalize();
//! assert_eq!(follows.total_count_of(&"the"), 1.0);
//! assert_eq!(follows.total_count(), 2.0);
//! ```
use std::fmt;
use std::hash::Hash;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use tracing::{debug, trace};

use crate::counter::{Count, Counter, MAPPING_DELIMITER};
use crate::ds::num_cache::NumCache;
use crate::factory::{CounterFactory, DefaultCounterFactory};
use crate::store::{AnyMap, Iter};

/// Map from keys to nested counters, plus a cached grand total.
pub struct CounterMap<K, V> {
    counters: AnyMap<K, Counter<V>>,
    factory: Box<dyn CounterFactory<V>>,
    total: NumCache<Count>,
}

impl<K, V> CounterMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Eq + Hash + Clone + 'static,
{
    /// Creates an empty `HashMap`-backed map producing default counters.
    pub fn new() -> Self {
        Self::from_parts(AnyMap::new(), &DefaultCounterFactory)
    }
}

impl<K, V> CounterMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Creates an empty `HashMap`-backed map using a clone of `factory`.
    pub fn with_factory(factory: &dyn CounterFactory<V>) -> Self {
        Self::from_parts(AnyMap::new(), factory)
    }
}

impl<K, V> CounterMap<K, V> {
    /// Creates a map over `counters`, owning a clone of `factory`.
    pub fn from_parts(counters: AnyMap<K, Counter<V>>, factory: &dyn CounterFactory<V>) -> Self {
        Self {
            counters,
            factory: factory.clone_box(),
            total: NumCache::new(),
        }
    }

    /// Exchanges contents, factory, and cache with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        self.counters.swap(&mut other.counters);
        std::mem::swap(&mut self.factory, &mut other.factory);
        std::mem::swap(&mut self.total, &mut other.total);
    }

    /// Returns the nested counter for `key`, creating it with the factory if
    /// absent. Invalidates the grand total.
    pub fn ensure_counter(&mut self, key: K) -> &mut Counter<V> {
        self.total.reset();
        let factory = &self.factory;
        self.counters.get_or_insert_with(key, || {
            trace!("creating nested counter");
            factory.create_counter()
        })
    }

    // -- modifiers --------------------------------------------------------

    /// Adds `amount` to the count of `value` under `key`.
    pub fn increment_count(&mut self, key: K, value: V, amount: Count) {
        self.ensure_counter(key).increment_count(value, amount);
        self.total.reset();
    }

    /// Sets the count of `value` under `key` to exactly `amount`.
    pub fn set_count(&mut self, key: K, value: V, amount: Count) {
        self.ensure_counter(key).set_count(value, amount);
        self.total.reset();
    }

    /// Removes `key` and its nested counter. Returns `true` if it existed.
    pub fn remove(&mut self, key: &K) -> bool {
        let removed = self.counters.erase(key) > 0;
        if removed {
            self.total.reset();
        }
        removed
    }

    /// Removes `value` from the counter under `key`, returning its former
    /// count. The key stays present even if its counter becomes empty.
    pub fn remove_value(&mut self, key: &K, value: &V) -> Option<Count> {
        let removed = self.counters.get_mut(key)?.remove(value);
        if removed.is_some() {
            self.total.reset();
        }
        removed
    }

    /// Normalizes every nested counter independently.
    pub fn conditional_normalize(&mut self) {
        debug!(keys = self.counters.len(), "normalizing nested counters");
        for (_, counter) in self.counters.iter_mut() {
            counter.normalize();
        }
        self.total.reset();
    }

    // -- lookup -----------------------------------------------------------

    /// Returns `true` if `key` has a nested counter.
    pub fn contains(&self, key: &K) -> bool {
        self.counters.contains_key(key)
    }

    /// Returns `true` if the counter under `key` has a count for `value`.
    pub fn contains_value(&self, key: &K, value: &V) -> bool {
        self.get_counter(key)
            .is_some_and(|counter| counter.contains(value))
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Number of values in the counter under `key`, or 0 if absent.
    pub fn len_of(&self, key: &K) -> usize {
        self.get_counter(key).map_or(0, Counter::len)
    }

    /// Returns `true` if there are no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Count of `value` under `key`, or 0 if either is absent.
    pub fn get_count(&self, key: &K, value: &V) -> Count {
        self.get_counter(key)
            .map_or(0.0, |counter| counter.get_count(value))
    }

    /// Sum of every count in every nested counter.
    pub fn total_count(&self) -> Count {
        if !self.total.is_synced() {
            let sum: Count = self
                .counters
                .values()
                .map(Counter::total_count)
                .sum();
            trace!(keys = self.len(), total = sum, "recomputed grand total");
            self.total.set(sum);
        }
        self.total.get()
    }

    /// Total of the counter under `key`, or 0 if absent.
    pub fn total_count_of(&self, key: &K) -> Count {
        self.get_counter(key).map_or(0.0, Counter::total_count)
    }

    /// Returns `true` if the cached grand total is currently trusted.
    pub fn is_total_synced(&self) -> bool {
        self.total.is_synced()
    }

    /// Borrows the counter under `key`, if any.
    pub fn get_counter(&self, key: &K) -> Option<&Counter<V>> {
        self.counters.get(key)
    }

    /// Iterates over `(key, counter)` pairs in backing order.
    pub fn iter(&self) -> Iter<'_, K, Counter<V>> {
        self.counters.iter()
    }

    /// Compares nested counters pairwise with [`Counter::equals`].
    pub fn equals(&self, other: &Self, precision: Count) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        self.counters.iter().all(|(key, counter)| {
            other
                .counters
                .get(key)
                .is_some_and(|theirs| counter.equals(theirs, precision))
        })
    }
}

impl<K, V> Clone for CounterMap<K, V> {
    /// Deep-copies the counters and re-clones the factory.
    fn clone(&self) -> Self {
        Self {
            counters: self.counters.clone(),
            factory: self.factory.clone_box(),
            total: self.total.clone(),
        }
    }
}

impl<K, V> Default for CounterMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for CounterMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.counters == other.counters
    }
}

impl<'a, K, V> IntoIterator for &'a CounterMap<K, V> {
    type Item = (&'a K, &'a Counter<V>);
    type IntoIter = Iter<'a, K, Counter<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CounterMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterMap")
            .field("counters", &self.counters)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for CounterMap<K, V> {
    /// One ` key=>[value=>count, ...]` line per key, inside brackets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for (key, counter) in self.iter() {
            writeln!(f, " {key}{MAPPING_DELIMITER}{counter}")?;
        }
        f.write_str("]")
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

impl<K: Clone, V: Clone> AddAssign<&CounterMap<K, V>> for CounterMap<K, V> {
    /// Adds `rhs`'s nested counters key by key; missing keys are created.
    fn add_assign(&mut self, rhs: &CounterMap<K, V>) {
        for (key, counter) in rhs.iter() {
            *self.ensure_counter(key.clone()) += counter;
        }
    }
}

impl<K: Clone, V: Clone> SubAssign<&CounterMap<K, V>> for CounterMap<K, V> {
    fn sub_assign(&mut self, rhs: &CounterMap<K, V>) {
        for (key, counter) in rhs.iter() {
            *self.ensure_counter(key.clone()) -= counter;
        }
    }
}

impl<K, V> MulAssign<Count> for CounterMap<K, V> {
    /// Scales every nested counter by `n`.
    fn mul_assign(&mut self, n: Count) {
        for (_, counter) in self.counters.iter_mut() {
            *counter *= n;
        }
        self.total.reset();
    }
}

impl<K, V> DivAssign<Count> for CounterMap<K, V> {
    fn div_assign(&mut self, n: Count) {
        for (_, counter) in self.counters.iter_mut() {
            *counter /= n;
        }
        self.total.reset();
    }
}

impl<K: Clone, V: Clone> Add<&CounterMap<K, V>> for &CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn add(self, rhs: &CounterMap<K, V>) -> CounterMap<K, V> {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl<K: Clone, V: Clone> Add<&CounterMap<K, V>> for CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn add(mut self, rhs: &CounterMap<K, V>) -> CounterMap<K, V> {
        self += rhs;
        self
    }
}

impl<K: Clone, V: Clone> Add<CounterMap<K, V>> for &CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    /// Reuses the right operand's storage; addition commutes.
    fn add(self, mut rhs: CounterMap<K, V>) -> CounterMap<K, V> {
        rhs += self;
        rhs
    }
}

impl<K: Clone, V: Clone> Add<CounterMap<K, V>> for CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn add(mut self, rhs: CounterMap<K, V>) -> CounterMap<K, V> {
        self += &rhs;
        self
    }
}

impl<K: Clone, V: Clone> Sub<&CounterMap<K, V>> for &CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn sub(self, rhs: &CounterMap<K, V>) -> CounterMap<K, V> {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl<K: Clone, V: Clone> Sub<&CounterMap<K, V>> for CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn sub(mut self, rhs: &CounterMap<K, V>) -> CounterMap<K, V> {
        self -= rhs;
        self
    }
}

impl<K: Clone, V: Clone> Sub<CounterMap<K, V>> for CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn sub(mut self, rhs: CounterMap<K, V>) -> CounterMap<K, V> {
        self -= &rhs;
        self
    }
}

impl<K, V> Mul<Count> for &CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn mul(self, n: Count) -> CounterMap<K, V> {
        let mut out = self.clone();
        out *= n;
        out
    }
}

impl<K, V> Mul<Count> for CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn mul(mut self, n: Count) -> CounterMap<K, V> {
        self *= n;
        self
    }
}

impl<K, V> Mul<&CounterMap<K, V>> for Count {
    type Output = CounterMap<K, V>;

    fn mul(self, map: &CounterMap<K, V>) -> CounterMap<K, V> {
        map * self
    }
}

impl<K, V> Mul<CounterMap<K, V>> for Count {
    type Output = CounterMap<K, V>;

    fn mul(self, map: CounterMap<K, V>) -> CounterMap<K, V> {
        map * self
    }
}

impl<K, V> Div<Count> for &CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn div(self, n: Count) -> CounterMap<K, V> {
        let mut out = self.clone();
        out /= n;
        out
    }
}

impl<K, V> Div<Count> for CounterMap<K, V> {
    type Output = CounterMap<K, V>;

    fn div(mut self, n: Count) -> CounterMap<K, V> {
        self /= n;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod property_tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Increment(u8, u8, i8),
        Set(u8, u8, i8),
        RemoveValue(u8, u8),
        Remove(u8),
        Scale(i8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<u8>(), any::<i8>())
                .prop_map(|(k, v, n)| Op::Increment(k % 8, v % 8, n)),
            (any::<u8>(), any::<u8>(), any::<i8>()).prop_map(|(k, v, n)| Op::Set(k % 8, v % 8, n)),
            (any::<u8>(), any::<u8>()).prop_map(|(k, v)| Op::RemoveValue(k % 8, v % 8)),
            any::<u8>().prop_map(|k| Op::Remove(k % 8)),
            prop_oneof![Just(-1_i8), Just(1), Just(2)].prop_map(Op::Scale),
        ]
    }

    fn apply(map: &mut CounterMap<u8, u8>, op: &Op) {
        match *op {
            Op::Increment(k, v, n) => map.increment_count(k, v, Count::from(n)),
            Op::Set(k, v, n) => map.set_count(k, v, Count::from(n)),
            Op::RemoveValue(k, v) => {
                map.remove_value(&k, &v);
            },
            Op::Remove(k) => {
                map.remove(&k);
            },
            Op::Scale(n) => *map *= Count::from(n),
        }
    }

    proptest! {
        /// Property: the grand total always equals the sum of nested totals
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_grand_total_matches_nested_totals(
            ops in prop::collection::vec(op_strategy(), 1..48)
        ) {
            let mut map = CounterMap::new();
            for op in &ops {
                apply(&mut map, op);
                let nested: Count = map.iter().map(|(_, counter)| counter.total_count()).sum();
                prop_assert_eq!(map.total_count(), nested);
            }
        }

        /// Property: the same operations give equal maps on any outer backing
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_outer_backing_does_not_change_contents(
            ops in prop::collection::vec(op_strategy(), 1..48)
        ) {
            let mut hashed = CounterMap::new();
            let mut ordered = CounterMap::from_parts(
                AnyMap::from_backing(BTreeMap::new()),
                &DefaultCounterFactory,
            );
            for op in &ops {
                apply(&mut hashed, op);
                apply(&mut ordered, op);
            }
            prop_assert!(hashed == ordered);
            prop_assert!(ordered == hashed);
        }

        /// Property: a clone is unaffected by later writes to the source
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_clone_is_independent(
            before in prop::collection::vec(op_strategy(), 0..24),
            after in prop::collection::vec(op_strategy(), 1..24)
        ) {
            let mut map = CounterMap::new();
            let mut replay = CounterMap::new();
            for op in &before {
                apply(&mut map, op);
                apply(&mut replay, op);
            }
            let frozen = map.clone();
            for op in &after {
                apply(&mut map, op);
            }
            prop_assert!(frozen == replay);
            prop_assert_eq!(frozen.total_count(), replay.total_count());
        }
    }
}
