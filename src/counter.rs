//! Frequency counter with a lazily synchronized total.
//!
//! A [`Counter<V>`] maps values to floating-point counts. Storage is an
//! [`AnyMap<V, Count>`], so the backing container is pluggable; the sum of
//! all counts is cached in a [`NumCache`] so repeated total queries do not
//! re-sum the map.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────────────┐
//!   │                        Counter<V>                           │
//!   │                                                             │
//!   │   counts: AnyMap<V, Count>          total: NumCache<Count>  │
//!   │   ┌──────────┬────────┐             ┌─────────────────────┐ │
//!   │   │ "bishop" │  2.0   │             │ value: 4.0          │ │
//!   │   │ "king"   │  1.0   │  mutations  │ synced: true        │ │
//!   │   │ "queen"  │  1.0   │ ──────────► │ policy: Relaxed     │ │
//!   │   └──────────┴────────┘  adjust_*   └─────────────────────┘ │
//!   └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cache Coherency
//!
//! Every modifier reports its effect on the total to the cache:
//!
//! | Operation              | Cache update                         |
//! |------------------------|--------------------------------------|
//! | `increment_count(v, d)`| `+= d`                               |
//! | `set_count(v, c)`      | `+= c - previous`                    |
//! | `remove(v)`            | `-= previous`                        |
//! | `+= n` / `-= n`        | `+= n * len` / `-= n * len`          |
//! | `*= n` / `/= n`        | `*= n` / `*= 1/n`                    |
//! | `normalize()`          | `set(1.0)`, or `set(0.0)` if empty   |
//!
//! Under [`CachePolicy::Relaxed`] each update invalidates the cache and the
//! next [`total_count`](Counter::total_count) re-sums once; under
//! [`CachePolicy::Persistent`] the cached total follows every update.
//!
//! ## Example Usage
//!
//! ```
//! use tallykit::counter::Counter;
//!
//! let mut pieces: Counter<&str> = ["king", "queen", "bishop", "bishop"].into_iter().collect();
//!
//! assert_eq!(pieces.len(), 3);
//! assert_eq!(pieces.get_count(&"bishop"), 2.0);
//! assert_eq!(pieces.total_count(), 4.0);
//!
//! pieces.normalize();
//! assert_eq!(pieces.get_count(&"bishop"), 0.5);
//! assert_eq!(pieces.total_count(), 1.0);
//! ```
use std::fmt;
use std::hash::Hash;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use tracing::{debug, trace};

use crate::ds::num_cache::{CachePolicy, NumCache};
use crate::store::{AnyMap, Iter};

/// Scalar type used for counts.
pub type Count = f64;

/// Default tolerance for [`Counter::equals`]: machine epsilon of [`Count`].
pub const DEFAULT_PRECISION: Count = Count::EPSILON;

/// Separator between a value and its count in renderings.
pub(crate) const MAPPING_DELIMITER: &str = "=>";

/// Map from values to counts plus a cached total.
#[derive(Clone)]
pub struct Counter<V> {
    counts: AnyMap<V, Count>,
    total: NumCache<Count>,
}

impl<V> Counter<V>
where
    V: Eq + Hash + Clone + 'static,
{
    /// Creates an empty `HashMap`-backed counter whose total is known to be 0.
    pub fn new() -> Self {
        Self {
            counts: AnyMap::new(),
            total: NumCache::synced(0.0, CachePolicy::Relaxed),
        }
    }

    /// Creates a counter by incrementing every item of `values` by `amount`.
    pub fn from_values<I>(values: I, amount: Count) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        let mut counter = Self::new();
        counter.increment_all(values, amount);
        counter
    }
}

impl<V> Counter<V> {
    /// Wraps a pre-built map. The total is unknown until first queried.
    pub fn from_map(counts: AnyMap<V, Count>) -> Self {
        Self {
            counts,
            total: NumCache::new(),
        }
    }

    /// Exchanges contents and cache state with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        self.counts.swap(&mut other.counts);
        std::mem::swap(&mut self.total, &mut other.total);
    }

    // -- modifiers --------------------------------------------------------

    /// Adds `amount` to the count of `value`, creating it at `amount` if absent.
    pub fn increment_count(&mut self, value: V, amount: Count) {
        *self.counts.get_or_insert_default(value) += amount;
        self.total.adjust_add(amount);
    }

    /// Increments every item of `values` by `amount`; duplicates accumulate.
    pub fn increment_all<I>(&mut self, values: I, amount: Count)
    where
        I: IntoIterator<Item = V>,
    {
        for value in values {
            self.increment_count(value, amount);
        }
    }

    /// Sets the count of `value` to exactly `amount`.
    pub fn set_count(&mut self, value: V, amount: Count) {
        let stored = self.counts.get_or_insert_default(value);
        let previous = std::mem::replace(stored, amount);
        self.total.adjust_add(amount - previous);
    }

    /// Removes `value`, returning its former count. No-op if absent.
    pub fn remove(&mut self, value: &V) -> Option<Count> {
        let removed = self.counts.remove(value)?;
        self.total.adjust_sub(removed);
        Some(removed)
    }

    /// Scales all counts so they sum to 1.
    ///
    /// A counter whose total is exactly zero (including an empty one) ends
    /// with every count at 0 and a total of 0.
    pub fn normalize(&mut self) {
        let total = self.total_count();
        if total != 0.0 {
            *self /= total;
            self.total.set(1.0);
        } else {
            debug!(entries = self.len(), "normalizing counter with zero total");
            *self *= 0.0;
            self.total.set(0.0);
        }
    }

    // -- lookup -----------------------------------------------------------

    /// Returns `true` if `value` has a count.
    pub fn contains(&self, value: &V) -> bool {
        self.counts.contains_key(value)
    }

    /// Returns the count of `value`, or 0 if absent.
    pub fn get_count(&self, value: &V) -> Count {
        self.counts.get(value).copied().unwrap_or(0.0)
    }

    /// Sum of all counts.
    ///
    /// Served from the cache when it is synchronized; otherwise re-sums the
    /// map once and refreshes the cache.
    pub fn total_count(&self) -> Count {
        if !self.total.is_synced() {
            let sum: Count = self.counts.values().sum();
            trace!(entries = self.len(), total = sum, "recomputed counter total");
            self.total.set(sum);
        }
        self.total.get()
    }

    /// Value with the strictly greatest count; the first one seen wins ties.
    ///
    /// Only positive counts qualify. Returns `V::default()` when no count is
    /// positive, including for an empty counter.
    pub fn max_value(&self) -> V
    where
        V: Default + Clone,
    {
        let mut best: Option<&V> = None;
        let mut max = Count::MIN_POSITIVE;
        for (value, &count) in self.counts.iter() {
            if count > max {
                max = count;
                best = Some(value);
            }
        }
        best.cloned().unwrap_or_default()
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Largest number of values the backing container supports.
    pub fn max_len(&self) -> usize {
        self.counts.max_len()
    }

    /// Returns `true` if no value has a count.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns `true` if the cached total is currently trusted.
    pub fn is_total_synced(&self) -> bool {
        self.total.is_synced()
    }

    /// Iterates over `(value, count)` pairs in backing order.
    pub fn iter(&self) -> Iter<'_, V, Count> {
        self.counts.iter()
    }

    /// Read-only view of the underlying map.
    pub fn counts(&self) -> &AnyMap<V, Count> {
        &self.counts
    }

    /// Compares counts value by value, tolerating absolute differences
    /// strictly below `precision`. Differing key sets are never equal.
    pub fn equals(&self, other: &Self, precision: Count) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        self.counts.iter().all(|(value, count)| {
            other
                .counts
                .get(value)
                .is_some_and(|theirs| (count - theirs).abs() < precision)
        })
    }

    // -- caching policy ---------------------------------------------------

    /// Changes how the cached total reacts to updates.
    pub fn set_cache_policy(&self, policy: CachePolicy) {
        self.total.set_policy(policy);
    }

    /// Returns the current caching policy.
    pub fn cache_policy(&self) -> CachePolicy {
        self.total.policy()
    }

    /// Forces the next [`total_count`](Self::total_count) to re-sum.
    pub fn reset_cache(&self) {
        self.total.reset();
    }
}

impl<V> Default for Counter<V>
where
    V: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<V> for Counter<V>
where
    V: Eq + Hash + Clone + 'static,
{
    /// Counts each item once.
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_values(iter, 1.0)
    }
}

impl<V> Extend<V> for Counter<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.increment_all(iter, 1.0);
    }
}

impl<V> PartialEq for Counter<V> {
    /// Content equality; cache state never participates.
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl<'a, V> IntoIterator for &'a Counter<V> {
    type Item = (&'a V, &'a Count);
    type IntoIter = Iter<'a, V, Count>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: fmt::Debug> fmt::Debug for Counter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("counts", &self.counts)
            .field("total", &self.total)
            .finish()
    }
}

impl<V: fmt::Display> fmt::Display for Counter<V> {
    /// Renders as `[v1=>c1, v2=>c2]`. Entry order follows the backing map.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, (value, count)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}{MAPPING_DELIMITER}{count}")?;
        }
        f.write_str("]")
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

impl<V: Clone> AddAssign<&Counter<V>> for Counter<V> {
    /// Adds `rhs`'s counts key by key; keys missing here are created.
    fn add_assign(&mut self, rhs: &Counter<V>) {
        for (value, &count) in rhs.iter() {
            self.increment_count(value.clone(), count);
        }
    }
}

impl<V: Clone> SubAssign<&Counter<V>> for Counter<V> {
    fn sub_assign(&mut self, rhs: &Counter<V>) {
        for (value, &count) in rhs.iter() {
            self.increment_count(value.clone(), -count);
        }
    }
}

impl<V> AddAssign<Count> for Counter<V> {
    /// Adds `n` to every existing count.
    fn add_assign(&mut self, n: Count) {
        for (_, count) in self.counts.iter_mut() {
            *count += n;
        }
        self.total.adjust_add(n * self.counts.len() as Count);
    }
}

impl<V> SubAssign<Count> for Counter<V> {
    fn sub_assign(&mut self, n: Count) {
        *self += -n;
    }
}

impl<V> MulAssign<Count> for Counter<V> {
    /// Multiplies every existing count by `n`.
    fn mul_assign(&mut self, n: Count) {
        for (_, count) in self.counts.iter_mut() {
            *count *= n;
        }
        self.total.adjust_mul(n);
    }
}

impl<V> DivAssign<Count> for Counter<V> {
    /// Multiplies by `1 / n`; dividing by zero yields IEEE infinities or NaN.
    fn div_assign(&mut self, n: Count) {
        *self *= 1.0 / n;
    }
}

impl<V: Clone> Add<&Counter<V>> for &Counter<V> {
    type Output = Counter<V>;

    fn add(self, rhs: &Counter<V>) -> Counter<V> {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl<V: Clone> Add<&Counter<V>> for Counter<V> {
    type Output = Counter<V>;

    fn add(mut self, rhs: &Counter<V>) -> Counter<V> {
        self += rhs;
        self
    }
}

impl<V: Clone> Sub<&Counter<V>> for &Counter<V> {
    type Output = Counter<V>;

    fn sub(self, rhs: &Counter<V>) -> Counter<V> {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl<V: Clone> Sub<&Counter<V>> for Counter<V> {
    type Output = Counter<V>;

    fn sub(mut self, rhs: &Counter<V>) -> Counter<V> {
        self -= rhs;
        self
    }
}

macro_rules! scalar_op {
    ($op:ident, $method:ident, $assign:tt) => {
        impl<V: Clone> $op<Count> for &Counter<V> {
            type Output = Counter<V>;

            fn $method(self, n: Count) -> Counter<V> {
                let mut out = self.clone();
                out $assign n;
                out
            }
        }

        impl<V> $op<Count> for Counter<V> {
            type Output = Counter<V>;

            fn $method(mut self, n: Count) -> Counter<V> {
                self $assign n;
                self
            }
        }
    };
}

scalar_op!(Add, add, +=);
scalar_op!(Sub, sub, -=);
scalar_op!(Mul, mul, *=);
scalar_op!(Div, div, /=);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Increment(u8, i16),
        Set(u8, i16),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<i16>()).prop_map(|(v, n)| Op::Increment(v % 16, n)),
            (any::<u8>(), any::<i16>()).prop_map(|(v, n)| Op::Set(v % 16, n)),
            any::<u8>().prop_map(|v| Op::Remove(v % 16)),
        ]
    }

    fn apply(counter: &mut Counter<u8>, op: &Op) -> bool {
        match *op {
            Op::Increment(v, n) => {
                counter.increment_count(v, Count::from(n));
                true
            },
            Op::Set(v, n) => {
                counter.set_count(v, Count::from(n));
                true
            },
            Op::Remove(v) => counter.remove(&v).is_some(),
        }
    }

    fn resum(counter: &Counter<u8>) -> Count {
        counter.iter().map(|(_, c)| *c).sum()
    }

    proptest! {
        /// Property: relaxed cache is unsynced exactly after a mutation
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_relaxed_cache_tracks_mutations(
            ops in prop::collection::vec(op_strategy(), 1..64)
        ) {
            let mut counter = Counter::new();
            for op in &ops {
                let was_synced = counter.is_total_synced();
                let mutated = apply(&mut counter, op);
                if mutated {
                    prop_assert!(!counter.is_total_synced());
                } else {
                    prop_assert_eq!(counter.is_total_synced(), was_synced);
                }
            }
            let total = counter.total_count();
            prop_assert!(counter.is_total_synced());
            prop_assert_eq!(total, resum(&counter));
        }

        /// Property: persistent cache stays exact for integral counts
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_persistent_cache_matches_resum(
            ops in prop::collection::vec(op_strategy(), 1..64)
        ) {
            let mut counter = Counter::new();
            counter.set_cache_policy(CachePolicy::Persistent);
            for op in &ops {
                apply(&mut counter, op);
                prop_assert!(counter.is_total_synced());
                prop_assert_eq!(counter.total_count(), resum(&counter));
            }
        }

        /// Property: persistent increment adds exactly d to a synced total
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_persistent_increment_is_exact(
            values in prop::collection::vec(any::<u8>(), 0..32),
            target in any::<u8>(),
            delta in -1000i32..1000,
        ) {
            let counter_base: Counter<u8> = values.into_iter().collect();
            let mut counter = counter_base.clone();
            counter.set_cache_policy(CachePolicy::Persistent);
            let before = counter.total_count();
            counter.increment_count(target, Count::from(delta));
            prop_assert_eq!(counter.total_count(), before + Count::from(delta));
        }
    }
}
