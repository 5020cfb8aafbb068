//! Cached scalar with an explicit synchronization flag.
//!
//! A [`NumCache`] remembers one number (typically a running total) together
//! with whether that number can be trusted. Owners call [`set`](NumCache::set)
//! after recomputing, and feed every mutation through the compound operators
//! so the cache can either follow along or invalidate itself.
//!
//! ## State Machine
//!
//! ```text
//!                 set(v)                        set(v)
//!   ┌──────────────┐ ─────────────────────► ┌──────────────────┐ ◄──┐
//!   │ Unsynced     │                        │ Synced(value)    │    │ op(n), Persistent:
//!   │ get() → 0    │ ◄───────────────────── │ get() → value    │ ───┘ value ∘= n
//!   └──────────────┘   reset()              └──────────────────┘
//!                      op(n), Relaxed
//! ```
//!
//! `op` is any of `+=`, `-=`, `*=`, `/=`. Under [`CachePolicy::Relaxed`] the
//! delta is discarded and the cache drops to `Unsynced`; under
//! [`CachePolicy::Persistent`] the delta is applied to the stored value.
//!
//! ## Policy Trade-off
//!
//! | Policy       | Update cost | Total query after updates | Rounding drift |
//! |--------------|-------------|---------------------------|----------------|
//! | `Relaxed`    | O(1)        | one O(n) re-sum           | none           |
//! | `Persistent` | O(1)        | O(1)                      | accumulates    |
//!
//! ## Interior Mutability
//!
//! All state lives in [`Cell`]s, so `set`, `reset`, and policy changes work
//! through `&self`. The cached number is bookkeeping, not logical content;
//! an owner observed immutably can still refresh or invalidate it. The type
//! is therefore `!Sync`.
//!
//! ## Example Usage
//!
//! ```
//! use tallykit::ds::{CachePolicy, NumCache};
//!
//! let cache = NumCache::synced(10.0_f64, CachePolicy::Relaxed);
//! assert!(cache.is_synced());
//!
//! cache.adjust_add(2.0);
//! assert!(!cache.is_synced());
//! assert_eq!(cache.get(), 0.0);
//!
//! cache.set_policy(CachePolicy::Persistent);
//! cache.set(10.0);
//! cache.adjust_add(2.0);
//! assert_eq!(cache.get(), 12.0);
//! ```
use std::cell::Cell;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// How a [`NumCache`] reacts to arithmetic updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Apply every update to the cached value; it stays synchronized.
    Persistent,
    /// Invalidate the cached value on every update.
    #[default]
    Relaxed,
}

/// One cached number plus its synchronization flag and update policy.
#[derive(Debug, Clone, Default)]
pub struct NumCache<N: Copy> {
    value: Cell<N>,
    synced: Cell<bool>,
    policy: Cell<CachePolicy>,
}

impl<N> NumCache<N>
where
    N: Copy + Default,
{
    /// Creates an unsynchronized cache with the relaxed policy.
    pub fn new() -> Self {
        Self::with_state(N::default(), CachePolicy::Relaxed, false)
    }

    /// Creates a cache synchronized at `value`.
    pub fn synced(value: N, policy: CachePolicy) -> Self {
        Self::with_state(value, policy, true)
    }

    /// Creates a fully specified cache.
    pub fn with_state(value: N, policy: CachePolicy, synced: bool) -> Self {
        Self {
            value: Cell::new(value),
            synced: Cell::new(synced),
            policy: Cell::new(policy),
        }
    }

    /// Stores `value` and marks the cache synchronized.
    #[inline]
    pub fn set(&self, value: N) {
        self.value.set(value);
        self.synced.set(true);
    }

    /// Returns the stored value, or `N::default()` while unsynchronized.
    #[inline]
    pub fn get(&self) -> N {
        if self.synced.get() {
            self.value.get()
        } else {
            N::default()
        }
    }

    /// Returns `true` if the stored value can be trusted.
    #[inline]
    pub fn is_synced(&self) -> bool {
        self.synced.get()
    }

    /// Marks the cache unsynchronized.
    #[inline]
    pub fn reset(&self) {
        self.synced.set(false);
    }

    /// Returns the current update policy.
    #[inline]
    pub fn policy(&self) -> CachePolicy {
        self.policy.get()
    }

    /// Changes the update policy. Synchronization state is left alone.
    #[inline]
    pub fn set_policy(&self, policy: CachePolicy) {
        self.policy.set(policy);
    }

    #[inline]
    fn apply(&self, n: N, op: impl FnOnce(&mut N, N)) {
        match self.policy.get() {
            CachePolicy::Persistent => {
                let mut value = self.value.get();
                op(&mut value, n);
                self.value.set(value);
            },
            CachePolicy::Relaxed => self.synced.set(false),
        }
    }
}

impl<N> NumCache<N>
where
    N: Copy + Default + AddAssign + SubAssign + MulAssign + DivAssign,
{
    /// Adds `n` to the stored value, or invalidates under the relaxed policy.
    #[inline]
    pub fn adjust_add(&self, n: N) {
        self.apply(n, |value, n| *value += n);
    }

    /// Subtracts `n` from the stored value, or invalidates.
    #[inline]
    pub fn adjust_sub(&self, n: N) {
        self.apply(n, |value, n| *value -= n);
    }

    /// Multiplies the stored value by `n`, or invalidates.
    #[inline]
    pub fn adjust_mul(&self, n: N) {
        self.apply(n, |value, n| *value *= n);
    }

    /// Divides the stored value by `n`, or invalidates.
    #[inline]
    pub fn adjust_div(&self, n: N) {
        self.apply(n, |value, n| *value /= n);
    }
}

impl<N> AddAssign<N> for NumCache<N>
where
    N: Copy + Default + AddAssign + SubAssign + MulAssign + DivAssign,
{
    fn add_assign(&mut self, n: N) {
        self.adjust_add(n);
    }
}

impl<N> SubAssign<N> for NumCache<N>
where
    N: Copy + Default + AddAssign + SubAssign + MulAssign + DivAssign,
{
    fn sub_assign(&mut self, n: N) {
        self.adjust_sub(n);
    }
}

impl<N> MulAssign<N> for NumCache<N>
where
    N: Copy + Default + AddAssign + SubAssign + MulAssign + DivAssign,
{
    fn mul_assign(&mut self, n: N) {
        self.adjust_mul(n);
    }
}

impl<N> DivAssign<N> for NumCache<N>
where
    N: Copy + Default + AddAssign + SubAssign + MulAssign + DivAssign,
{
    fn div_assign(&mut self, n: N) {
        self.adjust_div(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_relaxed_and_unsynced() {
        let cache: NumCache<f64> = NumCache::default();
        assert_eq!(cache.policy(), CachePolicy::Relaxed);
        assert!(!cache.is_synced());
        assert_eq!(cache.get(), 0.0);

        let fresh: NumCache<i64> = NumCache::new();
        assert_eq!(fresh.policy(), CachePolicy::Relaxed);
        assert!(!fresh.is_synced());
    }

    #[test]
    fn set_synchronizes_from_any_state() {
        let cache: NumCache<f64> = NumCache::new();
        cache.set(4.5);
        assert!(cache.is_synced());
        assert_eq!(cache.get(), 4.5);
        cache.set(1.0);
        assert_eq!(cache.get(), 1.0);
    }

    #[test]
    fn unsynced_read_yields_zero_not_stale_value() {
        let cache = NumCache::synced(42_i64, CachePolicy::Persistent);
        cache.reset();
        assert!(!cache.is_synced());
        assert_eq!(cache.get(), 0);
    }

    #[test]
    fn relaxed_updates_invalidate_and_discard_delta() {
        let mut cache = NumCache::synced(10.0_f64, CachePolicy::Relaxed);
        cache += 5.0;
        assert!(!cache.is_synced());

        cache.set(10.0);
        cache -= 1.0;
        assert!(!cache.is_synced());

        cache.set(10.0);
        cache *= 2.0;
        assert!(!cache.is_synced());

        cache.set(10.0);
        cache /= 2.0;
        assert!(!cache.is_synced());
        assert_eq!(cache.get(), 0.0);
    }

    #[test]
    fn relaxed_update_does_not_touch_stored_value() {
        let cache = NumCache::synced(10.0_f64, CachePolicy::Relaxed);
        cache.adjust_add(5.0);
        assert!(!cache.is_synced());
        assert_eq!(cache.value.get(), 10.0);
    }

    #[test]
    fn persistent_updates_apply_in_place() {
        let mut cache = NumCache::synced(10.0_f64, CachePolicy::Persistent);
        cache += 5.0;
        assert_eq!(cache.get(), 15.0);
        cache -= 3.0;
        assert_eq!(cache.get(), 12.0);
        cache *= 2.0;
        assert_eq!(cache.get(), 24.0);
        cache /= 4.0;
        assert_eq!(cache.get(), 6.0);
        assert!(cache.is_synced());
    }

    #[test]
    fn persistent_update_while_unsynced_stays_unsynced() {
        let cache = NumCache::with_state(1.0_f64, CachePolicy::Persistent, false);
        cache.adjust_add(1.0);
        assert!(!cache.is_synced());
        assert_eq!(cache.get(), 0.0);
    }

    #[test]
    fn policy_change_keeps_sync_state() {
        let cache = NumCache::synced(3_i32, CachePolicy::Relaxed);
        cache.set_policy(CachePolicy::Persistent);
        assert!(cache.is_synced());
        assert_eq!(cache.get(), 3);
        cache.reset();
        cache.set_policy(CachePolicy::Relaxed);
        assert!(!cache.is_synced());
    }

    #[test]
    fn persistent_divide_by_zero_propagates_infinity() {
        let cache = NumCache::synced(1.0_f64, CachePolicy::Persistent);
        cache.adjust_div(0.0);
        assert!(cache.get().is_infinite());
    }

    #[test]
    fn clone_copies_state() {
        let cache = NumCache::synced(2.0_f64, CachePolicy::Persistent);
        let copy = cache.clone();
        cache.reset();
        assert!(copy.is_synced());
        assert_eq!(copy.get(), 2.0);
        assert_eq!(copy.policy(), CachePolicy::Persistent);
    }
}
