//! Builder for counters and counter maps over a chosen backing container.
//!
//! Hides the container plumbing (`AnyMap::from_backing`, factory wiring) behind
//! a small fluent API. Everything the builder produces is an ordinary
//! [`Counter`] or [`CounterMap`]; the builder only decides the initial shape.
//!
//! ## Example
//!
//! ```rust
//! use tallykit::builder::{CounterBuilder, MapKind};
//! use tallykit::ds::CachePolicy;
//!
//! let mut counter = CounterBuilder::new()
//!     .backing(MapKind::BTree)
//!     .cache_policy(CachePolicy::Persistent)
//!     .build::<&str>();
//! counter.increment_count("b", 2.0);
//! counter.increment_count("a", 1.0);
//! assert_eq!(counter.to_string(), "[a=>1, b=>2]");
//!
//! let mut map = CounterBuilder::new().backing(MapKind::FxHash).build_map::<u32, u32>();
//! map.increment_count(1, 7, 1.0);
//! assert_eq!(map.total_count(), 1.0);
//! ```

use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::counter::Counter;
use crate::counter_map::CounterMap;
use crate::ds::num_cache::CachePolicy;
use crate::factory::{CopyCounterFactory, CounterFactory};
use crate::store::AnyMap;

/// Available backing containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// `std::collections::HashMap` with the default SipHash hasher.
    #[default]
    Hash,
    /// `HashMap` with the `rustc_hash` Fx hasher.
    FxHash,
    /// `std::collections::BTreeMap`; iteration is key-ordered.
    BTree,
}

/// Builder for [`Counter`] and [`CounterMap`] instances.
#[derive(Debug, Clone, Default)]
pub struct CounterBuilder {
    kind: MapKind,
    policy: CachePolicy,
    capacity: usize,
}

impl CounterBuilder {
    /// Creates a builder: std `HashMap`, relaxed cache, no pre-sizing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the backing container.
    pub fn backing(mut self, kind: MapKind) -> Self {
        self.kind = kind;
        self
    }

    /// Selects the total-cache policy of built counters.
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pre-sizes hashed containers. Ignored by [`MapKind::BTree`].
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds an empty counter.
    ///
    /// # Type Parameters
    ///
    /// - `V`: counted value type, must be `Eq + Hash + Ord + Clone + 'static`
    ///   so any [`MapKind`] can hold it
    pub fn build<V>(&self) -> Counter<V>
    where
        V: Eq + Hash + Ord + Clone + 'static,
    {
        let counter = Counter::from_map(self.backing_map());
        counter.set_cache_policy(self.policy);
        counter.total_count();
        counter
    }

    /// Builds an empty counter map whose outer map and nested counters all
    /// use the configured backing.
    ///
    /// ```rust
    /// use tallykit::builder::{CounterBuilder, MapKind};
    ///
    /// let mut map = CounterBuilder::new().backing(MapKind::BTree).build_map::<&str, &str>();
    /// map.increment_count("the", "cat", 1.0);
    /// let nested = map.get_counter(&"the").unwrap();
    /// assert!(nested.counts().backing_name().contains("BTreeMap"));
    /// ```
    pub fn build_map<K, V>(&self) -> CounterMap<K, V>
    where
        K: Eq + Hash + Ord + Clone + 'static,
        V: Eq + Hash + Ord + Clone + 'static,
    {
        let factory = CopyCounterFactory::new(self.build::<V>());
        CounterMap::from_parts(self.backing_map(), &factory)
    }

    /// Returns a factory producing counters shaped like [`build`](Self::build).
    pub fn factory<V>(&self) -> Box<dyn CounterFactory<V>>
    where
        V: Eq + Hash + Ord + Clone + 'static,
    {
        Box::new(CopyCounterFactory::new(self.build::<V>()))
    }

    fn backing_map<K, V>(&self) -> AnyMap<K, V>
    where
        K: Eq + Hash + Ord + Clone + 'static,
        V: Clone + 'static,
    {
        match self.kind {
            MapKind::Hash => AnyMap::with_capacity(self.capacity),
            MapKind::FxHash => AnyMap::from_backing(FxHashMap::with_capacity_and_hasher(
                self.capacity,
                Default::default(),
            )),
            MapKind::BTree => AnyMap::from_backing(BTreeMap::new()),
        }
    }
}

impl From<MapKind> for CounterBuilder {
    fn from(kind: MapKind) -> Self {
        Self::new().backing(kind)
    }
}
