//! Factories that manufacture fresh [`Counter`]s.
//!
//! A [`CounterMap`](crate::counter_map::CounterMap) asks its factory for a new
//! counter every time a key is touched for the first time. Factories are
//! trait objects so a map can be configured at runtime, and each one can
//! clone itself so every map owns an independent instance.
//!
//! | Factory                    | Created counter                                  |
//! |----------------------------|--------------------------------------------------|
//! | [`DefaultCounterFactory`]  | `Counter::new()` (std `HashMap`, relaxed cache)  |
//! | [`CopyCounterFactory`]     | a copy of a stored template counter              |
//! | [`MapTypeCounterFactory`]  | an empty counter over a chosen backing container |
//!
//! ## Example Usage
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use tallykit::counter::{Count, Counter};
//! use tallykit::factory::{CounterFactory, MapTypeCounterFactory};
//!
//! let factory = MapTypeCounterFactory::<BTreeMap<&str, Count>>::new();
//! let counter: Counter<&str> = factory.create_counter();
//! assert!(counter.counts().backing_name().contains("BTreeMap"));
//!
//! let copy: Box<dyn CounterFactory<&str>> = factory.clone_box();
//! assert!(copy.create_counter().is_empty());
//! ```
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::counter::{Count, Counter};
use crate::store::{AnyMap, BackingMap};

/// Creates counters and clones itself.
pub trait CounterFactory<V> {
    /// Builds a fresh counter.
    fn create_counter(&self) -> Counter<V>;

    /// Returns an independent copy of this factory.
    fn clone_box(&self) -> Box<dyn CounterFactory<V>>;
}

impl<V> Clone for Box<dyn CounterFactory<V>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl<V> fmt::Debug for dyn CounterFactory<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CounterFactory")
    }
}

/// Creates default counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultCounterFactory;

impl<V> CounterFactory<V> for DefaultCounterFactory
where
    V: Eq + Hash + Clone + 'static,
{
    fn create_counter(&self) -> Counter<V> {
        Counter::new()
    }

    fn clone_box(&self) -> Box<dyn CounterFactory<V>> {
        Box::new(*self)
    }
}

/// Creates copies of a template counter.
///
/// The template keeps its backing container and cache policy, so this is
/// the way to hand every nested counter a pre-configured shape.
#[derive(Debug, Clone)]
pub struct CopyCounterFactory<V> {
    template: Counter<V>,
}

impl<V> CopyCounterFactory<V> {
    /// Creates a factory seeded with `template`.
    pub fn new(template: Counter<V>) -> Self {
        Self { template }
    }

    /// Returns the template every created counter starts from.
    pub fn template(&self) -> &Counter<V> {
        &self.template
    }
}

impl<V> CounterFactory<V> for CopyCounterFactory<V>
where
    V: Clone + 'static,
{
    fn create_counter(&self) -> Counter<V> {
        self.template.clone()
    }

    fn clone_box(&self) -> Box<dyn CounterFactory<V>> {
        Box::new(self.clone())
    }
}

/// Creates empty counters backed by container type `M`.
pub struct MapTypeCounterFactory<M> {
    _backing: PhantomData<fn() -> M>,
}

impl<M> MapTypeCounterFactory<M> {
    /// Creates the factory.
    pub fn new() -> Self {
        Self {
            _backing: PhantomData,
        }
    }
}

impl<M> Default for MapTypeCounterFactory<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for MapTypeCounterFactory<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for MapTypeCounterFactory<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapTypeCounterFactory")
            .field("backing", &std::any::type_name::<M>())
            .finish()
    }
}

impl<V, M> CounterFactory<V> for MapTypeCounterFactory<M>
where
    V: 'static,
    M: BackingMap<V, Count> + Default + 'static,
{
    /// The created counter's total is synchronized at 0, like `Counter::new`.
    fn create_counter(&self) -> Counter<V> {
        let counter = Counter::from_map(AnyMap::from_backing(M::default()));
        counter.total_count();
        counter
    }

    fn clone_box(&self) -> Box<dyn CounterFactory<V>> {
        Box::new(self.clone())
    }
}
