//! Storage layer: the backing-container capability contract, its adapters,
//! and the type-erased [`AnyMap`] built on top of them.

pub mod any_map;
pub mod btree;
pub mod hashmap;
pub mod traits;

pub use any_map::{AnyMap, Iter, IterMut};
pub use traits::BackingMap;
