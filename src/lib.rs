//! tallykit: frequency counters and conditional counter maps over
//! interchangeable map containers.
//!
//! - [`store::AnyMap`]: value-semantic map that hides its concrete container.
//! - [`counter::Counter`]: value → count histogram with a cached total.
//! - [`counter_map::CounterMap`]: key → counter conditional distribution.
//! - [`factory`]: pluggable construction of nested counters.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod counter;
pub mod counter_map;
pub mod ds;
pub mod error;
pub mod factory;
pub mod prelude;
pub mod store;
