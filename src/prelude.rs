pub use crate::builder::{CounterBuilder, MapKind};
pub use crate::counter::{Count, Counter, DEFAULT_PRECISION};
pub use crate::counter_map::CounterMap;
pub use crate::ds::{CachePolicy, NumCache};
pub use crate::error::OutOfRange;
pub use crate::factory::{
    CopyCounterFactory, CounterFactory, DefaultCounterFactory, MapTypeCounterFactory,
};
pub use crate::store::{AnyMap, BackingMap};
