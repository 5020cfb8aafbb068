pub mod num_cache;

pub use num_cache::{CachePolicy, NumCache};
