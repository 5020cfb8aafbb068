//! Error types for the tallykit library.
//!
//! ## Key Components
//!
//! - [`OutOfRange`]: Returned by checked lookups ([`AnyMap::at`] and
//!   [`AnyMap::at_mut`]) when the requested key is absent.
//!
//! Every other lookup path in the crate is total: missing keys surface as
//! `None`, `false`, or a zero count instead of an error.
//!
//! ## Example Usage
//!
//! ```
//! use tallykit::error::OutOfRange;
//! use tallykit::store::AnyMap;
//!
//! let mut map: AnyMap<&str, i32> = AnyMap::new();
//! map.insert("one", 1);
//!
//! assert_eq!(map.at(&"one"), Ok(&1));
//!
//! let err: OutOfRange = map.at(&"two").unwrap_err();
//! assert!(err.to_string().contains("not present"));
//! ```
//!
//! [`AnyMap::at`]: crate::store::AnyMap::at
//! [`AnyMap::at_mut`]: crate::store::AnyMap::at_mut

use std::fmt;

// ---------------------------------------------------------------------------
// OutOfRange
// ---------------------------------------------------------------------------

/// Error returned when a checked lookup targets a key that is not stored.
///
/// Carries a human-readable description naming the backing container that
/// was searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfRange(String);

impl OutOfRange {
    /// Creates a new `OutOfRange` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Builds the standard "missing key" error for a backing container.
    #[inline]
    pub(crate) fn missing_key(backing: &str) -> Self {
        Self(format!("key not present in {backing}"))
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for OutOfRange {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_display_shows_message() {
        let err = OutOfRange::new("no such key");
        assert_eq!(err.to_string(), "no such key");
    }

    #[test]
    fn out_of_range_missing_key_names_backing() {
        let err = OutOfRange::missing_key("BTreeMap");
        assert_eq!(err.message(), "key not present in BTreeMap");
    }

    #[test]
    fn out_of_range_debug_includes_message() {
        let err = OutOfRange::new("bad key");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("bad key"));
    }

    #[test]
    fn out_of_range_clone_and_eq() {
        let a = OutOfRange::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<OutOfRange>();
    }
}
