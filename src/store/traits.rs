//! Capability contract for containers that can back an [`AnyMap`].
//!
//! A backing container owns unique keys mapped to values and exposes lookup,
//! upsert, no-overwrite insertion, removal, and forward traversal. Adapters
//! live next to the container they wrap (`store::hashmap`, `store::btree`);
//! [`AnyMap`] only ever talks to this trait.
//!
//! The trait is object safe: every method either takes concrete arguments or
//! a `&mut dyn FnMut`, and traversal returns boxed iterators so that one
//! static iterator type can wrap any container's native iterator.
//!
//! [`AnyMap`]: crate::store::AnyMap

/// Upper bound on the number of `(K, V)` entries any in-memory container can
/// address, used as the default for [`BackingMap::max_len`].
#[inline]
pub fn max_entries<K, V>() -> usize {
    isize::MAX as usize / std::mem::size_of::<(K, V)>().max(1)
}

/// Object-safe key/value container operations.
///
/// Implementations must keep keys unique and must never overwrite an
/// existing value from [`insert`](BackingMap::insert).
pub trait BackingMap<K, V> {
    /// Deep-copies the container behind a fresh box.
    fn clone_box(&self) -> Box<dyn BackingMap<K, V>>;

    /// Type name of the concrete container.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Check if the container holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest number of entries the container could theoretically hold.
    fn max_len(&self) -> usize {
        max_entries::<K, V>()
    }

    /// Returns the value for `key`, inserting `make()` first if absent.
    fn get_or_insert_with(&mut self, key: K, make: &mut dyn FnMut() -> V) -> &mut V;

    /// Fetch a value by key.
    fn get(&self, key: &K) -> Option<&V>;

    /// Fetch the stored key and value for `key`.
    fn get_key_value(&self, key: &K) -> Option<(&K, &V)>;

    /// Fetch a mutable value by key.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Check if a key exists.
    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Forward traversal over all entries.
    ///
    /// The iterator need not be fused; `AnyMap` fuses it.
    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_>;

    /// Forward traversal with mutable values.
    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (&K, &mut V)> + '_>;

    /// Inserts `value` under `key` if the key is absent.
    ///
    /// Returns the stored value and `true` on insertion, or the existing value
    /// and `false` when the key was already present (the new value is dropped).
    fn insert(&mut self, key: K, value: V) -> (&mut V, bool);

    /// Removes `key`, returning its value if it was present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Remove all entries.
    fn clear(&mut self);
}
