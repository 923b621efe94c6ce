//! Injectable key-value stores for folio.
//!
//! Loader outputs and incremental cache snapshots are kept in a [`Store`]
//! owned by whoever builds them, never in module-level state. Two
//! implementations are provided:
//!
//! - [`MemoryStore`]: process-local map, unbounded, manual invalidation
//! - [`NullStore`]: always misses (caching disabled)
//!
//! Writes are "latest wins": a `set` replaces whatever the key held before,
//! so concurrent writers never need a lock beyond the map itself.
//!
//! # Example
//!
//! ```
//! use folio_cache::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! store.set("abc123", 42_u32);
//! assert_eq!(store.get("abc123").as_deref(), Some(&42));
//! ```

mod memory;

use std::sync::Arc;

pub use memory::MemoryStore;

/// Key-value store with shared, immutable values.
///
/// Values are handed out as [`Arc`] so a reader can keep using a snapshot
/// while a writer replaces it.
pub trait Store<V>: Send + Sync {
    /// Look up the value stored under `key`.
    fn get(&self, key: &str) -> Option<Arc<V>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Returns the shared handle to the stored value.
    fn set(&self, key: &str, value: V) -> Arc<V>;

    /// Drop the value stored under `key`, if any.
    fn invalidate(&self, key: &str);

    /// Drop every stored value.
    fn clear(&self);
}

/// No-op [`Store`] that never retains anything.
///
/// `set` still returns the wrapped value so call sites can use the result
/// the same way regardless of the store.
pub struct NullStore;

impl<V> Store<V> for NullStore {
    fn get(&self, _key: &str) -> Option<Arc<V>> {
        None
    }

    fn set(&self, _key: &str, value: V) -> Arc<V> {
        Arc::new(value)
    }

    fn invalidate(&self, _key: &str) {}

    fn clear(&self) {}
}

/// Return the value for `key`, building and storing it on a miss.
///
/// The build closure runs outside any lock; two racing callers may both
/// build, and the later `set` wins.
pub fn get_or_try_insert<V, E, S>(
    store: &S,
    key: &str,
    build: impl FnOnce() -> Result<V, E>,
) -> Result<Arc<V>, E>
where
    S: Store<V> + ?Sized,
{
    if let Some(value) = store.get(key) {
        tracing::debug!(key, "store hit");
        return Ok(value);
    }
    tracing::debug!(key, "store miss");
    let value = build()?;
    Ok(store.set(key, value))
}
