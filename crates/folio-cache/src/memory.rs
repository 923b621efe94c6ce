//! In-memory [`Store`] backed by a locked hash map.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::Store;

/// Process-local [`Store`] with no size or time eviction.
///
/// The key space is expected to be bounded by distinct content revisions
/// (tree shas, branch names), so entries are only dropped by explicit
/// [`Store::invalidate`] or [`Store::clear`] calls.
pub struct MemoryStore<V> {
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V> MemoryStore<V> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the store holds no entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + Sync> Store<V> for MemoryStore<V> {
    fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.read().unwrap().get(key).map(Arc::clone)
    }

    fn set(&self, key: &str, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries
            .write()
            .unwrap()
            .insert(key.to_owned(), Arc::clone(&value));
        value
    }

    fn invalidate(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}
