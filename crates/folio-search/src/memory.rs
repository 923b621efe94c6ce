//! In-memory search backend for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::SearchError;
use crate::record::IndexRecord;
use crate::sync::{IndexSettings, SearchClient, SearchIndex};

/// Backend keeping every index in memory.
///
/// Index handles share state with the client, so writes through a handle
/// are visible through [`MemoryClient::index`].
#[derive(Debug, Default)]
pub struct MemoryClient {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryClient {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for an index that was initialized before.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<MemoryIndex> {
        self.indexes.read().unwrap().get(name).cloned()
    }

    /// Make the next `replace_all_objects` call fail with `message`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_next_replace(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_owned());
    }
}

impl SearchClient for MemoryClient {
    type Index = MemoryIndex;

    fn init_index(&self, name: &str) -> MemoryIndex {
        self.indexes
            .write()
            .unwrap()
            .entry(name.to_owned())
            .or_insert_with(|| MemoryIndex {
                name: name.to_owned(),
                settings: Arc::default(),
                records: Arc::default(),
                failure: Arc::clone(&self.failure),
            })
            .clone()
    }
}

/// One in-memory index.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    name: String,
    settings: Arc<RwLock<Option<IndexSettings>>>,
    records: Arc<RwLock<Vec<IndexRecord>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryIndex {
    /// Last settings pushed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn settings(&self) -> Option<IndexSettings> {
        self.settings.read().unwrap().clone()
    }

    /// Current records.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn records(&self) -> Vec<IndexRecord> {
        self.records.read().unwrap().clone()
    }
}

impl SearchIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_settings(&self, settings: &IndexSettings) -> Result<(), SearchError> {
        *self.settings.write().unwrap() = Some(settings.clone());
        Ok(())
    }

    fn replace_all_objects(&self, records: &[IndexRecord]) -> Result<(), SearchError> {
        if let Some(message) = self.failure.lock().unwrap().take() {
            return Err(SearchError::Backend {
                index: self.name.clone(),
                message,
            });
        }
        *self.records.write().unwrap() = records.to_vec();
        Ok(())
    }
}
