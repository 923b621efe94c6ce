//! Pushing documents to a search backend.
//!
//! A backend only has to support two operations: replacing its settings and
//! atomically replacing every object. [`sync`] does both.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::record::{DocumentRecord, IndexRecord};

/// Default index name.
pub const DEFAULT_INDEX: &str = "document";

/// Static settings pushed before every sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    /// Records sharing this attribute collapse to one hit.
    pub attribute_for_distinct: String,
    pub attributes_to_retrieve: Vec<String>,
    pub searchable_attributes: Vec<String>,
    pub attributes_to_snippet: Vec<String>,
    pub attributes_for_faceting: Vec<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|&n| n.to_owned()).collect();
        Self {
            attribute_for_distinct: "page_id".to_owned(),
            attributes_to_retrieve: owned(&["title", "section", "content", "url", "section_id"]),
            searchable_attributes: owned(&["title", "section", "content"]),
            attributes_to_snippet: Vec::new(),
            attributes_for_faceting: owned(&["tag"]),
        }
    }
}

/// One index of a search backend.
pub trait SearchIndex {
    /// Index name.
    fn name(&self) -> &str;

    /// Replace the index settings. Must be idempotent.
    fn set_settings(&self, settings: &IndexSettings) -> Result<(), SearchError>;

    /// Replace every object in the index with `records`, all or nothing.
    fn replace_all_objects(&self, records: &[IndexRecord]) -> Result<(), SearchError>;
}

/// A search backend that hands out indexes by name.
pub trait SearchClient {
    /// Index handle type.
    type Index: SearchIndex;

    /// Handle for the index called `name`.
    fn init_index(&self, name: &str) -> Self::Index;
}

/// Options for [`sync`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Index name.
    pub document: String,
    /// Documents to index.
    pub documents: Vec<DocumentRecord>,
}

impl SyncOptions {
    /// Sync `documents` into the default index.
    #[must_use]
    pub fn new(documents: Vec<DocumentRecord>) -> Self {
        Self {
            document: DEFAULT_INDEX.to_owned(),
            documents,
        }
    }

    /// Use a different index.
    #[must_use]
    pub fn with_index(mut self, name: impl Into<String>) -> Self {
        self.document = name.into();
        self
    }
}

/// Push settings, then replace all records of the configured index.
///
/// Returns the number of records written.
pub fn sync<C: SearchClient>(client: &C, options: &SyncOptions) -> Result<usize, SearchError> {
    let index = client.init_index(&options.document);
    set_index_settings(&index)?;
    update_documents(&index, &options.documents)
}

/// Push the static [`IndexSettings`].
pub fn set_index_settings<I: SearchIndex>(index: &I) -> Result<(), SearchError> {
    index.set_settings(&IndexSettings::default())
}

/// Flatten `documents` into records and replace the index contents with them.
///
/// Returns the number of records written.
pub fn update_documents<I: SearchIndex>(
    index: &I,
    documents: &[DocumentRecord],
) -> Result<usize, SearchError> {
    let records = to_index_records(documents);
    index.replace_all_objects(&records)?;
    tracing::info!(
        index = index.name(),
        documents = documents.len(),
        records = records.len(),
        "Replaced search index contents"
    );
    Ok(records.len())
}

/// Records for every document, in document order.
#[must_use]
pub fn to_index_records(documents: &[DocumentRecord]) -> Vec<IndexRecord> {
    documents.iter().flat_map(DocumentRecord::to_records).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryClient;
    use crate::structure::structure;

    fn document(id: &str, markdown: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_owned(),
            title: id.to_uppercase(),
            url: format!("/docs/{id}"),
            structured: structure(markdown),
            tag: None,
            extra_data: None,
        }
    }

    #[test]
    fn test_default_settings_wire_format() {
        assert_eq!(
            serde_json::to_value(IndexSettings::default()).unwrap(),
            json!({
                "attributeForDistinct": "page_id",
                "attributesToRetrieve": ["title", "section", "content", "url", "section_id"],
                "searchableAttributes": ["title", "section", "content"],
                "attributesToSnippet": [],
                "attributesForFaceting": ["tag"],
            })
        );
    }

    #[test]
    fn test_sync_pushes_settings_and_records() {
        let client = MemoryClient::new();
        let options = SyncOptions::new(vec![
            document("a", "# One\n\nfirst\n"),
            document("b", "intro\n"),
        ]);

        let written = sync(&client, &options).unwrap();

        let index = client.index(DEFAULT_INDEX).unwrap();
        assert_eq!(written, 3);
        assert_eq!(index.settings(), Some(IndexSettings::default()));
        let ids: Vec<_> = index.records().into_iter().map(|r| r.object_id).collect();
        assert_eq!(ids, vec!["a-0", "a-1", "b-0"]);
    }

    #[test]
    fn test_sync_replaces_previous_contents() {
        let client = MemoryClient::new();
        sync(&client, &SyncOptions::new(vec![document("old", "gone\n")])).unwrap();

        sync(&client, &SyncOptions::new(vec![document("new", "kept\n")])).unwrap();

        let records = client.index(DEFAULT_INDEX).unwrap().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].object_id, "new-0");
    }

    #[test]
    fn test_sync_custom_index_name() {
        let client = MemoryClient::new();
        sync(&client, &SyncOptions::new(Vec::new()).with_index("docs-v2")).unwrap();

        assert!(client.index("docs-v2").is_some());
        assert!(client.index(DEFAULT_INDEX).is_none());
    }

    #[test]
    fn test_object_ids_stable_across_runs() {
        let docs = vec![document("p", "# A\n\nx\n\ny\n\n# B\n\nz\n")];

        let first = to_index_records(&docs);
        let second = to_index_records(&docs);
        assert_eq!(first, second);

        let reordered = vec![document("p", "# B\n\nz\n\n# A\n\nx\n\ny\n")];
        let third = to_index_records(&reordered);
        let ids = |records: &[IndexRecord]| {
            records
                .iter()
                .map(|r| (r.object_id.clone(), r.content.clone()))
                .collect::<Vec<_>>()
        };
        assert_ne!(ids(&first), ids(&third));
    }

    #[test]
    fn test_failed_replace_leaves_index_untouched() {
        let client = MemoryClient::new();
        sync(&client, &SyncOptions::new(vec![document("a", "keep\n")])).unwrap();
        client.fail_next_replace("quota exceeded");

        let err = sync(&client, &SyncOptions::new(vec![document("b", "new\n")])).unwrap_err();

        assert!(err.to_string().contains("quota exceeded"));
        let records = client.index(DEFAULT_INDEX).unwrap().records();
        assert_eq!(records[0].object_id, "a-0");
    }
}
