//! Structured-content extraction and search index synchronization.
//!
//! ```text
//! Markdown --structure--> StructuredData --get_sections--> Section[]
//!                                                           |
//!           DocumentRecord[] --update_documents--> IndexRecord[] --> SearchIndex
//! ```
//!
//! Backends implement [`SearchClient`] and [`SearchIndex`]. [`JsonDirClient`]
//! writes indexes to disk; `MemoryClient` (behind the `mock` feature) keeps
//! them in memory for tests.
//!
//! # Example
//!
//! ```
//! use folio_search::{DocumentRecord, structure, to_index_records};
//!
//! let document = DocumentRecord {
//!     id: "intro".to_owned(),
//!     title: "Intro".to_owned(),
//!     url: "/docs/intro".to_owned(),
//!     structured: structure("# Setup\n\nRun it."),
//!     tag: None,
//!     extra_data: None,
//! };
//! let records = to_index_records(&[document]);
//!
//! assert_eq!(records[0].object_id, "intro-0");
//! assert_eq!(records[0].content, "Setup");
//! assert_eq!(records[1].content, "Run it.");
//! ```

mod error;
mod indexes;
mod json_index;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod record;
mod structure;
mod sync;

pub use error::SearchError;
pub use indexes::{
    AdvancedIndex, LanguageIndexes, SimpleIndex, advanced_indexes, all_document_records,
    document_records, per_language, simple_indexes,
};
pub use json_index::{IndexFile, JsonDirClient, JsonFileIndex};
#[cfg(any(test, feature = "mock"))]
pub use memory::{MemoryClient, MemoryIndex};
pub use record::{DocumentRecord, IndexRecord, Section, get_sections};
pub use structure::{ContentBlock, Heading, Slugger, StructuredData, slugify, structure};
pub use sync::{
    DEFAULT_INDEX, IndexSettings, SearchClient, SearchIndex, SyncOptions, set_index_settings,
    sync, to_index_records, update_documents,
};
