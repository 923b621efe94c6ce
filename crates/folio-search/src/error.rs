//! Error types for index synchronization.

use std::path::PathBuf;

/// Error raised while pushing settings or records to an index.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The backend rejected an operation.
    #[error("Search backend error on index '{index}': {message}")]
    Backend {
        /// Index name.
        index: String,
        /// Backend message.
        message: String,
    },

    /// Index file could not be written.
    #[error("Failed to write index file {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialized.
    #[error("Failed to serialize index data: {0}")]
    Serialize(#[from] serde_json::Error),
}
