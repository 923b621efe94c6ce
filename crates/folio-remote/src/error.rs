//! Error types for remote content.

use std::path::PathBuf;

use folio_source::LoaderError;

/// Error applying a change set to a cache.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// No content was provided for an added or modified blob.
    #[error("Missing content for '{path}'")]
    MissingContent {
        /// Blob path.
        path: String,
    },

    /// The parent directory of an added entry is not in the cache.
    #[error("Parent directory of '{path}' is not cached")]
    MissingParent {
        /// Entry path.
        path: String,
    },
}

/// Error talking to a Git host or maintaining the local cache.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Request could not be sent or the response could not be read.
    #[error("Request to {url} failed: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// Transport error.
        message: String,
    },

    /// Host answered with an error status.
    #[error("Request to {url} returned HTTP {status}: {body}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Requested tree or blob does not exist.
    #[error("Object {sha} not found")]
    NotFound {
        /// Object sha.
        sha: String,
    },

    /// Blob content could not be decoded.
    #[error("Failed to decode content of '{path}': {message}")]
    Decode {
        /// Blob path or sha.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// Content directory is missing from the fetched tree.
    #[error("Directory '{directory}' not found in tree {sha}")]
    DirectoryNotFound {
        /// Content directory.
        directory: String,
        /// Root tree sha.
        sha: String,
    },

    /// Cache file could not be read or written.
    #[error("Cache file {}: {source}", path.display())]
    CacheIo {
        /// Cache file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Cache file is not valid JSON.
    #[error("Invalid cache file {}: {source}", path.display())]
    CacheFormat {
        /// Cache file path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Change set could not be applied.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// Cached content could not be loaded.
    #[error(transparent)]
    Loader(#[from] LoaderError),
}
