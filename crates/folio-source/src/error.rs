//! Error types for content loading and tree building.

use std::path::PathBuf;

use crate::file::FileKind;

/// Error produced while ingesting files into a [`FileStore`](crate::FileStore).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Two files normalize to the same path and kind.
    #[error("Duplicate {kind} file: {path}")]
    Duplicate {
        /// Flattened path shared by both files.
        path: String,
        /// Kind shared by both files.
        kind: FileKind,
    },
    /// Meta file is not a JSON object of the expected shape.
    #[error("Invalid meta file {path}: {message}")]
    InvalidMeta {
        /// Offending file.
        path: String,
        /// Parser message.
        message: String,
    },
    /// Page front matter is not valid YAML.
    #[error("Invalid front matter in {path}: {message}")]
    InvalidFrontmatter {
        /// Offending file.
        path: String,
        /// Parser message.
        message: String,
    },
    /// Path escapes the content root.
    #[error("Path escapes content root: {0}")]
    OutsideRoot(String),
    /// Include pattern does not compile.
    #[error("Invalid include pattern {pattern}: {message}")]
    InvalidPattern {
        /// Pattern as configured.
        pattern: String,
        /// Compiler message.
        message: String,
    },
    /// Reading a local file or directory failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Error produced while building page trees.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Two pages resolve to the same slugs within one locale.
    #[error("Duplicate slug /{slug}: {first} and {second}")]
    DuplicateSlug {
        /// Slugs joined with `/`.
        slug: String,
        /// Path of the first page.
        first: String,
        /// Path of the conflicting page.
        second: String,
    },
}

/// Error produced by the [`Loader`](crate::Loader).
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Ingestion failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Tree building failed.
    #[error(transparent)]
    Build(#[from] BuildError),
}
