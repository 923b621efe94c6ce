//! Persisted snapshot of a content tree.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::{DiffError, RemoteError};
use crate::tree::{GitTree, ObjectKind, TreeItem};

/// A cached blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the content root.
    pub path: String,
    pub sha: String,
    pub content: String,
    /// Fields this version does not know about, kept on rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A cached directory mirroring one Git tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubCacheFile {
    /// Path relative to the content root (`""` for the root).
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub sub_directories: Vec<GithubCacheFile>,
    /// Fields this version does not know about, kept on rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GithubCacheFile {
    /// An empty directory node.
    #[must_use]
    pub fn empty(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sha: sha.into(),
            files: Vec::new(),
            sub_directories: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Read a cache file; a missing file reads as `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, RemoteError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RemoteError::CacheIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| RemoteError::CacheFormat {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Write the cache file atomically, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), RemoteError> {
        let io_error = |source: std::io::Error| RemoteError::CacheIo {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_error)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
        serde_json::to_writer(&mut temp, self).map_err(|source| RemoteError::CacheFormat {
            path: path.to_path_buf(),
            source,
        })?;
        temp.persist(path).map_err(|e| io_error(e.error))?;
        tracing::debug!(path = %path.display(), sha = %self.sha, "Saved content cache");
        Ok(())
    }

    /// Every cached file, depth first.
    #[must_use]
    pub fn all_files(&self) -> Vec<&FileEntry> {
        let mut files: Vec<&FileEntry> = self.files.iter().collect();
        for dir in &self.sub_directories {
            files.extend(dir.all_files());
        }
        files
    }

    /// The directory node at `path`.
    #[must_use]
    pub fn find_dir(&self, path: &str) -> Option<&Self> {
        if self.path == path {
            return Some(self);
        }
        self.sub_directories
            .iter()
            .find(|dir| is_within(path, &dir.path))
            .and_then(|dir| dir.find_dir(path))
    }

    /// Mutable directory node at `path`.
    pub fn find_dir_mut(&mut self, path: &str) -> Option<&mut Self> {
        if self.path == path {
            return Some(self);
        }
        self.sub_directories
            .iter_mut()
            .find(|dir| is_within(path, &dir.path))
            .and_then(|dir| dir.find_dir_mut(path))
    }

    /// Sort files and sub-directories by path, recursively.
    pub fn sort(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
        self.sub_directories.sort_by(|a, b| a.path.cmp(&b.path));
        for dir in &mut self.sub_directories {
            dir.sort();
        }
    }
}

/// Whether `path` is `dir` or lies beneath it.
fn is_within(path: &str, dir: &str) -> bool {
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Parent directory of a content path (`""` at the root).
#[must_use]
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Derive a cache from a recursive tree and the content of its blobs.
///
/// `content` is asked for every blob; submodule entries are skipped.
pub fn cache_from_tree<F>(tree: &GitTree, mut content: F) -> Result<GithubCacheFile, DiffError>
where
    F: FnMut(&TreeItem) -> Option<String>,
{
    let mut root = GithubCacheFile::empty("", tree.sha.clone());

    let mut items: Vec<&TreeItem> = tree
        .tree
        .iter()
        .filter(|item| item.kind != ObjectKind::Commit)
        .collect();
    items.sort_by_key(|item| item.path.matches('/').count());

    for item in items {
        let parent = root
            .find_dir_mut(parent_path(&item.path))
            .ok_or_else(|| DiffError::MissingParent {
                path: item.path.clone(),
            })?;
        match item.kind {
            ObjectKind::Tree => parent
                .sub_directories
                .push(GithubCacheFile::empty(item.path.clone(), item.sha.clone())),
            _ => {
                let text = content(item).ok_or_else(|| DiffError::MissingContent {
                    path: item.path.clone(),
                })?;
                parent.files.push(FileEntry {
                    path: item.path.clone(),
                    sha: item.sha.clone(),
                    content: text,
                    extra: Map::new(),
                });
            }
        }
    }

    root.sort();
    Ok(root)
}
