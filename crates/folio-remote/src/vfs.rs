//! In-memory file system view of cached content.

use std::collections::BTreeMap;

use folio_source::{IncludeGlobs, LoadError, VirtualFile};

use crate::cache_file::GithubCacheFile;

/// Flat path to content map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFileSystem {
    files: BTreeMap<String, String>,
}

impl VirtualFileSystem {
    /// Create an empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file of `cache`.
    #[must_use]
    pub fn from_cache(cache: &GithubCacheFile) -> Self {
        Self {
            files: cache
                .all_files()
                .into_iter()
                .map(|file| (file.path.clone(), file.content.clone()))
                .collect(),
        }
    }

    pub fn write_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    #[must_use]
    pub fn read_file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn remove_file(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Parse included files into [`VirtualFile`]s.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] for a file that cannot be parsed.
    pub fn to_virtual_files(&self, include: &IncludeGlobs) -> Result<Vec<VirtualFile>, LoadError> {
        let mut files = Vec::new();
        for (path, content) in &self.files {
            if !include.matches(path) {
                continue;
            }
            if let Some(file) = VirtualFile::from_source(path, content)? {
                files.push(file);
            }
        }
        Ok(files)
    }
}
