//! In-memory file store.
//!
//! [`load_files`] normalizes a flat list of [`VirtualFile`]s into a
//! [`FileStore`]: files outside the configured root are dropped, the root
//! prefix is stripped, transformers run over each file's data and page slugs
//! are computed once. The store is immutable afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::LoadError;
use crate::file::{FileData, FileKind, VirtualFile};
use crate::path::{FileInfo, SlugsFn, default_slugs_fn, normalize_path, parse_file_path};

/// Rewrites a file's data during ingestion.
pub type Transformer = Arc<dyn Fn(&FileInfo, FileKind, &mut FileData) + Send + Sync>;

/// Options for [`load_files`].
#[derive(Clone)]
pub struct LoadOptions {
    /// Only files under this directory are kept; the prefix is stripped.
    pub root_dir: String,
    /// Applied in order to every kept file.
    pub transformers: Vec<Transformer>,
    /// Computes page slugs.
    pub get_slugs: SlugsFn,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            root_dir: String::new(),
            transformers: Vec::new(),
            get_slugs: default_slugs_fn(),
        }
    }
}

/// A normalized file held by the [`FileStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Path components.
    pub info: FileInfo,
    /// Page or meta.
    pub kind: FileKind,
    /// Page slugs (empty for meta files).
    pub slugs: Vec<String>,
    /// Transformed data.
    pub data: FileData,
}

impl StoredFile {
    /// Whether this file carries a locale suffix.
    #[must_use]
    pub fn is_localized(&self) -> bool {
        self.info.locale.is_some()
    }
}

/// Normalized files indexed by flattened path and kind.
#[derive(Debug, Default)]
pub struct FileStore {
    files: Vec<StoredFile>,
    index: HashMap<(String, FileKind), usize>,
    /// Directory -> indices of files directly inside it.
    dir_files: BTreeMap<String, Vec<usize>>,
    /// Directory -> direct sub-directories (full paths).
    dir_children: BTreeMap<String, BTreeSet<String>>,
}

impl FileStore {
    /// All files in insertion order.
    #[must_use]
    pub fn list(&self) -> &[StoredFile] {
        &self.files
    }

    /// Look up a file by flattened path (no extension) and kind.
    ///
    /// The path is normalized before lookup, so `./guide/intro` and
    /// `guide/intro` are the same key. Localized variants are addressed with
    /// their suffix (`guide/intro.cn`).
    #[must_use]
    pub fn read(&self, path: &str, kind: FileKind) -> Option<&StoredFile> {
        let key = (normalize_path(path), kind);
        self.index.get(&key).map(|&i| &self.files[i])
    }

    /// Whether `path` is a directory holding at least one file.
    #[must_use]
    pub fn is_dir(&self, path: &str) -> bool {
        self.dir_files.contains_key(&normalize_path(path))
    }

    /// Files directly inside `dir`, in insertion order.
    pub fn files_in(&self, dir: &str) -> impl Iterator<Item = &StoredFile> {
        self.dir_files
            .get(dir)
            .into_iter()
            .flatten()
            .map(|&i| &self.files[i])
    }

    /// Direct sub-directories of `dir`, sorted.
    pub fn subdirs(&self, dir: &str) -> impl Iterator<Item = &str> {
        self.dir_children
            .get(dir)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Number of stored files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, file: StoredFile) -> Result<(), LoadError> {
        let key = (file.info.flattened_path.clone(), file.kind);
        if self.index.contains_key(&key) {
            return Err(LoadError::Duplicate {
                path: key.0,
                kind: key.1,
            });
        }

        let position = self.files.len();
        self.register_dir(&file.info.dirname);
        self.dir_files
            .entry(file.info.dirname.clone())
            .or_default()
            .push(position);
        self.index.insert(key, position);
        self.files.push(file);
        Ok(())
    }

    /// Record `dir` and all its ancestors.
    fn register_dir(&mut self, dir: &str) {
        let mut current = dir.to_owned();
        loop {
            self.dir_files.entry(current.clone()).or_default();
            if current.is_empty() {
                break;
            }
            let parent = current
                .rsplit_once('/')
                .map_or_else(String::new, |(parent, _)| parent.to_owned());
            self.dir_children
                .entry(parent.clone())
                .or_default()
                .insert(current);
            current = parent;
        }
    }
}

/// Ingest `files` into a [`FileStore`].
///
/// # Errors
///
/// Returns [`LoadError::Duplicate`] when two files share a flattened path
/// and kind after normalization (e.g. `a.md` and `./a.mdx`), and
/// [`LoadError::OutsideRoot`] when `root_dir` escapes the content root.
pub fn load_files(files: Vec<VirtualFile>, options: &LoadOptions) -> Result<FileStore, LoadError> {
    let root = normalize_path(&options.root_dir);
    if root.starts_with("..") {
        return Err(LoadError::OutsideRoot(options.root_dir.clone()));
    }

    let mut store = FileStore::default();
    for file in files {
        let normalized = normalize_path(&file.path);
        let relative = if root.is_empty() {
            normalized
        } else if let Some(rest) = normalized.strip_prefix(&root)
            && let Some(rest) = rest.strip_prefix('/')
        {
            rest.to_owned()
        } else {
            tracing::debug!(path = %file.path, root = %root, "Skipping file outside root");
            continue;
        };
        if relative.starts_with("..") {
            tracing::debug!(path = %file.path, "Skipping file outside content root");
            continue;
        }

        let info = parse_file_path(&relative);
        let mut data = file.data;
        for transform in &options.transformers {
            transform(&info, file.kind, &mut data);
        }
        let slugs = match file.kind {
            FileKind::Page => (options.get_slugs)(&info),
            FileKind::Meta => Vec::new(),
        };

        store.insert(StoredFile {
            info,
            kind: file.kind,
            slugs,
            data,
        })?;
    }

    tracing::debug!(files = store.len(), "Loaded file store");
    Ok(store)
}
