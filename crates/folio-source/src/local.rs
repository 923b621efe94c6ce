//! Content from a local directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::LoadError;
use crate::file::VirtualFile;

/// Include patterns for content paths.
///
/// An empty pattern list includes everything.
#[derive(Debug, Clone, Default)]
pub struct IncludeGlobs {
    patterns: Vec<Pattern>,
}

impl IncludeGlobs {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidPattern`] for a malformed pattern.
    pub fn new(patterns: &[String]) -> Result<Self, LoadError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| LoadError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether relative `path` is included.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|pattern| pattern.matches_with(path, options))
    }
}

/// Reads content files from a directory on disk.
///
/// Hidden entries (leading `.`) are skipped. Relative paths are matched
/// against the include patterns.
#[derive(Debug)]
pub struct LocalSource {
    dir: PathBuf,
    include: IncludeGlobs,
}

impl LocalSource {
    /// Create a source rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidPattern`] for a malformed pattern.
    pub fn new(dir: impl Into<PathBuf>, include: &[String]) -> Result<Self, LoadError> {
        Ok(Self {
            dir: dir.into(),
            include: IncludeGlobs::new(include)?,
        })
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Relative paths of every included file, sorted.
    ///
    /// A missing directory yields no paths.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when a directory cannot be listed.
    pub fn paths(&self) -> Result<Vec<String>, LoadError> {
        let mut paths = Vec::new();
        if self.dir.exists() {
            self.walk(&self.dir, "", &mut paths)?;
        }
        paths.sort();
        Ok(paths)
    }

    /// Read every included file as a [`VirtualFile`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] on I/O failures or unparsable files.
    pub fn files(&self) -> Result<Vec<VirtualFile>, LoadError> {
        let mut files = Vec::new();
        for path in self.paths()? {
            let source = self.read(&path)?;
            if let Some(file) = VirtualFile::from_source(&path, &source)? {
                files.push(file);
            }
        }
        tracing::debug!(dir = %self.dir.display(), files = files.len(), "Read local content");
        Ok(files)
    }

    /// Raw contents of every included file keyed by relative path.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when a file cannot be read.
    pub fn contents(&self) -> Result<BTreeMap<String, String>, LoadError> {
        self.paths()?
            .into_iter()
            .map(|path| {
                let content = self.read(&path)?;
                Ok((path, content))
            })
            .collect()
    }

    /// Read one file by relative path.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be read.
    pub fn read(&self, path: &str) -> Result<String, LoadError> {
        let full = self.dir.join(path);
        fs::read_to_string(&full).map_err(|source| LoadError::Io { path: full, source })
    }

    fn walk(&self, dir: &Path, prefix: &str, paths: &mut Vec<String>) -> Result<(), LoadError> {
        let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.walk(&entry.path(), &relative, paths)?;
            } else if self.include.matches(&relative) {
                paths.push(relative);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::file::{FileKind, data_str};

    fn default_include() -> Vec<String> {
        vec!["**/*.md".to_owned(), "**/*.mdx".to_owned(), "**/*.json".to_owned()]
    }

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_paths_filters_and_sorts() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "index.mdx", "# Home");
        write(temp.path(), "guide/setup.md", "# Setup");
        write(temp.path(), "guide/meta.json", "{}");
        write(temp.path(), "guide/diagram.png", "png");
        write(temp.path(), ".hidden/secret.md", "# Secret");

        let source = LocalSource::new(temp.path(), &default_include()).unwrap();

        assert_eq!(
            source.paths().unwrap(),
            vec!["guide/meta.json", "guide/setup.md", "index.mdx"]
        );
    }

    #[test]
    fn test_files_parse_pages_and_meta() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "test.mdx", "---\ntitle: Hello\n---\nBody");
        write(temp.path(), "meta.json", r#"{"pages": ["test"]}"#);

        let files = LocalSource::new(temp.path(), &default_include())
            .unwrap()
            .files()
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "meta.json");
        assert_eq!(files[0].kind, FileKind::Meta);
        assert_eq!(files[1].kind, FileKind::Page);
        assert_eq!(data_str(&files[1].data, "title"), Some("Hello"));
    }

    #[test]
    fn test_contents_keyed_by_path() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "a.md", "A");
        write(temp.path(), "b/c.json", "{}");

        let contents = LocalSource::new(temp.path(), &default_include())
            .unwrap()
            .contents()
            .unwrap();

        assert_eq!(
            contents.into_iter().collect::<Vec<_>>(),
            vec![
                ("a.md".to_owned(), "A".to_owned()),
                ("b/c.json".to_owned(), "{}".to_owned()),
            ]
        );
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let source = LocalSource::new("/nonexistent/folio-content", &default_include()).unwrap();
        assert!(source.paths().unwrap().is_empty());
    }

    #[test]
    fn test_include_globs() {
        let globs = IncludeGlobs::new(&default_include()).unwrap();
        assert!(globs.matches("index.mdx"));
        assert!(globs.matches("a/b/meta.json"));
        assert!(!globs.matches("a/image.png"));
        assert!(IncludeGlobs::default().matches("anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = LocalSource::new(".", &["[".to_owned()]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_meta_names_file() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "meta.json", "[1, 2");

        let err = LocalSource::new(temp.path(), &default_include())
            .unwrap()
            .files()
            .unwrap_err();
        assert!(err.to_string().contains("meta.json"));
    }
}
