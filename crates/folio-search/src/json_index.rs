//! Search backend writing each index to a JSON file.
//!
//! `<dir>/<index>.json` holds `{"settings": ..., "records": [...]}` and is
//! replaced atomically, so static sites can serve it directly.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::SearchError;
use crate::record::IndexRecord;
use crate::sync::{IndexSettings, SearchClient, SearchIndex};

/// On-disk shape of one index.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IndexFile {
    #[serde(default)]
    pub settings: Option<IndexSettings>,
    #[serde(default)]
    pub records: Vec<IndexRecord>,
}

/// Client for a directory of JSON index files.
#[derive(Debug, Clone)]
pub struct JsonDirClient {
    dir: PathBuf,
}

impl JsonDirClient {
    /// Use `dir` for index files; it is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SearchClient for JsonDirClient {
    type Index = JsonFileIndex;

    fn init_index(&self, name: &str) -> JsonFileIndex {
        JsonFileIndex {
            name: name.to_owned(),
            path: self.dir.join(format!("{name}.json")),
        }
    }
}

/// One JSON index file.
#[derive(Debug, Clone)]
pub struct JsonFileIndex {
    name: String,
    path: PathBuf,
}

impl JsonFileIndex {
    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current file; a missing file reads as empty.
    pub fn read(&self) -> Result<IndexFile, SearchError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IndexFile::default()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn write(&self, file: &IndexFile) -> Result<(), SearchError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        serde_json::to_writer_pretty(&mut temp, file)?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> SearchError {
        SearchError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SearchIndex for JsonFileIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_settings(&self, settings: &IndexSettings) -> Result<(), SearchError> {
        let mut file = self.read()?;
        file.settings = Some(settings.clone());
        self.write(&file)
    }

    fn replace_all_objects(&self, records: &[IndexRecord]) -> Result<(), SearchError> {
        let mut file = self.read()?;
        file.records = records.to_vec();
        self.write(&file)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::record::DocumentRecord;
    use crate::structure::structure;
    use crate::sync::{SyncOptions, sync};

    #[test]
    fn test_sync_writes_index_file() {
        let temp = tempfile::tempdir().unwrap();
        let client = JsonDirClient::new(temp.path().join("search"));
        let documents = vec![DocumentRecord {
            id: "/docs".to_owned(),
            title: "Home".to_owned(),
            url: "/docs".to_owned(),
            structured: structure("# Welcome\n\nHello.\n"),
            tag: None,
            extra_data: None,
        }];

        sync(&client, &SyncOptions::new(documents)).unwrap();

        let index = client.init_index("document");
        assert_eq!(index.path(), temp.path().join("search/document.json"));
        let file = index.read().unwrap();
        assert_eq!(file.settings, Some(IndexSettings::default()));
        let contents: Vec<_> = file.records.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["Welcome", "Hello."]);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let index = JsonDirClient::new(temp.path()).init_index("none");
        let file = index.read().unwrap();
        assert!(file.settings.is_none());
        assert!(file.records.is_empty());
    }
}
