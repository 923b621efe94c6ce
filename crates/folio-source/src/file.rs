//! Virtual content files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::frontmatter::split_frontmatter;

/// Object data attached to a file (front matter keys or meta JSON).
pub type FileData = Map<String, Value>;

/// Role of a content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Markdown/MDX document.
    Page,
    /// JSON sidecar describing a directory.
    Meta,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page => f.write_str("page"),
            Self::Meta => f.write_str("meta"),
        }
    }
}

/// A content file as delivered by a source (local directory, remote tree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualFile {
    /// Forward-slash separated path relative to the content root.
    pub path: String,
    /// Page or meta.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Parsed data.
    #[serde(default)]
    pub data: FileData,
}

impl VirtualFile {
    /// Create a page file.
    #[must_use]
    pub fn page(path: impl Into<String>, data: FileData) -> Self {
        Self {
            path: path.into(),
            kind: FileKind::Page,
            data,
        }
    }

    /// Create a meta file.
    #[must_use]
    pub fn meta(path: impl Into<String>, data: FileData) -> Self {
        Self {
            path: path.into(),
            kind: FileKind::Meta,
            data,
        }
    }

    /// Build a file from raw source text, choosing the kind by extension.
    ///
    /// `.json` files are meta files and must hold a JSON object. `.md` and
    /// `.mdx` files are pages: their YAML front matter becomes the data and
    /// the remaining body is stored under `content`. Other extensions yield
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidMeta`] or [`LoadError::InvalidFrontmatter`]
    /// naming `path` when the source does not parse.
    pub fn from_source(path: &str, source: &str) -> Result<Option<Self>, LoadError> {
        let Some((_, extension)) = path.rsplit_once('.') else {
            return Ok(None);
        };

        match extension {
            "json" => {
                let data: FileData =
                    serde_json::from_str(source).map_err(|e| LoadError::InvalidMeta {
                        path: path.to_owned(),
                        message: e.to_string(),
                    })?;
                Ok(Some(Self::meta(path, data)))
            }
            "md" | "mdx" => {
                let (frontmatter, body) = split_frontmatter(source);
                let mut data = match frontmatter {
                    Some(yaml) => crate::frontmatter::parse_frontmatter(yaml).map_err(|e| {
                        LoadError::InvalidFrontmatter {
                            path: path.to_owned(),
                            message: e.to_string(),
                        }
                    })?,
                    None => FileData::new(),
                };
                data.insert("content".to_owned(), Value::String(body.to_owned()));
                Ok(Some(Self::page(path, data)))
            }
            _ => Ok(None),
        }
    }
}

/// Directory metadata read from `meta.json` (or `meta.{locale}.json`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// Folder title.
    pub title: Option<String>,
    /// Ordering directives.
    pub pages: Option<Vec<String>>,
    /// Icon name handed to the icon resolver.
    pub icon: Option<String>,
    /// Whether the folder starts expanded.
    pub default_open: Option<bool>,
    /// Whether the folder is a navigation root.
    pub root: Option<bool>,
}

impl MetaData {
    /// Read metadata from file data. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when a known key has the wrong shape.
    pub fn from_data(data: &FileData) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(data.clone()))
    }

    /// Overlay `localized` on top of `self`, field by field.
    #[must_use]
    pub fn merged_with(self, localized: Self) -> Self {
        Self {
            title: localized.title.or(self.title),
            pages: localized.pages.or(self.pages),
            icon: localized.icon.or(self.icon),
            default_open: localized.default_open.or(self.default_open),
            root: localized.root.or(self.root),
        }
    }
}

/// Read a string field from file data.
#[must_use]
pub fn data_str<'a>(data: &'a FileData, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_source_meta() {
        let file = VirtualFile::from_source("guide/meta.json", r#"{"title": "Guide", "pages": ["intro", "..."]}"#)
            .unwrap()
            .unwrap();

        assert_eq!(file.kind, FileKind::Meta);
        let meta = MetaData::from_data(&file.data).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Guide"));
        assert_eq!(meta.pages, Some(vec!["intro".to_owned(), "...".to_owned()]));
    }

    #[test]
    fn test_from_source_page_with_frontmatter() {
        let source = "---\ntitle: Hello\ndescription: First page\n---\n# Hello\n\nBody text.\n";
        let file = VirtualFile::from_source("test.mdx", source).unwrap().unwrap();

        assert_eq!(file.kind, FileKind::Page);
        assert_eq!(data_str(&file.data, "title"), Some("Hello"));
        assert_eq!(data_str(&file.data, "description"), Some("First page"));
        assert_eq!(data_str(&file.data, "content"), Some("# Hello\n\nBody text.\n"));
    }

    #[test]
    fn test_from_source_page_without_frontmatter() {
        let file = VirtualFile::from_source("a.md", "plain body").unwrap().unwrap();
        assert_eq!(file.data, json!({"content": "plain body"}).as_object().unwrap().clone());
    }

    #[test]
    fn test_from_source_ignores_other_extensions() {
        assert!(VirtualFile::from_source("logo.svg", "<svg/>").unwrap().is_none());
        assert!(VirtualFile::from_source("LICENSE", "MIT").unwrap().is_none());
    }

    #[test]
    fn test_from_source_invalid_meta_names_path() {
        let err = VirtualFile::from_source("broken/meta.json", "{not json").unwrap_err();
        assert!(err.to_string().contains("broken/meta.json"));
    }

    #[test]
    fn test_meta_from_data_wrong_shape() {
        let data = json!({"pages": "intro"}).as_object().unwrap().clone();
        assert!(MetaData::from_data(&data).is_err());
    }

    #[test]
    fn test_meta_merged_with_localized() {
        let default = MetaData {
            title: Some("Docs".to_owned()),
            pages: Some(vec!["a".to_owned()]),
            default_open: Some(true),
            ..MetaData::default()
        };
        let localized = MetaData {
            title: Some("Docs Chinese".to_owned()),
            ..MetaData::default()
        };

        let merged = default.merged_with(localized);

        assert_eq!(merged.title.as_deref(), Some("Docs Chinese"));
        assert_eq!(merged.pages, Some(vec!["a".to_owned()]));
        assert_eq!(merged.default_open, Some(true));
    }
}
