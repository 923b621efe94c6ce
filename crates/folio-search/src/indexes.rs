//! Search input built from loaded pages.

use folio_source::{FileData, LoaderOutput, Page, data_str, path_to_name};
use serde::Serialize;
use serde_json::Value;

use crate::record::DocumentRecord;
use crate::structure::{StructuredData, structure};

/// Title and raw body of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleIndex {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Page with its extracted structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedIndex {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub structured_data: StructuredData,
}

/// Indexes of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageIndexes<T> {
    pub language: String,
    pub indexes: Vec<T>,
}

/// Page title: the `title` field, else the file name.
fn page_title(page: &Page) -> String {
    data_str(&page.data, "title").map_or_else(|| path_to_name(&page.file.name), str::to_owned)
}

fn page_content(page: &Page) -> &str {
    data_str(&page.data, "content").unwrap_or_default()
}

/// Simple indexes for `pages`.
#[must_use]
pub fn simple_indexes(pages: &[Page]) -> Vec<SimpleIndex> {
    pages
        .iter()
        .map(|page| SimpleIndex {
            title: page_title(page),
            content: page_content(page).to_owned(),
            url: page.url.clone(),
        })
        .collect()
}

/// Advanced indexes for `pages`; ids are page URLs.
#[must_use]
pub fn advanced_indexes(pages: &[Page]) -> Vec<AdvancedIndex> {
    pages
        .iter()
        .map(|page| AdvancedIndex {
            id: page.url.clone(),
            title: page_title(page),
            description: data_str(&page.data, "description").map(str::to_owned),
            url: page.url.clone(),
            structured_data: structure(page_content(page)),
        })
        .collect()
}

/// Apply `build` to the pages of every language.
///
/// Without languages the default locale is returned under `""`.
pub fn per_language<T>(
    output: &LoaderOutput,
    build: impl Fn(&[Page]) -> Vec<T>,
) -> Vec<LanguageIndexes<T>> {
    let languages = output.get_languages();
    if languages.is_empty() {
        return vec![LanguageIndexes {
            language: String::new(),
            indexes: build(output.get_pages(None)),
        }];
    }
    languages
        .into_iter()
        .map(|entry| LanguageIndexes {
            language: entry.language.to_owned(),
            indexes: build(entry.pages),
        })
        .collect()
}

/// Search documents for `pages`.
///
/// Document ids are page URLs, unique across locales. The page locale and
/// description, when present, travel as extra data.
#[must_use]
pub fn document_records(pages: &[Page], tag: Option<&str>) -> Vec<DocumentRecord> {
    pages
        .iter()
        .map(|page| {
            let mut extra = FileData::new();
            if let Some(locale) = &page.locale {
                extra.insert("locale".to_owned(), Value::String(locale.clone()));
            }
            if let Some(description) = data_str(&page.data, "description") {
                extra.insert("description".to_owned(), Value::String(description.to_owned()));
            }
            DocumentRecord {
                id: page.url.clone(),
                title: page_title(page),
                url: page.url.clone(),
                structured: structure(page_content(page)),
                tag: tag.map(str::to_owned),
                extra_data: (!extra.is_empty()).then_some(extra),
            }
        })
        .collect()
}

/// Search documents for every locale of `output`.
#[must_use]
pub fn all_document_records(output: &LoaderOutput, tag: Option<&str>) -> Vec<DocumentRecord> {
    per_language(output, |pages| document_records(pages, tag))
        .into_iter()
        .flat_map(|entry| entry.indexes)
        .collect()
}

#[cfg(test)]
mod tests {
    use folio_source::{Loader, LoaderOptions, VirtualFile};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> FileData {
        value.as_object().unwrap().clone()
    }

    fn files() -> Vec<VirtualFile> {
        vec![
            VirtualFile::page(
                "index.mdx",
                data(json!({"title": "Home", "description": "Start here", "content": "# Welcome\n\nHello."})),
            ),
            VirtualFile::page("getting-started.md", data(json!({"content": "Install it."}))),
        ]
    }

    #[test]
    fn test_simple_indexes() {
        let output = Loader::new(LoaderOptions::new("/docs")).load(files()).unwrap();

        let mut indexes = simple_indexes(output.get_pages(None));
        indexes.sort_by(|a, b| a.url.cmp(&b.url));

        assert_eq!(
            indexes,
            vec![
                SimpleIndex {
                    title: "Home".to_owned(),
                    content: "# Welcome\n\nHello.".to_owned(),
                    url: "/docs".to_owned(),
                },
                SimpleIndex {
                    title: "Getting started".to_owned(),
                    content: "Install it.".to_owned(),
                    url: "/docs/getting-started".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_advanced_indexes_structure_content() {
        let output = Loader::new(LoaderOptions::new("/docs")).load(files()).unwrap();

        let indexes = advanced_indexes(output.get_pages(None));
        let home = indexes.iter().find(|i| i.url == "/docs").unwrap();

        assert_eq!(home.id, "/docs");
        assert_eq!(home.description.as_deref(), Some("Start here"));
        assert_eq!(home.structured_data.headings[0].id, "welcome");
        assert_eq!(home.structured_data.contents[0].content, "Hello.");
    }

    #[test]
    fn test_per_language_i18n() {
        let mut files = files();
        files.push(VirtualFile::page("index.cn.mdx", data(json!({"title": "首页", "content": "你好"}))));
        let output = Loader::new(LoaderOptions::new("/docs").with_languages(vec!["en".to_owned(), "cn".to_owned()]))
            .load(files)
            .unwrap();

        let indexes = per_language(&output, simple_indexes);

        let languages: Vec<_> = indexes.iter().map(|e| e.language.as_str()).collect();
        assert_eq!(languages, vec!["en", "cn"]);
        let cn_home = indexes[1].indexes.iter().find(|i| i.url == "/cn/docs").unwrap();
        assert_eq!(cn_home.title, "首页");
    }

    #[test]
    fn test_per_language_default_only() {
        let output = Loader::new(LoaderOptions::new("/docs")).load(files()).unwrap();
        let indexes = per_language(&output, simple_indexes);
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].language, "");
        assert_eq!(indexes[0].indexes.len(), 2);
    }

    #[test]
    fn test_document_records_carry_tag_and_extra() {
        let output = Loader::new(LoaderOptions::new("/docs")).load(files()).unwrap();

        let records = all_document_records(&output, Some("v1"));
        let home = records.iter().find(|r| r.id == "/docs").unwrap();

        assert_eq!(home.tag.as_deref(), Some("v1"));
        assert_eq!(
            home.extra_data,
            Some(data(json!({"description": "Start here"})))
        );
        let other = records.iter().find(|r| r.id == "/docs/getting-started").unwrap();
        assert_eq!(other.extra_data, None);
    }
}
