//! Documents and the flat records pushed to a search index.

use std::collections::HashSet;

use folio_source::FileData;
use serde::{Deserialize, Serialize};

use crate::structure::StructuredData;

/// Record fields that extra data may not override.
const RESERVED_FIELDS: &[&str] = &[
    "objectID",
    "title",
    "url",
    "page_id",
    "tag",
    "section",
    "section_id",
    "content",
];

/// A page as submitted for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable document id; record ids derive from it.
    #[serde(rename = "_id")]
    pub id: String,
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Extracted page structure.
    pub structured: StructuredData,
    /// Optional filter tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Extra fields copied onto every record of the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<FileData>,
}

/// One searchable unit: a heading or a content block of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// `{document id}-{position}`.
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub title: String,
    pub url: String,
    /// Id of the owning document; records are distinct per page.
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Heading text of the governing section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Heading id of the governing section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    pub content: String,
    /// Extra document fields.
    #[serde(flatten)]
    pub extra: FileData,
}

/// Section-level slice of a document before it becomes a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub section: Option<String>,
    pub section_id: Option<String>,
    pub content: String,
}

/// Split structured data into sections.
///
/// Every content block yields one section carrying its heading. The first
/// time a heading is seen it also yields a heading-only section placed
/// immediately before the block, so each heading is searchable once.
/// Headings that govern no block are not emitted.
#[must_use]
pub fn get_sections(data: &StructuredData) -> Vec<Section> {
    let mut scanned: HashSet<&str> = HashSet::new();
    let mut sections = Vec::with_capacity(data.contents.len());

    for block in &data.contents {
        let heading = block
            .heading
            .as_deref()
            .and_then(|id| data.headings.iter().find(|h| h.id == id));

        if let Some(heading) = heading
            && scanned.insert(heading.id.as_str())
        {
            sections.push(Section {
                section: Some(heading.content.clone()),
                section_id: Some(heading.id.clone()),
                content: heading.content.clone(),
            });
        }

        sections.push(Section {
            section: heading.map(|h| h.content.clone()),
            section_id: heading.map(|h| h.id.clone()),
            content: block.content.clone(),
        });
    }

    sections
}

impl DocumentRecord {
    /// Flatten the document into index records.
    ///
    /// Record ids are `{id}-{position}`, so re-indexing an unchanged page
    /// yields the same ids. Extra fields that collide with record fields are
    /// dropped with a warning.
    #[must_use]
    pub fn to_records(&self) -> Vec<IndexRecord> {
        let extra = self.filtered_extra();
        get_sections(&self.structured)
            .into_iter()
            .enumerate()
            .map(|(idx, section)| IndexRecord {
                object_id: format!("{}-{idx}", self.id),
                title: self.title.clone(),
                url: self.url.clone(),
                page_id: self.id.clone(),
                tag: self.tag.clone(),
                section: section.section,
                section_id: section.section_id,
                content: section.content,
                extra: extra.clone(),
            })
            .collect()
    }

    fn filtered_extra(&self) -> FileData {
        let Some(extra) = &self.extra_data else {
            return FileData::new();
        };
        extra
            .iter()
            .filter(|(key, _)| {
                let reserved = RESERVED_FIELDS.contains(&key.as_str());
                if reserved {
                    tracing::warn!(document = %self.id, field = %key, "Ignoring extra field that shadows a record field");
                }
                !reserved
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::structure::{ContentBlock, Heading};

    fn structured() -> StructuredData {
        StructuredData {
            headings: vec![
                Heading {
                    id: "h1".to_owned(),
                    content: "H1".to_owned(),
                },
                Heading {
                    id: "h2".to_owned(),
                    content: "H2".to_owned(),
                },
            ],
            contents: vec![
                ContentBlock {
                    heading: Some("h1".to_owned()),
                    content: "text1".to_owned(),
                },
                ContentBlock {
                    heading: Some("h1".to_owned()),
                    content: "text2".to_owned(),
                },
                ContentBlock {
                    heading: None,
                    content: "text3".to_owned(),
                },
            ],
        }
    }

    fn section(heading: Option<(&str, &str)>, content: &str) -> Section {
        Section {
            section: heading.map(|(_, text)| text.to_owned()),
            section_id: heading.map(|(id, _)| id.to_owned()),
            content: content.to_owned(),
        }
    }

    fn document() -> DocumentRecord {
        DocumentRecord {
            id: "page".to_owned(),
            title: "Page".to_owned(),
            url: "/docs/page".to_owned(),
            structured: structured(),
            tag: None,
            extra_data: None,
        }
    }

    #[test]
    fn test_get_sections_emits_heading_once() {
        let sections = get_sections(&structured());

        assert_eq!(
            sections,
            vec![
                section(Some(("h1", "H1")), "H1"),
                section(Some(("h1", "H1")), "text1"),
                section(Some(("h1", "H1")), "text2"),
                section(None, "text3"),
            ]
        );
    }

    #[test]
    fn test_get_sections_two_headings_with_leading_text() {
        let heading = |id: &str, content: &str| Heading {
            id: id.to_owned(),
            content: content.to_owned(),
        };
        let block = |heading: Option<&str>, content: &str| ContentBlock {
            heading: heading.map(str::to_owned),
            content: content.to_owned(),
        };
        let data = StructuredData {
            headings: vec![heading("h1", "H1"), heading("h2", "H2")],
            contents: vec![
                block(None, "intro"),
                block(Some("h1"), "text1"),
                block(Some("h1"), "text2"),
                block(Some("h2"), "text"),
            ],
        };

        assert_eq!(
            get_sections(&data),
            vec![
                section(None, "intro"),
                section(Some(("h1", "H1")), "H1"),
                section(Some(("h1", "H1")), "text1"),
                section(Some(("h1", "H1")), "text2"),
                section(Some(("h2", "H2")), "H2"),
                section(Some(("h2", "H2")), "text"),
            ]
        );
    }

    #[test]
    fn test_get_sections_unknown_heading_is_untagged() {
        let data = StructuredData {
            headings: Vec::new(),
            contents: vec![ContentBlock {
                heading: Some("missing".to_owned()),
                content: "text".to_owned(),
            }],
        };

        assert_eq!(get_sections(&data), vec![section(None, "text")]);
    }

    #[test]
    fn test_get_sections_empty() {
        assert!(get_sections(&StructuredData::default()).is_empty());
    }

    #[test]
    fn test_to_records_ids_are_positional() {
        let records = document().to_records();

        let ids: Vec<_> = records.iter().map(|r| r.object_id.as_str()).collect();
        assert_eq!(ids, vec!["page-0", "page-1", "page-2", "page-3"]);
        assert!(records.iter().all(|r| r.page_id == "page"));
        assert_eq!(document().to_records(), records);
    }

    #[test]
    fn test_to_records_serialization() {
        let mut doc = document();
        doc.tag = Some("v2".to_owned());
        doc.extra_data = Some(
            json!({"lang": "en", "title": "Hijacked"})
                .as_object()
                .unwrap()
                .clone(),
        );

        let records = doc.to_records();
        let first = serde_json::to_value(&records[0]).unwrap();
        let last = serde_json::to_value(&records[3]).unwrap();

        assert_eq!(
            first,
            json!({
                "objectID": "page-0",
                "title": "Page",
                "url": "/docs/page",
                "page_id": "page",
                "tag": "v2",
                "section": "H1",
                "section_id": "h1",
                "content": "H1",
                "lang": "en",
            })
        );
        assert_eq!(
            last,
            json!({
                "objectID": "page-3",
                "title": "Page",
                "url": "/docs/page",
                "page_id": "page",
                "tag": "v2",
                "content": "text3",
                "lang": "en",
            })
        );
    }

    #[test]
    fn test_document_record_wire_names() {
        let value = serde_json::to_value(document()).unwrap();
        assert_eq!(value["_id"], json!("page"));
        assert!(value.get("tag").is_none());
    }
}
