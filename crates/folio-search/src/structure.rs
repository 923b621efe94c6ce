//! Markdown to [`StructuredData`].
//!
//! Headings become [`Heading`]s with unique ids. Paragraphs, list items,
//! block quotes and table cells become [`ContentBlock`]s tagged with the id
//! of the nearest preceding heading. Code blocks and raw HTML outside those
//! containers are not indexed.

use std::collections::HashMap;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

/// Heading and content-block decomposition of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredData {
    /// Headings in document order.
    pub headings: Vec<Heading>,
    /// Content blocks in document order.
    pub contents: Vec<ContentBlock>,
}

/// A heading with its anchor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Anchor id, unique within the document.
    pub id: String,
    /// Heading text.
    pub content: String,
}

/// A block of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Id of the governing heading; absent before the first heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Block text.
    pub content: String,
}

/// Generates unique heading ids.
///
/// The first occurrence of a slug is used as is; later ones get `-1`,
/// `-2`, ... appended, skipping suffixed ids already handed out.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    /// Create an empty slugger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique id for heading `text`.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        self.unique(if base.is_empty() { "heading" } else { &base })
    }

    /// Register an id, de-duplicating it against earlier ones.
    pub fn unique(&mut self, base: &str) -> String {
        let mut id = base.to_owned();
        while self.occurrences.contains_key(&id) {
            let count = self.occurrences.entry(base.to_owned()).or_default();
            *count += 1;
            id = format!("{base}-{count}");
        }
        self.occurrences.insert(id.clone(), 0);
        id
    }
}

/// Convert heading text to a URL fragment.
///
/// Lowercases letters and digits (any script), turns whitespace, `-` and `_`
/// runs into a single `-`, drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// Kind of block currently collecting text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Heading,
    Paragraph,
    Item,
    BlockQuote,
    TableCell,
}

/// Extract [`StructuredData`] from Markdown.
#[must_use]
pub fn structure(markdown: &str) -> StructuredData {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES;

    let mut data = StructuredData::default();
    let mut slugger = Slugger::new();
    let mut current_heading: Option<String> = None;
    let mut explicit_id: Option<String> = None;
    let mut capture: Option<Capture> = None;
    let mut quote_depth = 0usize;
    let mut buffer = String::new();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading { id, .. }) if capture.is_none() => {
                capture = Some(Capture::Heading);
                explicit_id = id.as_deref().map(str::to_owned);
                buffer.clear();
            }
            Event::End(TagEnd::Heading(_)) if capture == Some(Capture::Heading) => {
                let text = buffer.trim().to_owned();
                let id = match explicit_id.take() {
                    Some(id) => slugger.unique(&id),
                    None => slugger.slug(&text),
                };
                data.headings.push(Heading {
                    id: id.clone(),
                    content: text,
                });
                current_heading = Some(id);
                capture = None;
                buffer.clear();
            }
            Event::Start(Tag::BlockQuote(_)) => {
                if capture.is_none() {
                    capture = Some(Capture::BlockQuote);
                }
                if capture == Some(Capture::BlockQuote) {
                    quote_depth += 1;
                }
            }
            Event::End(TagEnd::BlockQuote(_)) if capture == Some(Capture::BlockQuote) => {
                quote_depth -= 1;
                if quote_depth == 0 {
                    flush(&mut buffer, current_heading.as_deref(), &mut data.contents);
                    capture = None;
                }
            }
            Event::Start(Tag::Paragraph) => match capture {
                None => capture = Some(Capture::Paragraph),
                Some(Capture::BlockQuote | Capture::Item) if !buffer.trim().is_empty() => {
                    buffer.push('\n');
                }
                _ => {}
            },
            Event::End(TagEnd::Paragraph) if capture == Some(Capture::Paragraph) => {
                flush(&mut buffer, current_heading.as_deref(), &mut data.contents);
                capture = None;
            }
            Event::Start(Tag::Item) if capture.is_none() => capture = Some(Capture::Item),
            Event::Start(Tag::List(_)) if capture == Some(Capture::Item) => {
                // Nested list: the parent item's own text ends here.
                flush(&mut buffer, current_heading.as_deref(), &mut data.contents);
                capture = None;
            }
            Event::End(TagEnd::Item) if capture == Some(Capture::Item) => {
                flush(&mut buffer, current_heading.as_deref(), &mut data.contents);
                capture = None;
            }
            Event::Start(Tag::TableCell) if capture.is_none() => capture = Some(Capture::TableCell),
            Event::End(TagEnd::TableCell) if capture == Some(Capture::TableCell) => {
                flush(&mut buffer, current_heading.as_deref(), &mut data.contents);
                capture = None;
            }
            Event::Text(text) | Event::Code(text) if capture.is_some() => buffer.push_str(&text),
            Event::SoftBreak | Event::HardBreak if capture.is_some() => buffer.push(' '),
            _ => {}
        }
    }

    data
}

/// Push the buffered text as a block, if any, and reset the buffer.
fn flush(buffer: &mut String, heading: Option<&str>, contents: &mut Vec<ContentBlock>) {
    let text = buffer.trim();
    if !text.is_empty() {
        contents.push(ContentBlock {
            heading: heading.map(str::to_owned),
            content: text.to_owned(),
        });
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn block(heading: Option<&str>, content: &str) -> ContentBlock {
        ContentBlock {
            heading: heading.map(str::to_owned),
            content: content.to_owned(),
        }
    }

    fn heading(id: &str, content: &str) -> Heading {
        Heading {
            id: id.to_owned(),
            content: content.to_owned(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  API: `get_page()`  "), "api-get-page");
        assert_eq!(slugify("Über Uns"), "über-uns");
        assert_eq!(slugify("快速开始"), "快速开始");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugger_deduplicates() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-1");
        assert_eq!(slugger.slug("Setup"), "setup-2");
        assert_eq!(slugger.slug("!!!"), "heading");
    }

    #[test]
    fn test_slugger_avoids_literal_suffix_collision() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup 1"), "setup-1");
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-2");
    }

    #[test]
    fn test_structure_groups_by_heading() {
        let markdown = "Intro text.\n\n# Install\n\nRun the installer.\n\nThen restart.\n\n## Configure\n\nEdit the file.\n";

        let data = structure(markdown);

        assert_eq!(
            data,
            StructuredData {
                headings: vec![heading("install", "Install"), heading("configure", "Configure")],
                contents: vec![
                    block(None, "Intro text."),
                    block(Some("install"), "Run the installer."),
                    block(Some("install"), "Then restart."),
                    block(Some("configure"), "Edit the file."),
                ],
            }
        );
    }

    #[test]
    fn test_structure_duplicate_headings_get_unique_ids() {
        let data = structure("# Usage\n\na\n\n# Usage\n\nb\n");

        assert_eq!(data.headings, vec![heading("usage", "Usage"), heading("usage-1", "Usage")]);
        assert_eq!(
            data.contents,
            vec![block(Some("usage"), "a"), block(Some("usage-1"), "b")]
        );
    }

    #[test]
    fn test_structure_explicit_heading_id() {
        let data = structure("## Getting Started {#start}\n\ntext\n");

        assert_eq!(data.headings, vec![heading("start", "Getting Started")]);
        assert_eq!(data.contents, vec![block(Some("start"), "text")]);
    }

    #[test]
    fn test_structure_inline_formatting_is_flattened() {
        let data = structure("# The `load` *API*\n\nCall **load** with a\nlist of [files](./files).\n");

        assert_eq!(data.headings, vec![heading("the-load-api", "The load API")]);
        assert_eq!(
            data.contents,
            vec![block(Some("the-load-api"), "Call load with a list of files.")]
        );
    }

    #[test]
    fn test_structure_lists_quotes_and_tables() {
        let markdown = "# Notes\n\n- first\n- second\n  - nested\n\n> quoted\n>\n> more\n\n| A | B |\n|---|---|\n| 1 | 2 |\n";

        let data = structure(markdown);

        assert_eq!(
            data.contents,
            vec![
                block(Some("notes"), "first"),
                block(Some("notes"), "second"),
                block(Some("notes"), "nested"),
                block(Some("notes"), "quoted\nmore"),
                block(Some("notes"), "A"),
                block(Some("notes"), "B"),
                block(Some("notes"), "1"),
                block(Some("notes"), "2"),
            ]
        );
    }

    #[test]
    fn test_structure_skips_code_blocks() {
        let data = structure("# Code\n\n```rust\nfn main() {}\n```\n\nAfter.\n");
        assert_eq!(data.contents, vec![block(Some("code"), "After.")]);
    }

    #[test]
    fn test_structured_data_serialization() {
        let data = structure("before\n\n# H\n\nafter\n");
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "headings": [{"id": "h", "content": "H"}],
                "contents": [{"content": "before"}, {"heading": "h", "content": "after"}]
            })
        );
    }
}
