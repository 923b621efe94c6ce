//! YAML front matter in Markdown pages.

use crate::file::FileData;

const DELIMITER: &str = "---";

/// Split a page into its front matter block and body.
///
/// The block must open on the first line with `---` and close with a line
/// holding only `---`. Without a closed block the whole source is body.
pub(crate) fn split_frontmatter(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return (None, source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    (None, source)
}

/// Parse a front matter block into file data.
///
/// An empty block yields empty data.
pub(crate) fn parse_frontmatter(yaml: &str) -> Result<FileData, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(FileData::new());
    }
    serde_yaml::from_str(yaml)
}
