//! Slug and URL resolution.
//!
//! Content paths are forward-slash separated and relative to the content
//! root. A file's *flattened path* is its path without the extension
//! (`guide/intro.cn.mdx` -> `guide/intro.cn`); that is the key the
//! [`FileStore`](crate::FileStore) indexes files by.
//!
//! # URL Convention
//!
//! | Path                | Slugs              | URL (base `/docs`) |
//! |---------------------|--------------------|--------------------|
//! | `index.mdx`         | `[]`               | `/docs`            |
//! | `guide.mdx`         | `["guide"]`        | `/docs/guide`      |
//! | `guide/index.mdx`   | `["guide"]`        | `/docs/guide`      |
//! | `guide/setup.cn.md` | `["guide","setup"]`| `/cn/docs/guide/setup` (locale `cn`) |

use std::sync::Arc;

use serde::Serialize;

/// Computes the slugs of a file.
pub type SlugsFn = Arc<dyn Fn(&FileInfo) -> Vec<String> + Send + Sync>;

/// Builds a public URL from slugs and an optional locale.
pub type UrlFn = Arc<dyn Fn(&[String], Option<&str>) -> String + Send + Sync>;

/// Path components derived from a content file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Locale from a trailing `.{locale}` segment before the extension.
    pub locale: Option<String>,
    /// Path without extension, locale segment included.
    pub flattened_path: String,
    /// Base name without extension and locale.
    pub name: String,
    /// Directory part of the path (empty at the content root).
    pub dirname: String,
    /// Normalized path, extension included.
    pub path: String,
}

/// Parse a content path into its [`FileInfo`].
///
/// The path is normalized first (see [`normalize_path`]).
#[must_use]
pub fn parse_file_path(path: &str) -> FileInfo {
    let path = normalize_path(path);
    let (dirname, base) = match path.rsplit_once('/') {
        Some((dir, base)) => (dir, base),
        None => ("", path.as_str()),
    };

    let name_with_locale = base.rsplit_once('.').map_or(base, |(stem, _ext)| stem);
    let (name, locale) = match name_with_locale.split_once('.') {
        Some((name, locale)) if !locale.is_empty() => (name, Some(locale.to_owned())),
        _ => (name_with_locale, None),
    };

    let flattened_path = join_path(dirname, name_with_locale);

    FileInfo {
        locale,
        flattened_path,
        name: name.to_owned(),
        dirname: dirname.to_owned(),
        path,
    }
}

/// Compute the slugs of a file.
///
/// Directory segments followed by the base name, empty segments removed and
/// a trailing `index` dropped, so a root-level index maps to `[]`.
#[must_use]
pub fn get_slugs(info: &FileInfo) -> Vec<String> {
    let mut slugs: Vec<String> = info
        .dirname
        .split('/')
        .chain(std::iter::once(info.name.as_str()))
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect();

    if slugs.last().is_some_and(|last| last == "index") {
        slugs.pop();
    }
    slugs
}

/// Create a URL builder rooted at `base_url`.
///
/// Joins `[locale?, ...base segments, ...slugs]` with `/`. The result always
/// starts with `/`, never ends with one, and is `/` when nothing remains.
///
/// # Example
///
/// ```
/// use folio_source::create_get_url;
///
/// let url = create_get_url("/docs");
/// assert_eq!(url(&["guide".to_owned()], None), "/docs/guide");
/// assert_eq!(url(&[], Some("cn")), "/cn/docs");
/// ```
#[must_use]
pub fn create_get_url(base_url: &str) -> UrlFn {
    let base: Vec<String> = base_url
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect();

    Arc::new(move |slugs: &[String], locale: Option<&str>| {
        let segments: Vec<&str> = locale
            .into_iter()
            .chain(base.iter().map(String::as_str))
            .chain(slugs.iter().map(String::as_str))
            .filter(|segment| !segment.is_empty())
            .collect();
        format!("/{}", segments.join("/"))
    })
}

/// Default [`SlugsFn`] wrapping [`get_slugs`].
#[must_use]
pub fn default_slugs_fn() -> SlugsFn {
    Arc::new(get_slugs)
}

/// Normalize a relative content path.
///
/// Backslashes become `/`, empty and `.` segments are dropped, and `..`
/// removes the preceding segment. A leading `..` that cannot be resolved is
/// kept so callers can reject paths escaping the root.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Join two relative paths and normalize the result.
#[must_use]
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        normalize_path(name)
    } else {
        normalize_path(&format!("{dir}/{name}"))
    }
}

/// Last segment of a relative path.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, base)| base)
}

/// Display name for a path segment without a title.
///
/// Capitalizes the first character and turns `-`/`_` into spaces
/// (`getting-started` -> `Getting started`).
#[must_use]
pub fn path_to_name(segment: &str) -> String {
    let spaced = segment.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn slugs(path: &str) -> Vec<String> {
        get_slugs(&parse_file_path(path))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_get_slugs_without_extension() {
        assert_eq!(slugs("path/to/file"), vec!["path", "to", "file"]);
    }

    #[test]
    fn test_get_slugs_empty_path() {
        assert!(slugs("").is_empty());
    }

    #[test]
    fn test_get_slugs_strips_extension_and_index() {
        assert_eq!(slugs("guide/setup.mdx"), vec!["guide", "setup"]);
        assert_eq!(slugs("guide/index.mdx"), vec!["guide"]);
        assert!(slugs("index.md").is_empty());
    }

    #[test]
    fn test_get_slugs_ignores_locale() {
        assert_eq!(slugs("guide/setup.cn.mdx"), vec!["guide", "setup"]);
    }

    #[test]
    fn test_parse_file_path_localized() {
        let info = parse_file_path("/nested/test.cn.mdx");

        assert_eq!(
            info,
            FileInfo {
                locale: Some("cn".to_owned()),
                flattened_path: "nested/test.cn".to_owned(),
                name: "test".to_owned(),
                dirname: "nested".to_owned(),
                path: "nested/test.cn.mdx".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_file_path_root_meta() {
        let info = parse_file_path("./meta.json");

        assert_eq!(info.locale, None);
        assert_eq!(info.flattened_path, "meta");
        assert_eq!(info.name, "meta");
        assert_eq!(info.dirname, "");
    }

    #[test]
    fn test_create_get_url_empty_base() {
        let url = create_get_url("");
        assert_eq!(url(&strings(&["docs", "hello"]), None), "/docs/hello");
        assert_eq!(url(&strings(&[""]), None), "/");
        assert_eq!(url(&[], None), "/");
    }

    #[test]
    fn test_create_get_url_with_base() {
        let url = create_get_url("/docs");
        assert_eq!(url(&strings(&["docs", "hello"]), None), "/docs/docs/hello");
        assert_eq!(url(&strings(&[""]), None), "/docs");
        assert_eq!(url(&[], None), "/docs");
    }

    #[test]
    fn test_create_get_url_locale_prefix() {
        let url = create_get_url("/docs/");
        assert_eq!(url(&strings(&["test"]), Some("cn")), "/cn/docs/test");

        let root = create_get_url("");
        assert_eq!(root(&[], Some("en")), "/en");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./a//b/./c.md"), "a/b/c.md");
        assert_eq!(normalize_path("a/../b"), "b");
        assert_eq!(normalize_path("../outside/a.md"), "../outside/a.md");
        assert_eq!(normalize_path("a\\b.md"), "a/b.md");
    }

    #[test]
    fn test_path_to_name() {
        assert_eq!(path_to_name("nested"), "Nested");
        assert_eq!(path_to_name("getting-started"), "Getting started");
        assert_eq!(path_to_name(""), "");
    }
}
