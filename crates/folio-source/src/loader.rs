//! Loader: file store, page trees and page lookup in one result.
//!
//! Page maps and trees are always keyed by locale string. The default
//! locale is `""`; in i18n builds every configured language gets its own
//! entry as well.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::error::LoaderError;
use crate::file::{FileData, FileKind, VirtualFile};
use crate::page_tree::{IconResolver, PageTreeBuilder, Root};
use crate::path::{FileInfo, SlugsFn, UrlFn, create_get_url, default_slugs_fn, join_path};
use crate::storage::{FileStore, LoadOptions, StoredFile, Transformer, load_files};

/// Key of the default locale.
pub const DEFAULT_LOCALE: &str = "";

/// Options for [`Loader`].
#[derive(Clone)]
pub struct LoaderOptions {
    /// URL prefix of every page.
    pub base_url: String,
    /// Only files under this directory are loaded.
    pub root_dir: String,
    /// Configured locales. `None` builds a single tree.
    pub languages: Option<Vec<String>>,
    /// Data transformers, applied in order.
    pub transformers: Vec<Transformer>,
    /// Slug computation.
    pub get_slugs: SlugsFn,
    /// URL computation. Defaults to [`create_get_url`] over `base_url`.
    pub get_url: Option<UrlFn>,
    /// Icon resolution.
    pub resolve_icon: Option<IconResolver>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            base_url: "/".to_owned(),
            root_dir: String::new(),
            languages: None,
            transformers: Vec::new(),
            get_slugs: default_slugs_fn(),
            get_url: None,
            resolve_icon: None,
        }
    }
}

impl LoaderOptions {
    /// Options with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Enable i18n builds for `languages`.
    #[must_use]
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Only load files under `root_dir`.
    #[must_use]
    pub fn with_root_dir(mut self, root_dir: impl Into<String>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    /// Append a data transformer.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Use `resolver` for icons.
    #[must_use]
    pub fn with_icon_resolver(mut self, resolver: IconResolver) -> Self {
        self.resolve_icon = Some(resolver);
        self
    }
}

/// A resolved page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Path components of the file backing this page (localized if used).
    pub file: FileInfo,
    /// Slugs shared by every locale variant.
    pub slugs: Vec<String>,
    /// Public URL for this locale.
    pub url: String,
    /// Locale of this entry (`None` for the default map).
    pub locale: Option<String>,
    /// Page data (front matter plus `content`).
    pub data: FileData,
}

/// Pages of one language.
#[derive(Debug, Clone, Copy)]
pub struct LanguagePages<'a> {
    /// Language key.
    pub language: &'a str,
    /// Pages in that language.
    pub pages: &'a [Page],
}

/// Everything a content load produces.
#[derive(Debug)]
pub struct LoaderOutput {
    files: FileStore,
    page_trees: BTreeMap<String, Root>,
    pages: BTreeMap<String, Vec<Page>>,
    slug_index: HashMap<(String, Vec<String>), usize>,
    languages: Vec<String>,
    warnings: Vec<String>,
}

impl LoaderOutput {
    /// Page tree for `locale` (`""` in single-locale builds).
    #[must_use]
    pub fn page_tree(&self, locale: &str) -> Option<&Root> {
        self.page_trees.get(locale)
    }

    /// All page trees keyed by locale.
    #[must_use]
    pub fn page_trees(&self) -> &BTreeMap<String, Root> {
        &self.page_trees
    }

    /// Pages of `locale`, or of the default locale when `None`.
    #[must_use]
    pub fn get_pages(&self, locale: Option<&str>) -> &[Page] {
        self.pages
            .get(locale.unwrap_or(DEFAULT_LOCALE))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Page with exactly `slugs` in `locale` (default locale when `None`).
    #[must_use]
    pub fn get_page<S: AsRef<str>>(&self, slugs: &[S], locale: Option<&str>) -> Option<&Page> {
        let locale = locale.unwrap_or(DEFAULT_LOCALE);
        let key = (
            locale.to_owned(),
            slugs.iter().map(|s| s.as_ref().to_owned()).collect(),
        );
        let index = *self.slug_index.get(&key)?;
        self.pages.get(locale)?.get(index)
    }

    /// Pages of each configured language (empty without i18n).
    #[must_use]
    pub fn get_languages(&self) -> Vec<LanguagePages<'_>> {
        self.languages
            .iter()
            .map(|language| LanguagePages {
                language,
                pages: self.get_pages(Some(language.as_str())),
            })
            .collect()
    }

    /// The underlying file store.
    #[must_use]
    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Non-fatal problems from every tree build.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Loads files into a [`LoaderOutput`].
pub struct Loader {
    options: LoaderOptions,
    get_url: UrlFn,
}

impl Loader {
    /// Create a loader.
    #[must_use]
    pub fn new(options: LoaderOptions) -> Self {
        let get_url = options
            .get_url
            .clone()
            .unwrap_or_else(|| create_get_url(&options.base_url));
        Self { options, get_url }
    }

    /// The options this loader was built with.
    #[must_use]
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Public URL for `slugs` in `locale`.
    #[must_use]
    pub fn url(&self, slugs: &[String], locale: Option<&str>) -> String {
        (self.get_url)(slugs, locale)
    }

    /// The URL builder pages are resolved with.
    #[must_use]
    pub fn url_fn(&self) -> &UrlFn {
        &self.get_url
    }

    /// Load `files`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError`] on duplicate files or duplicate slugs.
    pub fn load(&self, files: Vec<VirtualFile>) -> Result<LoaderOutput, LoaderError> {
        let load_options = LoadOptions {
            root_dir: self.options.root_dir.clone(),
            transformers: self.options.transformers.clone(),
            get_slugs: Arc::clone(&self.options.get_slugs),
        };
        let store = load_files(files, &load_options)?;
        let builder = PageTreeBuilder::new(&store, Arc::clone(&self.get_url))
            .with_icon_resolver(self.options.resolve_icon.clone());

        let languages = self.options.languages.clone().unwrap_or_default();
        let mut page_trees = BTreeMap::new();
        let mut warnings = Vec::new();
        if self.options.languages.is_some() {
            for (language, tree) in builder.build_i18n(&languages)? {
                warnings.extend(tree.warnings);
                page_trees.insert(language, tree.root);
            }
        } else {
            let tree = builder.build()?;
            warnings.extend(tree.warnings);
            page_trees.insert(DEFAULT_LOCALE.to_owned(), tree.root);
        }

        let mut pages = BTreeMap::new();
        pages.insert(DEFAULT_LOCALE.to_owned(), self.page_map(&store, None));
        for language in &languages {
            pages.insert(language.clone(), self.page_map(&store, Some(language.as_str())));
        }

        let mut slug_index = HashMap::new();
        for (locale, entries) in &pages {
            for (i, page) in entries.iter().enumerate() {
                slug_index.insert((locale.clone(), page.slugs.clone()), i);
            }
        }

        tracing::info!(
            files = store.len(),
            pages = pages.get(DEFAULT_LOCALE).map_or(0, Vec::len),
            languages = languages.len(),
            "Content loaded"
        );

        Ok(LoaderOutput {
            files: store,
            page_trees,
            pages,
            slug_index,
            languages,
            warnings,
        })
    }

    /// One entry per default-locale page, localized where a variant exists.
    fn page_map(&self, store: &FileStore, locale: Option<&str>) -> Vec<Page> {
        store
            .list()
            .iter()
            .filter(|file| file.kind == FileKind::Page && !file.is_localized())
            .map(|file| {
                let source = locale
                    .and_then(|locale| localized_variant(store, file, locale))
                    .unwrap_or(file);
                Page {
                    file: source.info.clone(),
                    slugs: file.slugs.clone(),
                    url: self.url(&file.slugs, locale),
                    locale: locale.map(str::to_owned),
                    data: source.data.clone(),
                }
            })
            .collect()
    }
}

fn localized_variant<'s>(store: &'s FileStore, file: &StoredFile, locale: &str) -> Option<&'s StoredFile> {
    let path = join_path(&file.info.dirname, &format!("{}.{locale}", file.info.name));
    store.read(&path, file.kind)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::file::data_str;
    use crate::page_tree::Node;

    fn page(path: &str, title: &str) -> VirtualFile {
        VirtualFile::page(path, json!({"title": title}).as_object().unwrap().clone())
    }

    fn meta(path: &str, value: Value) -> VirtualFile {
        VirtualFile::meta(path, value.as_object().unwrap().clone())
    }

    fn nested_files() -> Vec<VirtualFile> {
        vec![
            page("test.mdx", "Hello"),
            page("nested/test.mdx", "Nested Page"),
            meta("meta.json", json!({"pages": ["nested", "test", "[Text](https://google.com)"]})),
        ]
    }

    fn i18n_files() -> Vec<VirtualFile> {
        vec![
            page("test.mdx", "Hello"),
            page("test.cn.mdx", "Hello Chinese"),
            page("nested/test.mdx", "Nested Page"),
            meta("meta.cn.json", json!({"title": "Docs Chinese"})),
            meta("nested/meta.cn.json", json!({"title": "Nested Chinese"})),
        ]
    }

    #[test]
    fn test_get_pages() {
        let output = Loader::new(LoaderOptions::new("")).load(nested_files()).unwrap();

        assert_eq!(output.get_pages(None).len(), 2);
        assert_eq!(output.page_trees().len(), 1);
        assert_eq!(output.page_tree("").unwrap().children.len(), 3);
        assert!(output.get_languages().is_empty());
    }

    #[test]
    fn test_get_page_by_slugs() {
        let output = Loader::new(LoaderOptions::new("/docs")).load(nested_files()).unwrap();

        let page = output.get_page(&["nested", "test"], None).unwrap();
        assert_eq!(page.url, "/docs/nested/test");
        assert_eq!(data_str(&page.data, "title"), Some("Nested Page"));
        assert!(output.get_page(&["missing"], None).is_none());
    }

    #[test]
    fn test_i18n_load() {
        let options = LoaderOptions::new("").with_languages(vec!["cn".to_owned(), "en".to_owned()]);
        let output = Loader::new(options).load(i18n_files()).unwrap();

        assert_eq!(output.get_pages(None).len(), 2);
        assert_eq!(output.page_tree("cn").unwrap().name, "Docs Chinese");
        assert_eq!(output.page_tree("en").unwrap().name, "");
        assert!(output.page_tree("").is_none());

        let cn = output.get_page(&["test"], Some("cn")).unwrap();
        assert_eq!(cn.url, "/cn/test");
        assert_eq!(cn.file.path, "test.cn.mdx");
        assert_eq!(data_str(&cn.data, "title"), Some("Hello Chinese"));

        let languages: Vec<&str> = output.get_languages().iter().map(|l| l.language).collect();
        assert_eq!(languages, vec!["cn", "en"]);
    }

    #[test]
    fn test_i18n_fallback_differs_only_in_locale_fields() {
        let options = LoaderOptions::new("").with_languages(vec!["cn".to_owned()]);
        let output = Loader::new(options).load(i18n_files()).unwrap();

        let default = output.get_page(&["nested", "test"], None).unwrap();
        let cn = output.get_page(&["nested", "test"], Some("cn")).unwrap();

        assert_eq!(cn.file, default.file);
        assert_eq!(cn.slugs, default.slugs);
        assert_eq!(cn.data, default.data);
        assert_eq!(default.url, "/nested/test");
        assert_eq!(cn.url, "/cn/nested/test");
        assert_eq!(cn.locale.as_deref(), Some("cn"));
    }

    #[test]
    fn test_root_dir_and_transformer() {
        let options = LoaderOptions::new("/docs")
            .with_root_dir("content")
            .with_transformer(Arc::new(|info: &FileInfo, _kind: FileKind, data: &mut FileData| {
                data.insert("source".to_owned(), Value::from(info.path.clone()));
            }));
        let output = Loader::new(options)
            .load(vec![page("content/a.mdx", "A"), page("other/b.mdx", "B")])
            .unwrap();

        let pages = output.get_pages(None);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "/docs/a");
        assert_eq!(data_str(&pages[0].data, "source"), Some("a.mdx"));
    }

    #[test]
    fn test_icon_resolver_reaches_tree() {
        let options = LoaderOptions::new("").with_icon_resolver(Arc::new(|name: &str| {
            Some(format!("icon:{name}"))
        }));
        let output = Loader::new(options)
            .load(vec![VirtualFile::page(
                "a.mdx",
                json!({"title": "A", "icon": "Star"}).as_object().unwrap().clone(),
            )])
            .unwrap();

        let Node::Page(node) = &output.page_tree("").unwrap().children[0] else {
            panic!("expected page");
        };
        assert_eq!(node.icon.as_deref(), Some("icon:Star"));
    }

    #[test]
    fn test_duplicate_slug_propagates() {
        let err = Loader::new(LoaderOptions::default())
            .load(vec![page("a.mdx", "A"), page("a/index.md", "A again")])
            .unwrap_err();
        assert!(matches!(err, LoaderError::Build(_)));
    }
}
