//! Page-tree building.
//!
//! Turns a [`FileStore`] into navigation trees of folders, pages and
//! separators. Each directory is ordered by its meta file when one exists:
//!
//! | `pages` entry  | Result                                              |
//! |----------------|-----------------------------------------------------|
//! | `intro`        | page or folder `intro` in this directory            |
//! | `...`          | every remaining page and folder, default order      |
//! | `...guides`    | the children of folder `guides`, inlined            |
//! | `---Label---`  | separator node                                      |
//! | `[Text](url)`  | external link page, no backing file                 |
//!
//! Without a meta file pages come first in name order, then folders in name
//! order. A non-root folder's `index` page becomes the folder's own URL.
//!
//! In i18n builds every locale gets its own tree. Structure comes from the
//! default-locale files; localized files (`name.{locale}.ext`) only swap in
//! titles, icons and ordering where they exist.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::file::{FileKind, MetaData, data_str};
use crate::path::{UrlFn, basename, join_path, path_to_name};
use crate::storage::{FileStore, StoredFile};

/// Resolves an icon name to its rendered form.
pub type IconResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^---(.*?)---$").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(.+)\]\((.+)\)$").unwrap());
static EXTRACT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.\.\.(.+)$").unwrap());

const REST: &str = "...";

/// Navigation tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Link to a page.
    Page(PageNode),
    /// Group of nodes.
    Folder(FolderNode),
    /// Visual divider with a label.
    Separator(SeparatorNode),
}

impl Node {
    /// Display name of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Page(page) => &page.name,
            Self::Folder(folder) => &folder.name,
            Self::Separator(separator) => &separator.name,
        }
    }
}

/// Page node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    /// Page title.
    pub name: String,
    /// Public URL.
    pub url: String,
    /// Resolved icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the URL points outside the site.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
}

/// Folder node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    /// Folder title.
    pub name: String,
    /// URL of the folder's index page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Resolved icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the folder starts expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_open: Option<bool>,
    /// Whether the folder is a navigation root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<bool>,
    /// Child nodes.
    pub children: Vec<Node>,
}

/// Separator node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparatorNode {
    /// Label.
    pub name: String,
    /// Resolved icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Root of a navigation tree. Has no URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Root {
    /// Root title (meta title, else index page title, else empty).
    pub name: String,
    /// Top-level nodes.
    pub children: Vec<Node>,
}

/// A built tree plus the non-fatal problems met while building it.
#[derive(Debug, Clone, Default)]
pub struct PageTree {
    /// The tree.
    pub root: Root,
    /// Unresolved meta entries and skipped files.
    pub warnings: Vec<String>,
}

/// Builds page trees from a [`FileStore`].
pub struct PageTreeBuilder<'a> {
    store: &'a FileStore,
    get_url: UrlFn,
    resolve_icon: Option<IconResolver>,
}

impl<'a> PageTreeBuilder<'a> {
    /// Create a builder over `store`.
    #[must_use]
    pub fn new(store: &'a FileStore, get_url: UrlFn) -> Self {
        Self {
            store,
            get_url,
            resolve_icon: None,
        }
    }

    /// Use `resolver` for meta and front matter `icon` fields.
    #[must_use]
    pub fn with_icon_resolver(mut self, resolver: Option<IconResolver>) -> Self {
        self.resolve_icon = resolver;
        self
    }

    /// Build the single-locale tree.
    ///
    /// Localized files are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateSlug`] when two pages share slugs.
    pub fn build(&self) -> Result<PageTree, BuildError> {
        self.check_slugs()?;
        let mut ctx = BuildContext::new(self, None);
        for file in self.store.list().iter().filter(|f| f.is_localized()) {
            ctx.warn(format!(
                "Skipped localized file {} (no languages configured)",
                file.info.path
            ));
        }
        Ok(ctx.build_root())
    }

    /// Build one tree per locale in `languages`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateSlug`] when two pages share slugs.
    pub fn build_i18n(&self, languages: &[String]) -> Result<BTreeMap<String, PageTree>, BuildError> {
        self.check_slugs()?;
        let mut trees = BTreeMap::new();
        for language in languages {
            let mut ctx = BuildContext::new(self, Some(language.as_str()));
            for file in self.orphan_localized_files(language) {
                ctx.warn(format!(
                    "Skipped localized file {} (no default-locale counterpart)",
                    file.info.path
                ));
            }
            trees.insert(language.clone(), ctx.build_root());
        }
        Ok(trees)
    }

    fn check_slugs(&self) -> Result<(), BuildError> {
        let mut seen: HashMap<&[String], &StoredFile> = HashMap::new();
        for file in default_pages(self.store.list().iter()) {
            if let Some(first) = seen.insert(&file.slugs, file) {
                return Err(BuildError::DuplicateSlug {
                    slug: file.slugs.join("/"),
                    first: first.info.path.clone(),
                    second: file.info.path.clone(),
                });
            }
        }
        Ok(())
    }

    fn orphan_localized_files(&self, language: &str) -> impl Iterator<Item = &StoredFile> {
        self.store.list().iter().filter(move |file| {
            file.kind == FileKind::Page
                && file.info.locale.as_deref() == Some(language)
                && self
                    .store
                    .read(&default_flattened_path(file), file.kind)
                    .is_none()
        })
    }
}

/// Default-locale page files.
fn default_pages<'s>(files: impl Iterator<Item = &'s StoredFile>) -> impl Iterator<Item = &'s StoredFile> {
    files.filter(|f| f.kind == FileKind::Page && !f.is_localized())
}

/// Flattened path of the default-locale counterpart of a localized file.
fn default_flattened_path(file: &StoredFile) -> String {
    join_path(&file.info.dirname, &file.info.name)
}

/// Result of resolving one `pages` entry.
enum Resolved {
    /// The `...` marker.
    Rest,
    /// Zero or more nodes.
    Nodes(Vec<Node>),
}

/// State for building one locale's tree.
struct BuildContext<'b, 'a> {
    builder: &'b PageTreeBuilder<'a>,
    locale: Option<&'b str>,
    warnings: Vec<String>,
    /// Folders currently being built, outermost first.
    in_progress: HashSet<String>,
}

impl<'b, 'a> BuildContext<'b, 'a> {
    fn new(builder: &'b PageTreeBuilder<'a>, locale: Option<&'b str>) -> Self {
        Self {
            builder,
            locale,
            warnings: Vec::new(),
            in_progress: HashSet::new(),
        }
    }

    fn store(&self) -> &'a FileStore {
        self.builder.store
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(locale = self.locale.unwrap_or(""), "{message}");
        self.warnings.push(message);
    }

    fn build_root(mut self) -> PageTree {
        let folder = self.build_folder("", true);
        PageTree {
            root: Root {
                name: folder.name,
                children: folder.children,
            },
            warnings: self.warnings,
        }
    }

    /// The localized variant of a default-locale file, falling back to it.
    fn localized<'s>(&self, file: &'s StoredFile) -> &'s StoredFile
    where
        'a: 's,
    {
        self.locale
            .and_then(|locale| {
                self.store()
                    .read(&format!("{}.{locale}", file.info.flattened_path), file.kind)
            })
            .unwrap_or(file)
    }

    /// Merged meta of `dir`: default meta overlaid with the localized one.
    fn folder_meta(&mut self, dir: &str) -> Option<MetaData> {
        let meta_path = join_path(dir, "meta");
        let default = self.read_meta(&meta_path);
        let localized = self
            .locale
            .and_then(|locale| self.read_meta(&format!("{meta_path}.{locale}")));
        match (default, localized) {
            (Some(default), Some(localized)) => Some(default.merged_with(localized)),
            (default, localized) => default.or(localized),
        }
    }

    fn read_meta(&mut self, path: &str) -> Option<MetaData> {
        let file = self.store().read(path, FileKind::Meta)?;
        match MetaData::from_data(&file.data) {
            Ok(meta) => Some(meta),
            Err(e) => {
                self.warn(format!("Ignored malformed meta file {}: {e}", file.info.path));
                None
            }
        }
    }

    fn resolve_icon(&self, icon: Option<&str>) -> Option<String> {
        let name = icon?;
        let resolver = self.builder.resolve_icon.as_ref()?;
        let resolved = resolver(name);
        if resolved.is_none() {
            tracing::debug!(icon = name, "Icon not resolved");
        }
        resolved
    }

    fn page_node(&self, file: &StoredFile) -> PageNode {
        let localized = self.localized(file);
        let name = data_str(&localized.data, "title")
            .or_else(|| data_str(&file.data, "title"))
            .map_or_else(|| fallback_page_name(file), str::to_owned);
        let icon = data_str(&localized.data, "icon").or_else(|| data_str(&file.data, "icon"));
        PageNode {
            name,
            url: (self.builder.get_url)(&file.slugs, self.locale),
            icon: self.resolve_icon(icon),
            external: false,
        }
    }

    fn build_folder(&mut self, dir: &str, is_global_root: bool) -> FolderNode {
        self.in_progress.insert(dir.to_owned());
        let folder = self.build_folder_inner(dir, is_global_root);
        self.in_progress.remove(dir);
        folder
    }

    fn build_folder_inner(&mut self, dir: &str, is_global_root: bool) -> FolderNode {
        let meta = self.folder_meta(dir);
        let index = self.store().read(&join_path(dir, "index"), FileKind::Page);
        let is_root = meta.as_ref().and_then(|m| m.root).unwrap_or(is_global_root);

        let mut added = HashSet::new();
        let children = match meta.as_ref().and_then(|m| m.pages.as_ref()) {
            Some(pages) => {
                let resolved: Vec<Resolved> = pages
                    .iter()
                    .map(|item| self.resolve_item(dir, item, &mut added))
                    .collect();
                let rest = if resolved.iter().any(|item| matches!(item, Resolved::Rest)) {
                    self.build_rest(dir, &added, !is_root)
                } else {
                    Vec::new()
                };
                resolved
                    .into_iter()
                    .flat_map(|item| match item {
                        Resolved::Rest => rest.clone(),
                        Resolved::Nodes(nodes) => nodes,
                    })
                    .collect()
            }
            None => self.build_rest(dir, &added, !is_root),
        };

        let index_node = index
            .filter(|file| !is_root && !added.contains(&file.info.flattened_path))
            .map(|file| self.page_node(file));

        let name = meta
            .as_ref()
            .and_then(|m| m.title.clone())
            .or_else(|| {
                index.and_then(|file| data_str(&self.localized(file).data, "title").map(str::to_owned))
            })
            .unwrap_or_else(|| path_to_name(basename(dir)));

        FolderNode {
            name,
            url: index_node.map(|node| node.url),
            icon: self.resolve_icon(meta.as_ref().and_then(|m| m.icon.as_deref())),
            default_open: meta.as_ref().and_then(|m| m.default_open),
            root: meta.as_ref().and_then(|m| m.root),
            children,
        }
    }

    /// Pages in name order (index first unless skipped), then folders.
    fn build_rest(&mut self, dir: &str, added: &HashSet<String>, skip_index: bool) -> Vec<Node> {
        let store = self.store();
        let mut pages: Vec<&StoredFile> = default_pages(store.files_in(dir))
            .filter(|file| !added.contains(&file.info.flattened_path))
            .collect();
        pages.sort_by(|a, b| a.info.name.cmp(&b.info.name));

        let mut nodes = Vec::new();
        for file in pages {
            let node = Node::Page(self.page_node(file));
            if file.info.name == "index" {
                if !skip_index {
                    nodes.insert(0, node);
                }
            } else {
                nodes.push(node);
            }
        }

        for subdir in store.subdirs(dir) {
            if !added.contains(subdir) {
                nodes.push(Node::Folder(self.build_folder(subdir, false)));
            }
        }
        nodes
    }

    fn resolve_item(&mut self, dir: &str, item: &str, added: &mut HashSet<String>) -> Resolved {
        if item == REST {
            return Resolved::Rest;
        }
        if let Some(caps) = SEPARATOR_RE.captures(item) {
            return Resolved::Nodes(vec![Node::Separator(SeparatorNode {
                name: caps[1].to_owned(),
                icon: None,
            })]);
        }
        if let Some(caps) = LINK_RE.captures(item) {
            return Resolved::Nodes(vec![Node::Page(PageNode {
                name: caps[1].to_owned(),
                url: caps[2].to_owned(),
                icon: None,
                external: true,
            })]);
        }

        let (target, extract) = match EXTRACT_RE.captures(item) {
            Some(caps) => (caps.get(1).map_or("", |m| m.as_str()), true),
            None => (item, false),
        };
        // Entries name direct children of `dir` only.
        if target.is_empty() || target.contains('/') || target == "." || target == ".." {
            return self.unresolved(dir, item);
        }
        let path = join_path(dir, target);
        let store = self.store();

        if store.is_dir(&path) && !self.in_progress.contains(&path) {
            added.insert(path.clone());
            let folder = self.build_folder(&path, false);
            return Resolved::Nodes(if extract {
                folder.children
            } else {
                vec![Node::Folder(folder)]
            });
        }
        if !extract && let Some(file) = store.read(&path, FileKind::Page) {
            added.insert(path);
            return Resolved::Nodes(vec![Node::Page(self.page_node(file))]);
        }

        self.unresolved(dir, item)
    }

    fn unresolved(&mut self, dir: &str, item: &str) -> Resolved {
        self.warn(format!(
            "Unresolved entry \"{item}\" in {}",
            join_path(dir, "meta.json")
        ));
        Resolved::Nodes(Vec::new())
    }
}

/// Name for a page without a `title`.
fn fallback_page_name(file: &StoredFile) -> String {
    if file.info.name == "index" && !file.info.dirname.is_empty() {
        path_to_name(basename(&file.info.dirname))
    } else {
        path_to_name(&file.info.name)
    }
}
