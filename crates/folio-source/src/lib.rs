//! Content loading and page-tree building for folio.
//!
//! Turns a flat collection of [`VirtualFile`]s (pages and meta files,
//! optionally localized) into navigation trees and page lookups:
//!
//! ```text
//! VirtualFile[] --load_files--> FileStore --PageTreeBuilder--> Root (per locale)
//!                                   |
//!                                   +--------Loader--------> LoaderOutput
//! ```
//!
//! # Example
//!
//! ```
//! use folio_source::{Loader, LoaderOptions, VirtualFile};
//! use serde_json::json;
//!
//! let files = vec![
//!     VirtualFile::page("test.mdx", json!({"title": "Hello"}).as_object().unwrap().clone()),
//!     VirtualFile::meta("meta.json", json!({"pages": ["test"]}).as_object().unwrap().clone()),
//! ];
//! let output = Loader::new(LoaderOptions::new("/docs")).load(files).unwrap();
//!
//! let page = output.get_page(&["test"], None).unwrap();
//! assert_eq!(page.url, "/docs/test");
//! ```

mod error;
mod file;
mod frontmatter;
mod loader;
mod local;
mod page_tree;
mod path;
mod storage;

pub use error::{BuildError, LoadError, LoaderError};
pub use file::{FileData, FileKind, MetaData, VirtualFile, data_str};
pub use loader::{DEFAULT_LOCALE, LanguagePages, Loader, LoaderOptions, LoaderOutput, Page};
pub use local::{IncludeGlobs, LocalSource};
pub use page_tree::{
    FolderNode, IconResolver, Node, PageNode, PageTree, PageTreeBuilder, Root, SeparatorNode,
};
pub use path::{
    FileInfo, SlugsFn, UrlFn, basename, create_get_url, default_slugs_fn, get_slugs, join_path,
    normalize_path, parse_file_path, path_to_name,
};
pub use storage::{FileStore, LoadOptions, StoredFile, Transformer, load_files};
