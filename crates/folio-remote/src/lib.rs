//! Remote content for folio: Git trees, an incremental cache and webhooks.
//!
//! A content directory of a GitHub repository is mirrored into a
//! [`GithubCacheFile`]. Each push is reconciled by diffing the cache against
//! the new tree and fetching only the blobs that changed:
//!
//! ```text
//! push event --find_tree_recursive--> GitTree --compare_to_git_tree--> TreeDiff[]
//!                                                                         |
//!            cache file <--apply_to_cache-- fetch_contents (parallel) <---+
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use folio_remote::{apply_to_cache, cache_from_tree, compare_to_git_tree, files_to_git_tree};
//!
//! let mut files = BTreeMap::from([("index.md".to_owned(), "# Home".to_owned())]);
//! let before = files_to_git_tree(&files);
//! let cache = cache_from_tree(&before, |item| files.get(&item.path).cloned()).unwrap();
//!
//! files.insert("guide.md".to_owned(), "# Guide".to_owned());
//! let after = files_to_git_tree(&files);
//! let diffs = compare_to_git_tree(&cache, &after);
//! assert_eq!(diffs.len(), 1);
//!
//! let mut cache = apply_to_cache(cache, &diffs, |diff| files.get(&diff.path).cloned()).unwrap();
//! cache.sha = after.sha;
//! assert_eq!(cache.all_files().len(), 2);
//! ```

mod cache_file;
mod diff;
mod error;
mod github;
mod revalidate;
mod site;
mod tree;
mod vfs;
mod webhook;

pub use cache_file::{FileEntry, GithubCacheFile, cache_from_tree, parent_path};
pub use diff::{DiffAction, TreeDiff, apply_to_cache, compare_to_git_tree};
pub use error::{DiffError, RemoteError};
pub use github::{
    GITHUB_API_URL, GitHost, GithubClient, SnapshotHost, fetch_contents, find_tree_recursive,
};
pub use revalidate::{RevalidateScope, Revalidation, revalidation_targets};
pub use site::{ReconcileReport, RemoteSite, RemoteSiteOptions};
pub use tree::{BLOB_MODE, GitTree, ObjectKind, TREE_MODE, TreeItem, blob_sha, files_to_git_tree};
pub use vfs::VirtualFileSystem;
pub use webhook::{EVENT_HEADER, PushEvent, SIGNATURE_HEADER, sign, verify_signature};
