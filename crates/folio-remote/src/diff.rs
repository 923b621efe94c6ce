//! Change sets between a cached snapshot and a fresh tree.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::cache_file::{FileEntry, GithubCacheFile, parent_path};
use crate::error::DiffError;
use crate::tree::{GitTree, ObjectKind, TreeItem};

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    Add,
    Remove,
    Modify,
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Modify => write!(f, "modify"),
        }
    }
}

/// One entry of a change set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeDiff {
    pub action: DiffAction,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// New sha for additions and modifications, cached sha for removals.
    pub sha: String,
    pub path: String,
}

impl TreeDiff {
    /// Whether content must be fetched to apply this entry.
    #[must_use]
    pub fn needs_content(&self) -> bool {
        self.kind == ObjectKind::Blob && self.action != DiffAction::Remove
    }
}

/// Compare a cached snapshot against a recursive tree.
///
/// Identical root shas short-circuit to an empty change set. Otherwise the
/// cache is walked depth first: missing entries are removals, entries with a
/// new sha are modifications (directories are descended into), and a
/// directory with an unchanged sha covers its whole subtree. Tree entries not
/// covered by the walk are additions, one per path.
#[must_use]
pub fn compare_to_git_tree(cache: &GithubCacheFile, tree: &GitTree) -> Vec<TreeDiff> {
    if cache.sha == tree.sha {
        return Vec::new();
    }

    let index: HashMap<&str, &TreeItem> = tree
        .tree
        .iter()
        .map(|item| (item.path.as_str(), item))
        .collect();
    let mut walk = Walk {
        index: &index,
        covered: HashSet::new(),
        stable_dirs: HashSet::new(),
        diffs: Vec::new(),
    };
    walk.dir(cache);

    let Walk {
        covered,
        stable_dirs,
        mut diffs,
        ..
    } = walk;
    for item in &tree.tree {
        if item.kind == ObjectKind::Commit
            || covered.contains(item.path.as_str())
            || within_any(&item.path, &stable_dirs)
        {
            continue;
        }
        diffs.push(TreeDiff {
            action: DiffAction::Add,
            kind: item.kind,
            sha: item.sha.clone(),
            path: item.path.clone(),
        });
    }

    diffs
}

struct Walk<'a, 'b> {
    index: &'b HashMap<&'a str, &'a TreeItem>,
    covered: HashSet<&'b str>,
    stable_dirs: HashSet<&'b str>,
    diffs: Vec<TreeDiff>,
}

impl<'b> Walk<'_, 'b> {
    fn dir(&mut self, dir: &'b GithubCacheFile) {
        let index = self.index;
        for file in &dir.files {
            match index.get(file.path.as_str()) {
                Some(item) if item.kind == ObjectKind::Blob => {
                    self.covered.insert(&file.path);
                    if item.sha != file.sha {
                        self.push(DiffAction::Modify, ObjectKind::Blob, &item.sha, &file.path);
                    }
                }
                _ => self.push(DiffAction::Remove, ObjectKind::Blob, &file.sha, &file.path),
            }
        }

        for sub in &dir.sub_directories {
            match index.get(sub.path.as_str()) {
                Some(item) if item.kind == ObjectKind::Tree => {
                    self.covered.insert(&sub.path);
                    if item.sha == sub.sha {
                        self.stable_dirs.insert(&sub.path);
                    } else {
                        self.push(DiffAction::Modify, ObjectKind::Tree, &item.sha, &sub.path);
                        self.dir(sub);
                    }
                }
                _ => self.push(DiffAction::Remove, ObjectKind::Tree, &sub.sha, &sub.path),
            }
        }
    }

    fn push(&mut self, action: DiffAction, kind: ObjectKind, sha: &str, path: &str) {
        self.diffs.push(TreeDiff {
            action,
            kind,
            sha: sha.to_owned(),
            path: path.to_owned(),
        });
    }
}

/// Whether `path` lies beneath one of `dirs`.
fn within_any(path: &str, dirs: &HashSet<&str>) -> bool {
    let mut current = path;
    while let Some((parent, _)) = current.rsplit_once('/') {
        if dirs.contains(parent) {
            return true;
        }
        current = parent;
    }
    false
}

/// Apply a change set, returning the updated cache.
///
/// `content` supplies the text of every added or modified blob; a missing
/// answer fails with the blob path. Removals run first, then modifications, then
/// additions from the shallowest path down, so new directories exist before
/// their files. An empty change set returns the cache untouched.
pub fn apply_to_cache<F>(
    mut cache: GithubCacheFile,
    diffs: &[TreeDiff],
    mut content: F,
) -> Result<GithubCacheFile, DiffError>
where
    F: FnMut(&TreeDiff) -> Option<String>,
{
    if diffs.is_empty() {
        return Ok(cache);
    }

    let mut ordered: Vec<&TreeDiff> = diffs.iter().collect();
    ordered.sort_by_key(|diff| {
        let rank = match diff.action {
            DiffAction::Remove => 0,
            DiffAction::Modify => 1,
            DiffAction::Add => 2,
        };
        (rank, diff.path.matches('/').count())
    });

    for diff in ordered {
        let missing_content = || DiffError::MissingContent {
            path: diff.path.clone(),
        };
        match (diff.action, diff.kind) {
            (DiffAction::Remove, ObjectKind::Blob) => {
                if let Some(parent) = cache.find_dir_mut(parent_path(&diff.path)) {
                    parent.files.retain(|f| f.path != diff.path);
                }
            }
            (DiffAction::Remove, ObjectKind::Tree) => {
                if let Some(parent) = cache.find_dir_mut(parent_path(&diff.path)) {
                    parent.sub_directories.retain(|d| d.path != diff.path);
                }
            }
            (DiffAction::Modify, ObjectKind::Tree) => {
                if let Some(dir) = cache.find_dir_mut(&diff.path) {
                    dir.sha.clone_from(&diff.sha);
                }
            }
            (DiffAction::Add, ObjectKind::Tree) => {
                let parent = parent_dir(&mut cache, diff)?;
                if !parent.sub_directories.iter().any(|d| d.path == diff.path) {
                    parent
                        .sub_directories
                        .push(GithubCacheFile::empty(diff.path.clone(), diff.sha.clone()));
                }
            }
            (DiffAction::Add | DiffAction::Modify, ObjectKind::Blob) => {
                let text = content(diff).ok_or_else(missing_content)?;
                let parent = parent_dir(&mut cache, diff)?;
                match parent.files.iter_mut().find(|f| f.path == diff.path) {
                    Some(file) => {
                        file.sha.clone_from(&diff.sha);
                        file.content = text;
                    }
                    None => parent.files.push(FileEntry {
                        path: diff.path.clone(),
                        sha: diff.sha.clone(),
                        content: text,
                        extra: Map::new(),
                    }),
                }
            }
            (_, ObjectKind::Commit) => {}
        }
    }

    cache.sort();
    Ok(cache)
}

fn parent_dir<'c>(
    cache: &'c mut GithubCacheFile,
    diff: &TreeDiff,
) -> Result<&'c mut GithubCacheFile, DiffError> {
    cache
        .find_dir_mut(parent_path(&diff.path))
        .ok_or_else(|| DiffError::MissingParent {
            path: diff.path.clone(),
        })
}
