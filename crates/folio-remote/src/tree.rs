//! Git tree model and object ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Mode of regular file entries.
pub const BLOB_MODE: &str = "100644";
/// Mode of directory entries as reported by the trees API.
pub const TREE_MODE: &str = "040000";

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Blob,
    Tree,
    /// Submodule commit.
    Commit,
}

/// One entry of a [`GitTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    /// Path relative to the tree root.
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// API URL of the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A Git tree as returned by the trees API.
///
/// Recursive trees list every descendant with its full path; shallow trees
/// only list direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTree {
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub tree: Vec<TreeItem>,
    /// Set when the host cut the listing short.
    #[serde(default)]
    pub truncated: bool,
}

impl GitTree {
    /// Entry at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&TreeItem> {
        self.tree.iter().find(|item| item.path == path)
    }

    /// Blob entries.
    pub fn blobs(&self) -> impl Iterator<Item = &TreeItem> {
        self.tree.iter().filter(|item| item.kind == ObjectKind::Blob)
    }

    /// The subtree rooted at directory `path`, with paths made relative to it.
    ///
    /// Returns `None` when `path` is not a tree entry.
    #[must_use]
    pub fn subtree(&self, path: &str) -> Option<Self> {
        let dir = self.get(path).filter(|item| item.kind == ObjectKind::Tree)?;
        let prefix = format!("{path}/");
        let tree = self
            .tree
            .iter()
            .filter_map(|item| {
                let relative = item.path.strip_prefix(&prefix)?;
                Some(TreeItem {
                    path: relative.to_owned(),
                    ..item.clone()
                })
            })
            .collect();
        Some(Self {
            sha: dir.sha.clone(),
            url: dir.url.clone(),
            tree,
            truncated: self.truncated,
        })
    }

    /// Only the direct children of the root.
    #[must_use]
    pub fn shallow(&self) -> Self {
        Self {
            sha: self.sha.clone(),
            url: self.url.clone(),
            tree: self
                .tree
                .iter()
                .filter(|item| !item.path.contains('/'))
                .cloned()
                .collect(),
            truncated: false,
        }
    }
}

/// Git blob id of `content`.
#[must_use]
pub fn blob_sha(content: &[u8]) -> String {
    hex::encode(blob_digest(content))
}

fn blob_digest(content: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    finish(hasher)
}

fn finish(hasher: Sha1) -> [u8; 20] {
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Directory of files being hashed.
#[derive(Default)]
struct DirNode<'a> {
    files: BTreeMap<&'a str, &'a str>,
    dirs: BTreeMap<&'a str, DirNode<'a>>,
}

/// Build a recursive [`GitTree`] from file contents keyed by relative path.
///
/// Object ids match what Git computes for the same files committed with
/// mode `100644`, so the result can be diffed against trees from a host.
/// Entries are listed in Git order, each directory before its contents.
#[must_use]
pub fn files_to_git_tree(files: &BTreeMap<String, String>) -> GitTree {
    let mut root = DirNode::default();
    for (path, content) in files {
        let mut node = &mut root;
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.files.insert(segment, content);
            } else {
                node = node.dirs.entry(segment).or_default();
            }
        }
    }

    let mut items = Vec::new();
    let sha = hash_dir(&root, "", &mut items);
    GitTree {
        sha: hex::encode(sha),
        url: None,
        tree: items,
        truncated: false,
    }
}

/// Hash `node`, appending its entries to `items`.
fn hash_dir(node: &DirNode<'_>, prefix: &str, items: &mut Vec<TreeItem>) -> [u8; 20] {
    // Git sorts directory names as if they ended in '/'.
    let mut entries: Vec<(String, &str, &str)> = node
        .files
        .keys()
        .map(|name| ((*name).to_owned(), BLOB_MODE, *name))
        .chain(
            node.dirs
                .keys()
                .map(|name| (format!("{name}/"), TREE_MODE, *name)),
        )
        .collect();
    entries.sort();

    let mut body = Vec::new();
    for (_, mode, name) in entries {
        let path = if prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{prefix}/{name}")
        };

        let digest = if mode == BLOB_MODE {
            let content = node.files.get(name).copied().unwrap_or_default();
            let digest = blob_digest(content.as_bytes());
            items.push(TreeItem {
                path,
                mode: BLOB_MODE.to_owned(),
                kind: ObjectKind::Blob,
                sha: hex::encode(digest),
                size: u64::try_from(content.len()).ok(),
                url: None,
            });
            digest
        } else {
            let slot = items.len();
            items.push(TreeItem {
                path: path.clone(),
                mode: TREE_MODE.to_owned(),
                kind: ObjectKind::Tree,
                sha: String::new(),
                size: None,
                url: None,
            });
            let digest = node
                .dirs
                .get(name)
                .map(|dir| hash_dir(dir, &path, items))
                .unwrap_or_default();
            items[slot].sha = hex::encode(digest);
            digest
        };

        // Tree objects store directory modes without the leading zero.
        body.extend_from_slice(mode.trim_start_matches('0').as_bytes());
        body.push(b' ');
        body.extend_from_slice(name.as_bytes());
        body.push(0);
        body.extend_from_slice(&digest);
    }

    let mut hasher = Sha1::new();
    hasher.update(format!("tree {}\0", body.len()).as_bytes());
    hasher.update(&body);
    finish(hasher)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(path, content)| ((*path).to_owned(), (*content).to_owned()))
            .collect()
    }

    #[test]
    fn test_blob_sha_matches_git() {
        assert_eq!(blob_sha(b""), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
        assert_eq!(blob_sha(b"hello\n"), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn test_empty_tree_sha_matches_git() {
        let tree = files_to_git_tree(&BTreeMap::new());
        assert_eq!(tree.sha, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert!(tree.tree.is_empty());
    }

    #[test]
    fn test_files_to_git_tree_lists_dirs_before_contents() {
        let tree = files_to_git_tree(&files(&[
            ("index.mdx", "home"),
            ("guide/setup.md", "setup"),
            ("guide/meta.json", "{}"),
            ("guide-old.md", "old"),
        ]));

        let paths: Vec<_> = tree.tree.iter().map(|i| (i.path.as_str(), i.kind)).collect();
        assert_eq!(
            paths,
            vec![
                ("guide-old.md", ObjectKind::Blob),
                ("guide", ObjectKind::Tree),
                ("guide/meta.json", ObjectKind::Blob),
                ("guide/setup.md", ObjectKind::Blob),
                ("index.mdx", ObjectKind::Blob),
            ]
        );
        assert_eq!(tree.get("guide/setup.md").unwrap().sha, blob_sha(b"setup"));
        assert_eq!(tree.get("index.mdx").unwrap().size, Some(4));
    }

    #[test]
    fn test_tree_sha_depends_on_content_only() {
        let a = files_to_git_tree(&files(&[("a/b.md", "x"), ("c.md", "y")]));
        let b = files_to_git_tree(&files(&[("c.md", "y"), ("a/b.md", "x")]));
        let c = files_to_git_tree(&files(&[("a/b.md", "changed"), ("c.md", "y")]));

        assert_eq!(a.sha, b.sha);
        assert_ne!(a.sha, c.sha);
        assert_ne!(a.get("a").unwrap().sha, c.get("a").unwrap().sha);
    }

    #[test]
    fn test_subtree_and_shallow() {
        let tree = files_to_git_tree(&files(&[
            ("docs/a.md", "a"),
            ("docs/nested/b.md", "b"),
            ("README.md", "r"),
        ]));

        let docs = tree.subtree("docs").unwrap();
        assert_eq!(docs.sha, tree.get("docs").unwrap().sha);
        let paths: Vec<_> = docs.tree.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "nested", "nested/b.md"]);

        let shallow = tree.shallow();
        let paths: Vec<_> = shallow.tree.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "docs"]);

        assert!(tree.subtree("README.md").is_none());
    }

    #[test]
    fn test_tree_deserializes_api_shape() {
        let json = r#"{
            "sha": "abc",
            "url": "https://api.github.com/repos/o/r/git/trees/abc",
            "tree": [
                {"path": "index.mdx", "mode": "100644", "type": "blob", "sha": "111", "size": 12, "url": "u"},
                {"path": "guide", "mode": "040000", "type": "tree", "sha": "222", "url": "v"}
            ],
            "truncated": false
        }"#;

        let tree: GitTree = serde_json::from_str(json).unwrap();

        assert_eq!(tree.tree[1].kind, ObjectKind::Tree);
        assert_eq!(tree.blobs().count(), 1);
    }
}
