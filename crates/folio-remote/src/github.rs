//! Git hosts: the GitHub REST API and in-memory snapshots.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use serde::Deserialize;
use ureq::Agent;

use crate::diff::TreeDiff;
use crate::error::RemoteError;
use crate::tree::{GitTree, ObjectKind, blob_sha, files_to_git_tree};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Public GitHub API.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Read access to Git trees and blobs.
pub trait GitHost: Send + Sync {
    /// Fetch the tree `sha` (a tree sha, commit sha or branch name).
    fn fetch_tree(&self, sha: &str, recursive: bool) -> Result<GitTree, RemoteError>;

    /// Fetch and decode the blob `sha`.
    fn fetch_blob(&self, sha: &str) -> Result<String, RemoteError>;
}

impl<T: GitHost + ?Sized> GitHost for Box<T> {
    fn fetch_tree(&self, sha: &str, recursive: bool) -> Result<GitTree, RemoteError> {
        (**self).fetch_tree(sha, recursive)
    }

    fn fetch_blob(&self, sha: &str) -> Result<String, RemoteError> {
        (**self).fetch_blob(sha)
    }
}

/// Resolve `directory` inside the tree `tree_sha` and fetch it recursively.
///
/// Each path segment costs one shallow tree request. Returns `None` when a
/// segment is missing or is not a directory.
pub fn find_tree_recursive<H: GitHost + ?Sized>(
    host: &H,
    directory: &str,
    tree_sha: &str,
) -> Result<Option<GitTree>, RemoteError> {
    let mut sha = tree_sha.to_owned();
    for segment in directory
        .trim_start_matches("./")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
    {
        let tree = host.fetch_tree(&sha, false)?;
        let Some(item) = tree
            .tree
            .iter()
            .find(|item| item.path == segment && item.kind == ObjectKind::Tree)
        else {
            tracing::debug!(directory, segment, tree = %tree.sha, "Directory segment not found");
            return Ok(None);
        };
        sha.clone_from(&item.sha);
    }
    host.fetch_tree(&sha, true).map(Some)
}

/// Fetch the content of every blob a change set adds or modifies.
///
/// Requests run in parallel on the rayon pool; the first failure is
/// returned once all of them have finished.
pub fn fetch_contents<H: GitHost + ?Sized>(
    host: &H,
    diffs: &[TreeDiff],
) -> Result<HashMap<String, String>, RemoteError> {
    let wanted: Vec<&TreeDiff> = diffs.iter().filter(|d| d.needs_content()).collect();
    if wanted.is_empty() {
        return Ok(HashMap::new());
    }

    let results: Vec<Result<(String, String), RemoteError>> = wanted
        .par_iter()
        .map(|diff| {
            let content = host.fetch_blob(&diff.sha).map_err(|e| match e {
                RemoteError::NotFound { .. } => RemoteError::Decode {
                    path: diff.path.clone(),
                    message: "blob not found".to_owned(),
                },
                other => other,
            })?;
            Ok((diff.path.clone(), content))
        })
        .collect();

    tracing::info!(blobs = results.len(), "Fetched changed blobs");
    results.into_iter().collect()
}

/// Blob response of the GitHub API.
#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

/// Blocking GitHub REST client.
pub struct GithubClient {
    agent: Agent,
    api_url: String,
    owner: String,
    repo: String,
    access_token: Option<String>,
}

impl GithubClient {
    /// Client for `owner/repo` on the public API.
    #[must_use]
    pub fn new(owner: &str, repo: &str, access_token: Option<String>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url: GITHUB_API_URL.to_owned(),
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            access_token,
        }
    }

    /// Use a different API root (GitHub Enterprise).
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        api_url.trim_end_matches('/').clone_into(&mut self.api_url);
        self
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.owner, self.repo)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, sha: &str) -> Result<T, RemoteError> {
        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call().map_err(|e| RemoteError::Http {
            url: url.to_owned(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status == 404 {
            return Err(RemoteError::NotFound { sha: sha.to_owned() });
        }
        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(RemoteError::Status {
                url: url.to_owned(),
                status,
                body: error_body,
            });
        }

        body.read_json().map_err(|e| RemoteError::Http {
            url: url.to_owned(),
            message: e.to_string(),
        })
    }
}

impl GitHost for GithubClient {
    fn fetch_tree(&self, sha: &str, recursive: bool) -> Result<GitTree, RemoteError> {
        let mut url = format!("{}/git/trees/{sha}", self.repo_url());
        if recursive {
            url.push_str("?recursive=1");
        }
        tracing::debug!(%url, "Fetching tree");
        let tree: GitTree = self.get_json(&url, sha)?;
        if tree.truncated {
            tracing::warn!(sha, "Tree listing was truncated by the host");
        }
        Ok(tree)
    }

    fn fetch_blob(&self, sha: &str) -> Result<String, RemoteError> {
        let url = format!("{}/git/blobs/{sha}", self.repo_url());
        let blob: BlobResponse = self.get_json(&url, sha)?;
        decode_blob(sha, &blob)
    }
}

fn decode_blob(sha: &str, blob: &BlobResponse) -> Result<String, RemoteError> {
    let decode_error = |message: String| RemoteError::Decode {
        path: sha.to_owned(),
        message,
    };
    match blob.encoding.as_str() {
        "base64" => {
            let packed: String = blob.content.split_whitespace().collect();
            let bytes = STANDARD
                .decode(packed)
                .map_err(|e| decode_error(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))
        }
        "utf-8" | "utf8" => Ok(blob.content.clone()),
        other => Err(decode_error(format!("unsupported encoding '{other}'"))),
    }
}

/// A host serving fixed file snapshots.
///
/// Every snapshot is indexed by its root tree sha, each of its directories
/// by their own sha, and every blob by content sha. A snapshot is also
/// reachable under the reference name it was added with, so branch names
/// resolve to the latest snapshot added for them.
#[derive(Debug, Default, Clone)]
pub struct SnapshotHost {
    trees: HashMap<String, GitTree>,
    blobs: HashMap<String, String>,
}

impl SnapshotHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snapshot of `files` (relative path to content) as `reference`.
    ///
    /// Returns the root tree sha.
    pub fn add_snapshot(&mut self, reference: &str, files: &BTreeMap<String, String>) -> String {
        let tree = files_to_git_tree(files);
        for content in files.values() {
            self.blobs.insert(blob_sha(content.as_bytes()), content.clone());
        }
        for item in tree.tree.iter().filter(|i| i.kind == ObjectKind::Tree) {
            if let Some(subtree) = tree.subtree(&item.path) {
                self.trees.insert(subtree.sha.clone(), subtree);
            }
        }
        let sha = tree.sha.clone();
        self.trees.insert(reference.to_owned(), tree.clone());
        self.trees.insert(sha.clone(), tree);
        sha
    }
}

impl GitHost for SnapshotHost {
    fn fetch_tree(&self, sha: &str, recursive: bool) -> Result<GitTree, RemoteError> {
        let tree = self
            .trees
            .get(sha)
            .ok_or_else(|| RemoteError::NotFound { sha: sha.to_owned() })?;
        Ok(if recursive { tree.clone() } else { tree.shallow() })
    }

    fn fetch_blob(&self, sha: &str) -> Result<String, RemoteError> {
        self.blobs
            .get(sha)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound { sha: sha.to_owned() })
    }
}
