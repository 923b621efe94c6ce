//! Content site backed by a Git host with an incremental local cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use folio_cache::{MemoryStore, NullStore, Store, get_or_try_insert};
use folio_source::{IncludeGlobs, Loader, LoaderError, LoaderOptions, LoaderOutput};
use serde::Serialize;

use crate::cache_file::{GithubCacheFile, cache_from_tree};
use crate::diff::{TreeDiff, apply_to_cache, compare_to_git_tree};
use crate::error::RemoteError;
use crate::github::{GitHost, fetch_contents, find_tree_recursive};
use crate::revalidate::{Revalidation, revalidation_targets};
use crate::tree::GitTree;
use crate::vfs::VirtualFileSystem;
use crate::webhook::PushEvent;

/// Options for [`RemoteSite`].
#[derive(Debug, Clone)]
pub struct RemoteSiteOptions {
    /// Content directory inside the repository.
    pub directory: String,
    /// Tracked branch.
    pub branch: String,
    /// Persisted cache location. `None` keeps the cache in memory only.
    pub save_file: Option<PathBuf>,
    /// Include patterns for content paths.
    pub include: Vec<String>,
    /// Keep loader outputs between requests. When off every
    /// [`RemoteSite::output`] call loads the content again.
    pub cache_outputs: bool,
}

/// Outcome of one handled push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Content tree sha after the push.
    pub sha: String,
    /// Applied changes.
    pub changes: Vec<TreeDiff>,
    /// Invalidation signals for the changes.
    pub revalidate: Vec<Revalidation>,
}

struct SiteState {
    cache: GithubCacheFile,
    fs: Arc<VirtualFileSystem>,
}

/// A content directory of a remote repository.
///
/// Holds the cache file, the virtual file system built from it, and loader
/// outputs keyed by tree sha. Reconciliations are serialized; readers keep
/// working on the previous snapshot while one runs.
pub struct RemoteSite<H> {
    host: H,
    options: RemoteSiteOptions,
    loader: Loader,
    include: IncludeGlobs,
    state: RwLock<SiteState>,
    outputs: Box<dyn Store<LoaderOutput>>,
    reconcile_lock: Mutex<()>,
}

impl<H: GitHost> RemoteSite<H> {
    /// Open the site from its save file, or fetch the branch when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the save file is unreadable, the content
    /// directory does not exist on the branch, or a request fails.
    pub fn open(
        host: H,
        options: RemoteSiteOptions,
        loader: LoaderOptions,
    ) -> Result<Self, RemoteError> {
        let include = IncludeGlobs::new(&options.include).map_err(LoaderError::from)?;

        let saved = match &options.save_file {
            Some(path) => GithubCacheFile::load(path)?,
            None => None,
        };
        let cache = if let Some(cache) = saved {
            tracing::info!(sha = %cache.sha, "Loaded content cache");
            cache
        } else {
            let cache = fetch_cache(&host, &options.directory, &options.branch)?;
            if let Some(path) = &options.save_file {
                cache.save(path)?;
            }
            cache
        };

        let fs = Arc::new(VirtualFileSystem::from_cache(&cache));
        let outputs: Box<dyn Store<LoaderOutput>> = if options.cache_outputs {
            Box::new(MemoryStore::new())
        } else {
            Box::new(NullStore)
        };
        Ok(Self {
            host,
            options,
            loader: Loader::new(loader),
            include,
            state: RwLock::new(SiteState { cache, fs }),
            outputs,
            reconcile_lock: Mutex::new(()),
        })
    }

    /// Tree sha of the cached content.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    #[must_use]
    pub fn sha(&self) -> String {
        self.state.read().unwrap().cache.sha.clone()
    }

    /// Snapshot of the cache.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    #[must_use]
    pub fn cache(&self) -> GithubCacheFile {
        self.state.read().unwrap().cache.clone()
    }

    #[must_use]
    pub fn options(&self) -> &RemoteSiteOptions {
        &self.options
    }

    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Loader output for the current content, built once per tree sha.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Loader`] when the cached files do not load.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    pub fn output(&self) -> Result<Arc<LoaderOutput>, RemoteError> {
        let (sha, fs) = {
            let state = self.state.read().unwrap();
            (state.cache.sha.clone(), Arc::clone(&state.fs))
        };
        let output = get_or_try_insert(self.outputs.as_ref(), &sha, || -> Result<_, LoaderError> {
            let files = fs.to_virtual_files(&self.include)?;
            self.loader.load(files)
        })?;
        Ok(output)
    }

    /// Bring the cache in line with `tree` and return the applied changes.
    ///
    /// Changed blobs are fetched in parallel before the cache is touched.
    /// The save file is rewritten before the new snapshot becomes visible.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when a blob cannot be fetched, the change set
    /// does not apply, or the save file cannot be written. The previous
    /// snapshot stays in place.
    ///
    /// # Panics
    ///
    /// Panics if a lock is poisoned.
    pub fn reconcile(&self, tree: &GitTree) -> Result<Vec<TreeDiff>, RemoteError> {
        let _guard = self.reconcile_lock.lock().unwrap();
        let cache = self.cache();

        let diffs = compare_to_git_tree(&cache, tree);
        if diffs.is_empty() {
            tracing::debug!(sha = %tree.sha, "Content unchanged");
            return Ok(diffs);
        }

        let contents: HashMap<String, String> = fetch_contents(&self.host, &diffs)?;
        let previous = cache.sha.clone();
        let mut updated = apply_to_cache(cache, &diffs, |diff| contents.get(&diff.path).cloned())?;
        updated.sha.clone_from(&tree.sha);

        if let Some(path) = &self.options.save_file {
            updated.save(path)?;
        }

        let fs = Arc::new(VirtualFileSystem::from_cache(&updated));
        *self.state.write().unwrap() = SiteState { cache: updated, fs };
        self.outputs.invalidate(&previous);

        tracing::info!(from = %previous, to = %tree.sha, changes = diffs.len(), "Reconciled content");
        Ok(diffs)
    }

    /// Reconcile against the commit of a push to the tracked branch.
    ///
    /// Returns `None` for pushes to other refs.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::DirectoryNotFound`] when the pushed commit has
    /// no content directory, or any error of [`RemoteSite::reconcile`].
    pub fn handle_push(&self, event: &PushEvent) -> Result<Option<ReconcileReport>, RemoteError> {
        if !event.is_branch(&self.options.branch) {
            tracing::debug!(git_ref = %event.git_ref, "Ignoring push to untracked ref");
            return Ok(None);
        }

        let tree = find_tree_recursive(&self.host, &self.options.directory, &event.after)?
            .ok_or_else(|| RemoteError::DirectoryNotFound {
                directory: self.options.directory.clone(),
                sha: event.after.clone(),
            })?;
        let changes = self.reconcile(&tree)?;
        let revalidate = revalidation_targets(&changes, self.loader.url_fn());

        Ok(Some(ReconcileReport {
            sha: tree.sha,
            changes,
            revalidate,
        }))
    }
}

/// Build a cache from the content directory of `reference`.
fn fetch_cache<H: GitHost + ?Sized>(
    host: &H,
    directory: &str,
    reference: &str,
) -> Result<GithubCacheFile, RemoteError> {
    let tree = find_tree_recursive(host, directory, reference)?.ok_or_else(|| {
        RemoteError::DirectoryNotFound {
            directory: directory.to_owned(),
            sha: reference.to_owned(),
        }
    })?;
    if tree.truncated {
        tracing::warn!(sha = %tree.sha, "Tree listing truncated, content may be incomplete");
    }

    let everything = compare_to_git_tree(&GithubCacheFile::empty("", ""), &tree);
    let contents = fetch_contents(host, &everything)?;
    let cache = cache_from_tree(&tree, |item| contents.get(&item.path).cloned())?;
    tracing::info!(sha = %cache.sha, files = contents.len(), "Fetched content");
    Ok(cache)
}
