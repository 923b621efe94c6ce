//! `folio diff` command implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Args;
use folio_config::CliSettings;
use folio_remote::{
    GithubCacheFile, TreeDiff, apply_to_cache, compare_to_git_tree, files_to_git_tree,
};
use folio_source::LocalSource;

use super::ContentArgs;
use crate::error::CliError;
use crate::output::{Output, print_json};

/// Arguments for the diff command.
#[derive(Args)]
pub(crate) struct DiffArgs {
    #[command(flatten)]
    pub(crate) content: ContentArgs,

    /// Cache file to compare (overrides config).
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Rewrite the cache file to match the content directory.
    #[arg(long)]
    apply: bool,
}

impl DiffArgs {
    /// Print the changes between a cache file and the local content.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load_config(CliSettings {
            cache_file: self.cache,
            ..CliSettings::default()
        })?;

        let contents = LocalSource::new(&config.source.dir, &config.source.include)?.contents()?;
        let cache_file = &config.cache.save_file;
        let diffs = diff_cache(cache_file, &contents, self.apply)?;
        print_json(&diffs)?;

        if diffs.is_empty() {
            output.success("Cache is up to date");
        } else if self.apply {
            output.success(&format!(
                "Applied {} change(s) to {}",
                diffs.len(),
                cache_file.display()
            ));
        } else {
            output.highlight(&format!("{} change(s)", diffs.len()));
        }
        Ok(())
    }
}

/// Compare the cache at `path` with `contents`, rewriting it when `apply`.
///
/// A missing cache file compares as empty.
fn diff_cache(
    path: &Path,
    contents: &BTreeMap<String, String>,
    apply: bool,
) -> Result<Vec<TreeDiff>, CliError> {
    let tree = files_to_git_tree(contents);
    let cache = GithubCacheFile::load(path)?.unwrap_or_else(|| GithubCacheFile::empty("", ""));
    let diffs = compare_to_git_tree(&cache, &tree);

    if apply && !diffs.is_empty() {
        let mut updated = apply_to_cache(cache, &diffs, |diff| contents.get(&diff.path).cloned())
            .map_err(folio_remote::RemoteError::from)?;
        updated.sha = tree.sha;
        updated.save(path)?;
    }
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use folio_remote::DiffAction;
    use pretty_assertions::assert_eq;

    use super::*;

    fn contents(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(path, content)| ((*path).to_owned(), (*content).to_owned()))
            .collect()
    }

    #[test]
    fn test_diff_against_missing_cache_lists_additions() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cache.json");

        let diffs = diff_cache(&path, &contents(&[("a.md", "A")]), false).unwrap();

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].action, DiffAction::Add);
        assert!(!path.exists());
    }

    #[test]
    fn test_apply_then_diff_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cache.json");
        let files = contents(&[("a.md", "A"), ("guide/b.md", "B")]);

        diff_cache(&path, &files, true).unwrap();
        let again = diff_cache(&path, &files, false).unwrap();

        assert!(again.is_empty());
        let cache = GithubCacheFile::load(&path).unwrap().unwrap();
        assert_eq!(cache.sha, files_to_git_tree(&files).sha);
    }

    #[test]
    fn test_diff_reports_modification() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cache.json");
        diff_cache(&path, &contents(&[("a.md", "A")]), true).unwrap();

        let diffs = diff_cache(&path, &contents(&[("a.md", "A2")]), false).unwrap();

        let actions: Vec<_> = diffs.iter().map(|d| (d.action, d.path.as_str())).collect();
        assert_eq!(actions, vec![(DiffAction::Modify, "a.md")]);
    }
}
