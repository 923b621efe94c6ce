//! Cache invalidation signals derived from a change set.

use folio_source::{UrlFn, get_slugs, parse_file_path};
use serde::{Deserialize, Serialize};

use crate::cache_file::parent_path;
use crate::diff::{DiffAction, TreeDiff};
use crate::tree::ObjectKind;

/// How much of the site a signal invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevalidateScope {
    /// Only the page at the URL.
    Page,
    /// The URL and everything rendered beneath it.
    Layout,
}

/// One invalidation signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revalidation {
    pub url: String,
    pub scope: RevalidateScope,
}

fn is_page(path: &str) -> bool {
    path.ends_with(".md") || path.ends_with(".mdx")
}

/// Signals for a change set, without duplicates, in change order.
///
/// * changed or removed Markdown page: its URL, page scope
/// * changed or removed meta file: its directory URL, layout scope
/// * changed or removed directory: its URL, layout scope
/// * any addition: the root URL, layout scope
#[must_use]
pub fn revalidation_targets(diffs: &[TreeDiff], get_url: &UrlFn) -> Vec<Revalidation> {
    let mut targets: Vec<Revalidation> = Vec::new();
    let mut push = |url: String, scope| {
        let target = Revalidation { url, scope };
        if !targets.contains(&target) {
            targets.push(target);
        }
    };

    for diff in diffs.iter().filter(|d| d.action != DiffAction::Add) {
        match diff.kind {
            ObjectKind::Blob if is_page(&diff.path) => {
                let info = parse_file_path(&diff.path);
                push(get_url(&get_slugs(&info), info.locale.as_deref()), RevalidateScope::Page);
            }
            ObjectKind::Blob if diff.path.ends_with(".json") => {
                push(get_url(&segments(parent_path(&diff.path)), None), RevalidateScope::Layout);
            }
            ObjectKind::Tree => {
                push(get_url(&segments(&diff.path), None), RevalidateScope::Layout);
            }
            _ => {}
        }
    }

    if diffs.iter().any(|d| d.action == DiffAction::Add) {
        push(get_url(&[], None), RevalidateScope::Layout);
    }

    targets
}

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
