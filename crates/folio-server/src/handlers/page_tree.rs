//! Page tree API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use folio_source::Root;
use serde::Deserialize;

use crate::error::ServerError;
use crate::state::AppState;

/// Query of GET /api/page-tree.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageTreeQuery {
    /// Locale; the first tree when absent.
    lang: Option<String>,
}

/// Handle GET /api/page-tree.
pub(crate) async fn get_page_tree(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageTreeQuery>,
) -> Result<Json<Root>, ServerError> {
    let site = Arc::clone(&state.site);
    let output = tokio::task::spawn_blocking(move || site.output()).await??;

    let root = match query.lang.as_deref() {
        Some(lang) => output.page_tree(lang),
        None => output.page_trees().values().next(),
    };
    root.cloned().map(Json).ok_or_else(|| {
        ServerError::NotFound(format!(
            "page tree for locale '{}'",
            query.lang.unwrap_or_default()
        ))
    })
}
