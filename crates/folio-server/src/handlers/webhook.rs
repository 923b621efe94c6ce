//! GitHub webhook endpoint.
//!
//! Deliveries are authenticated with `x-hub-signature-256` when a secret is
//! configured. Pushes to the tracked branch are reconciled before the
//! response is sent; every other event is acknowledged and ignored.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use folio_remote::{EVENT_HEADER, PushEvent, RemoteError, SIGNATURE_HEADER, verify_signature};

use crate::error::ServerError;
use crate::handlers::revalidate::RevalidateEvent;
use crate::state::AppState;

/// Handle POST /api/webhooks/github.
pub(crate) async fn github_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ServerError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        if !verify_signature(secret, signature, &body) {
            tracing::warn!("Rejected webhook delivery with invalid signature");
            return Err(ServerError::Unauthorized);
        }
    }

    let event = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok());
    if event != Some("push") {
        tracing::debug!(event, "Ignoring webhook event");
        return Ok((StatusCode::ACCEPTED, "Accepted"));
    }

    let push = PushEvent::parse(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let site = Arc::clone(&state.site);
    let result = tokio::task::spawn_blocking(move || site.handle_push(&push)).await?;

    match result {
        Ok(Some(report)) => {
            for target in report.revalidate {
                // No subscribers is not an error.
                let _ = state.revalidate.send(RevalidateEvent::new(&report.sha, target));
            }
        }
        Ok(None) => {}
        Err(RemoteError::DirectoryNotFound { directory, sha }) => {
            tracing::warn!(directory, sha, "Pushed commit has no content directory");
        }
        Err(e) => return Err(e.into()),
    }

    Ok((StatusCode::ACCEPTED, "Accepted"))
}
