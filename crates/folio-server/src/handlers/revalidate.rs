//! WebSocket stream of revalidation signals.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use folio_remote::{RevalidateScope, Revalidation};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::state::AppState;

/// Event sent to connected clients after a push changed content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RevalidateEvent {
    /// Content tree sha the signal belongs to.
    pub sha: String,
    /// URL to invalidate.
    pub url: String,
    /// Invalidation scope.
    pub scope: RevalidateScope,
}

impl RevalidateEvent {
    pub(crate) fn new(sha: &str, target: Revalidation) -> Self {
        Self {
            sha: sha.to_owned(),
            url: target.url,
            scope: target.scope,
        }
    }
}

/// Handle WebSocket upgrade for revalidation.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let receiver = state.revalidate.subscribe();
    ws.on_upgrade(|socket| handle_socket(socket, receiver))
}

/// Forward events until either side goes away.
async fn handle_socket(mut socket: WebSocket, mut receiver: broadcast::Receiver<RevalidateEvent>) {
    tracing::debug!("Revalidation client connected");
    loop {
        tokio::select! {
            result = receiver.recv() => {
                match result {
                    Ok(event) => {
                        let Ok(msg) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if socket.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Revalidation client lagging, events dropped");
                    }
                }
            }
            // Client messages only keep the connection alive.
            result = socket.recv() => {
                match result {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
    tracing::debug!("Revalidation client disconnected");
}
