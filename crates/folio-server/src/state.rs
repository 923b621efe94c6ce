//! Application state.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::DynSite;
use crate::handlers::revalidate::RevalidateEvent;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Cached remote content.
    pub(crate) site: Arc<DynSite>,
    /// HMAC key for webhook signatures.
    pub(crate) webhook_secret: Option<String>,
    /// Revalidation events for WebSocket subscribers.
    pub(crate) revalidate: broadcast::Sender<RevalidateEvent>,
}
