//! HTTP service for folio.
//!
//! Serves a [`RemoteSite`] over axum:
//! - `POST /api/webhooks/github`: signed push events reconcile the content cache
//! - `GET /api/page-tree?lang=`: navigation tree of the current content
//! - `GET /ws/revalidate`: stream of invalidation signals after each push
//!
//! # Architecture
//!
//! ```text
//! GitHub ──push──► webhook handler ──spawn_blocking──► RemoteSite::handle_push
//!                        │                                   │
//!                        │                      diff + parallel fetch + apply
//!                        ▼
//!              broadcast channel ──► WebSocket clients (/ws/revalidate)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use folio_remote::{GitHost, RemoteSite};
use state::AppState;
use tokio::sync::broadcast;

pub use error::ServerError;
pub use handlers::revalidate::RevalidateEvent;

/// Site type served by the HTTP layer.
pub type DynSite = RemoteSite<Box<dyn GitHost>>;

/// Capacity of the revalidation channel.
const REVALIDATE_CHANNEL_CAPACITY: usize = 100;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Webhook secret (`None` accepts unsigned deliveries).
    pub webhook_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            webhook_secret: None,
        }
    }
}

/// Create server configuration from folio config.
#[must_use]
pub fn server_config_from_config(config: &folio_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        webhook_secret: config.webhook.secret.clone(),
    }
}

/// Router serving `site`, plus the sender revalidation events go through.
#[must_use]
pub fn create_app(
    site: Arc<DynSite>,
    webhook_secret: Option<String>,
) -> (axum::Router, broadcast::Sender<RevalidateEvent>) {
    let (revalidate, _rx) = broadcast::channel(REVALIDATE_CHANNEL_CAPACITY);
    let state = Arc::new(AppState {
        site,
        webhook_secret,
        revalidate: revalidate.clone(),
    });
    (app::create_router(state), revalidate)
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener cannot bind.
pub async fn run_server(config: ServerConfig, site: Arc<DynSite>) -> Result<(), ServerError> {
    if config.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured, accepting unsigned deliveries");
    }
    let (app, _revalidate) = create_app(site, config.webhook_secret);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))
        .map_err(|e| ServerError::InvalidAddress(e.to_string()))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
