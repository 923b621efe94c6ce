//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_remote::RemoteError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Webhook signature missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Content could not be fetched, reconciled or loaded.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Bind address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote(
                RemoteError::Http { .. } | RemoteError::Status { .. } | RemoteError::NotFound { .. },
            ) => StatusCode::BAD_GATEWAY,
            Self::Remote(_) | Self::Task(_) | Self::InvalidAddress(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, axum::Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServerError::BadRequest("x".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Remote(RemoteError::NotFound { sha: "abc".to_owned() }).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServerError::Remote(RemoteError::DirectoryNotFound {
                directory: "docs".to_owned(),
                sha: "abc".to_owned(),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
