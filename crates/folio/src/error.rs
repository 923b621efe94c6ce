//! CLI error types.

use folio_config::ConfigError;
use folio_remote::RemoteError;
use folio_search::SearchError;
use folio_server::ServerError;
use folio_source::{LoadError, LoaderError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Loader(#[from] LoaderError),

    #[error("{0}")]
    Search(#[from] SearchError),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
