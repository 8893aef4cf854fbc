//! Errors raised while preparing a request, before anything is sent.

use crate::types::ApiFailure;
use thiserror::Error;

/// Result type for request preparation.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Local validation failures. None of these reach the network.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The path template still contains `{name}` tokens after substitution
    #[error("Unresolved path placeholder(s): {0}")]
    UnresolvedPlaceholder(String),

    /// Base URL and path did not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Caller-supplied body text is not JSON
    #[error("Invalid JSON in request body")]
    InvalidBody(#[source] serde_json::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Parameter validation against the catalog failed
    #[error(transparent)]
    Catalog(#[from] edash_core::Error),

    /// The operation declares that it needs a credential and none is configured
    #[error("Operation '{0}' requires credentials")]
    MissingCredentials(String),
}

impl From<ClientError> for ApiFailure {
    fn from(err: ClientError) -> Self {
        match &err {
            ClientError::Catalog(edash_core::Error::UnknownOperation(_)) => {
                ApiFailure::local(404, "Not Found", err.to_string())
            }
            ClientError::MissingCredentials(_) => {
                ApiFailure::local(401, "Unauthorized", err.to_string())
            }
            _ => ApiFailure::local(400, "Bad Request", err.to_string()),
        }
    }
}
