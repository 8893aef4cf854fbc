//! Proxy failures and the structured payload they render to.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use edash_core::config::TOKEN_ENV_VARS;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// No upstream token was configured
    #[error("Missing API token")]
    MissingCredential,

    /// The upstream answered with a non-2xx status
    #[error("API responded with status: {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid upstream payload: {0}")]
    Payload(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ProxyError {
    /// Configuration faults and transport faults are 500; upstream statuses
    /// are relayed unchanged.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamStatus(status) => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> String {
        match self {
            ProxyError::MissingCredential => format!(
                "Missing {} environment variable",
                TOKEN_ENV_VARS.join(" or ")
            ),
            other => other.to_string(),
        }
    }
}

/// Body of every failed proxy response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailureBody {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// A failure ready to cross the HTTP boundary.
#[derive(Debug)]
pub struct ProxyFailure {
    pub status: StatusCode,
    pub body: FailureBody,
}

impl ProxyFailure {
    /// `label` is used for everything except a missing credential, which is
    /// always reported as a configuration error.
    pub fn new(
        err: &ProxyError,
        label: &str,
        country: Option<&str>,
        endpoint: Option<&str>,
    ) -> Self {
        let error = match err {
            ProxyError::MissingCredential => "API configuration error",
            _ => label,
        };
        Self {
            status: err.status_code(),
            body: FailureBody {
                error: error.to_string(),
                details: err.details(),
                country: country.map(str::to_string),
                endpoint: endpoint.map(str::to_string),
            },
        }
    }
}

impl IntoResponse for ProxyFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
