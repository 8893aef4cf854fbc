//! Configuration, parameters and outcomes of one request execution.

use crate::auth::AuthConfig;
use crate::error::ClientError;
use edash_core::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Applied when a configuration does not name its own timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Where and how to send requests for one logical target.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the operation path is appended to
    pub base_url: String,
    pub auth: AuthConfig,
    pub timeout: Duration,
    /// Default headers; caller headers override them case-insensitively
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: AuthConfig::None,
            timeout: DEFAULT_TIMEOUT,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Caller-supplied values for one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionParams {
    #[serde(default)]
    pub query: Map<String, Value>,
    #[serde(default)]
    pub path: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ExecutionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Parse raw body text the way the dashboard's editor submits it.
    /// Blank text means no body.
    pub fn with_body_text(mut self, text: &str) -> Result<Self, ClientError> {
        if text.trim().is_empty() {
            self.body = None;
            return Ok(self);
        }
        let body = serde_json::from_str(text).map_err(ClientError::InvalidBody)?;
        self.body = Some(body);
        Ok(self)
    }
}

/// A fully resolved request, ready to dispatch.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub method: HttpMethod,
    pub url: url::Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// A 2xx response with its parsed body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
}

/// Every way an execution can fail, normalized into one shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiFailure {
    /// Rejected before any network call.
    pub fn local(status: u16, status_text: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            status_text: Some(status_text.to_string()),
            data: None,
        }
    }

    pub fn timeout() -> Self {
        Self::local(408, "Request Timeout", "Request timeout")
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::local(0, "Network Error", message)
    }

    /// A non-2xx response. The message comes from `data.message` when the
    /// upstream supplied one.
    pub fn from_status(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Request failed")
            .to_string();
        Self {
            message,
            status: Some(status),
            status_text: Some(status_text.into()),
            data: Some(data),
        }
    }

    /// The response arrived but its body is not JSON.
    pub fn invalid_json(
        err: &serde_json::Error,
        status: u16,
        status_text: impl Into<String>,
    ) -> Self {
        Self {
            message: err.to_string(),
            status: Some(status),
            status_text: Some(status_text.into()),
            data: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.status == Some(408)
    }
}

/// Outcome of one execution: exactly one of success or failure.
pub type ExecutionResult = Result<ApiResponse, ApiFailure>;

/// Wire form of an [`ExecutionResult`], tagged by `outcome`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Success(ApiResponse),
    Failure(ApiFailure),
}

impl From<ExecutionResult> for ExecutionOutcome {
    fn from(result: ExecutionResult) -> Self {
        match result {
            Ok(response) => ExecutionOutcome::Success(response),
            Err(failure) => ExecutionOutcome::Failure(failure),
        }
    }
}
