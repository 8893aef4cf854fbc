//! Credentials carried in the `Authorization` header.
//!
//! Supported schemes:
//! - Token (`Authorization: Token <key>`), the energy API's native scheme
//! - Bearer (`Authorization: Bearer <token>`)
//! - Basic (`Authorization: Basic <base64>`)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Header every credential is rendered into.
pub const AUTHORIZATION: &str = "Authorization";

/// Authentication configuration for API requests.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,

    /// `Authorization: Token <token>`
    Token { token: String },

    /// `Authorization: Bearer <token>`
    Bearer { token: String },

    /// HTTP Basic authentication
    Basic { username: String, password: String },
}

impl AuthConfig {
    /// Create token authentication.
    ///
    /// # Example
    ///
    /// ```
    /// use edash_client::AuthConfig;
    ///
    /// let auth = AuthConfig::token("my-api-token");
    /// assert_eq!(auth.header_value().as_deref(), Some("Token my-api-token"));
    /// ```
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    /// Create bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Create basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AuthConfig::None)
    }

    /// The `Authorization` header value, or `None` without a credential.
    pub fn header_value(&self) -> Option<String> {
        match self {
            AuthConfig::None => None,
            AuthConfig::Token { token } => Some(format!("Token {token}")),
            AuthConfig::Bearer { token } => Some(format!("Bearer {token}")),
            AuthConfig::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                Some(format!("Basic {encoded}"))
            }
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::Token { .. } => f.write_str("Token(<redacted>)"),
            AuthConfig::Bearer { .. } => f.write_str("Bearer(<redacted>)"),
            AuthConfig::Basic { username, .. } => write!(f, "Basic({username}, <redacted>)"),
        }
    }
}
