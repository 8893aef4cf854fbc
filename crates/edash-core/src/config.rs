//! Configuration management for the energy dashboard
//!
//! Loads configuration with priority:
//! 1. config.toml (or specified config file)
//! 2. Environment variables (fallback)
//! 3. Defaults
//!
//! The upstream credential is mandatory. `validate()` rejects a configuration
//! without one so the process refuses to start instead of failing per request.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables consulted, in order, when no token is configured.
pub const TOKEN_ENV_VARS: [&str; 2] = ["ENERGY_API_TOKEN", "APP_BACKEND_ENDPOINT_TOKEN"];

/// Environment variable naming an explicit config file.
pub const CONFIG_FILE_ENV: &str = "EDASH_CONFIG";

pub const DEFAULT_UPSTREAM_BASE_URL: &str =
    "https://app.papernest.com/api/offer-catalog/staff/internal/energy-offers-list";

/// Dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdashConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub client: ClientSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// The energy-offers API the proxy adapters forward to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,

    /// Server-held credential (can reference env var with ${VAR_NAME})
    pub token: Option<String>,

    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

/// Settings for the request executor used by the catalog endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL the catalog paths are resolved against. Defaults to this
    /// server's own address.
    pub base_url: Option<String>,

    #[serde(default = "default_client_timeout_ms")]
    pub timeout_ms: u64,

    /// Lifetime of memoized GET responses. Zero disables the cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log_format: LogFormat,

    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub log_filter: Option<String>,

    pub service_name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            token: None,
            timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: default_client_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl EdashConfig {
    /// Load configuration from `$EDASH_CONFIG`, or the nearest config.toml,
    /// or environment variables and defaults when neither exists.
    pub fn load() -> Result<Self> {
        let explicit = env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(explicit.as_deref())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::find_config_file()?,
        };

        let mut config = match config_path {
            Some(config_path) => {
                tracing::debug!("Loading configuration from: {:?}", config_path);
                let contents = fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
                toml::from_str::<EdashConfig>(&contents)
                    .with_context(|| format!("Failed to parse config file: {:?}", config_path))?
            }
            None => {
                tracing::debug!("No config.toml found, using environment and defaults");
                EdashConfig::default()
            }
        };

        config.resolve_env_vars_with(|name| env::var(name).ok());
        Ok(config)
    }

    /// Parse configuration from TOML text, resolving `${VAR}` references with
    /// the supplied lookup.
    pub fn from_toml_str(
        contents: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config: EdashConfig =
            toml::from_str(contents).context("Failed to parse configuration")?;
        config.resolve_env_vars_with(lookup);
        Ok(config)
    }

    /// Find config.toml by searching current directory and parents
    fn find_config_file() -> Result<Option<PathBuf>> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Resolve ${VAR_NAME} references and the token fallbacks
    fn resolve_env_vars_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.upstream.token = self
            .upstream
            .token
            .as_deref()
            .and_then(|token| resolve_env_var(token, &lookup))
            .filter(|token| !token.trim().is_empty())
            .or_else(|| {
                TOKEN_ENV_VARS
                    .iter()
                    .filter_map(|name| lookup(*name))
                    .find(|value| !value.trim().is_empty())
            });

        if let Some(resolved) = resolve_env_var(&self.upstream.base_url, &lookup) {
            self.upstream.base_url = resolved;
        }

        if let Some(ref url) = self.client.base_url {
            self.client.base_url = resolve_env_var(url, &lookup);
        }
    }


    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        self.upstream_token()?;

        if self.upstream.base_url.trim().is_empty() {
            return Err(crate::Error::config_error("upstream.base_url is empty"));
        }
        if self.upstream.timeout_ms == 0 || self.client.timeout_ms == 0 {
            return Err(crate::Error::config_error(
                "timeouts must be greater than zero",
            ));
        }

        Ok(())
    }

    /// The upstream credential, or a configuration error naming the settings
    /// that could provide it.
    pub fn upstream_token(&self) -> crate::Result<&str> {
        self.upstream
            .token
            .as_deref()
            .ok_or_else(|| crate::Error::MissingCredential {
                setting: format!("upstream.token ({})", TOKEN_ENV_VARS.join(" or ")),
            })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Base URL for catalog execution; this server unless overridden.
    pub fn client_base_url(&self) -> String {
        self.client
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.listen_addr()))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.timeout_ms)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client.timeout_ms)
    }

    /// `None` when memoization is disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.client.cache_ttl_secs > 0).then(|| Duration::from_secs(self.client.cache_ttl_secs))
    }

    /// Create test-friendly defaults (fake credential, no file access)
    pub fn test_defaults() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig {
                token: Some("test-token".to_string()),
                ..UpstreamConfig::default()
            },
            client: ClientSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Resolve a single ${VAR_NAME} reference; other values pass through.
pub(crate) fn resolve_env_var(
    value: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        lookup(var_name)
    } else {
        Some(value.to_string())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    10_000
}

fn default_client_timeout_ms() -> u64 {
    5_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}
