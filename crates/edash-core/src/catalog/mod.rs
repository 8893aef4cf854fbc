//! The endpoint catalog: API groups and the operations they expose.
//!
//! Descriptors are loaded once at startup (the built-in markets or a JSON /
//! YAML document) and never mutated afterwards.

mod builtin;
mod params;

pub use params::{ParamKind, ParamSpec, render_value, resolve_params};

use crate::config::resolve_env_var;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// HTTP methods an operation may use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// GET and DELETE never carry a request body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(Error::CatalogParse(format!("Unsupported HTTP method: {other}"))),
        }
    }
}

/// Static description of one callable endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub method: HttpMethod,
    /// Path template, e.g. `/api/energy/{market}`
    pub path: String,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_params: Vec<ParamSpec>,
}

impl OperationDescriptor {
    /// Names of the `{name}` placeholders in the path template, in order.
    pub fn placeholders(&self) -> Vec<String> {
        placeholders(&self.path)
    }

    /// Validate caller query values and fill in defaults.
    pub fn resolve_query(&self, supplied: &Map<String, Value>) -> Result<Map<String, Value>> {
        resolve_params(&self.id, &self.query_params, supplied)
    }

    /// Validate a JSON body against the declared body parameters. Operations
    /// without body parameters accept any payload.
    pub fn check_body(&self, body: &Value) -> Result<()> {
        if self.body_params.is_empty() {
            return Ok(());
        }
        let fields = body
            .as_object()
            .ok_or_else(|| Error::invalid_parameter("body", "expected a JSON object"))?;
        resolve_params(&self.id, &self.body_params, fields).map(|_| ())
    }
}

/// Extract `{name}` tokens from a path template.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                names.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}

/// Per-group client defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Sent as `Authorization: Token <key>`. Never serialized back out.
    #[serde(default, rename = "apiKey", skip_serializing)]
    pub api_key: Option<String>,
}

/// A catalog entry bundling the operations of one market API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Empty means "same origin as the dashboard".
    #[serde(default, rename = "baseURL")]
    pub base_url: String,
    #[serde(default, rename = "repositoryURL")]
    pub repository_url: String,
    #[serde(default, rename = "docsURL")]
    pub docs_url: String,
    #[serde(default)]
    pub config: ClientDefaults,
    pub endpoints: Vec<OperationDescriptor>,
}

impl ApiGroup {
    pub fn operation(&self, id: &str) -> Option<&OperationDescriptor> {
        self.endpoints.iter().find(|op| op.id == id)
    }

    /// Like [`operation`](Self::operation), failing with
    /// [`Error::UnknownOperation`].
    pub fn require_operation(&self, id: &str) -> Result<&OperationDescriptor> {
        self.operation(id)
            .ok_or_else(|| Error::UnknownOperation(format!("'{id}' in API group '{}'", self.id)))
    }
}

/// The full set of API groups known to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    apis: Vec<ApiGroup>,
}

impl Catalog {
    /// Build and validate a catalog from API groups.
    pub fn new(apis: Vec<ApiGroup>) -> Result<Self> {
        let catalog = Self { apis };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The French and Italian energy-market APIs.
    pub fn builtin() -> Self {
        Self {
            apis: builtin::energy_markets(),
        }
    }

    /// Parse a catalog document. Accepts JSON or YAML, either a bare array of
    /// groups or `{ "apis": [...] }`. `${VAR}` API keys resolve from the
    /// environment.
    pub fn from_str(content: &str) -> Result<Self> {
        Self::from_str_with(content, |name| std::env::var(name).ok())
    }

    /// Like [`from_str`](Self::from_str), resolving `${VAR}` API keys with
    /// the supplied lookup.
    pub fn from_str_with(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Wrapped { apis: Vec<ApiGroup> },
            Bare(Vec<ApiGroup>),
        }

        let trimmed = content.trim_start();
        let document: Document = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            serde_json::from_str(content).map_err(|e| Error::CatalogParse(e.to_string()))?
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::CatalogParse(e.to_string()))?
        };

        let mut apis = match document {
            Document::Wrapped { apis } | Document::Bare(apis) => apis,
        };
        for api in &mut apis {
            api.config.api_key = api
                .config
                .api_key
                .as_deref()
                .and_then(|key| resolve_env_var(key, &lookup))
                .filter(|key| !key.trim().is_empty());
        }
        Self::new(apis)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        tracing::info!("Loading catalog from file: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn apis(&self) -> &[ApiGroup] {
        &self.apis
    }

    pub fn get_api(&self, id: &str) -> Option<&ApiGroup> {
        self.apis.iter().find(|api| api.id == id)
    }

    /// Unique group and operation ids, well-formed placeholders, and defaults
    /// that satisfy their own parameter specs.
    pub fn validate(&self) -> Result<()> {
        let mut api_ids = HashSet::new();
        let mut op_ids = HashSet::new();

        for api in &self.apis {
            if !api_ids.insert(api.id.as_str()) {
                return Err(Error::CatalogParse(format!("duplicate API id '{}'", api.id)));
            }
            for op in &api.endpoints {
                if !op_ids.insert(op.id.as_str()) {
                    return Err(Error::CatalogParse(format!(
                        "duplicate operation id '{}'",
                        op.id
                    )));
                }
                if op.placeholders().iter().any(|name| name.is_empty()) {
                    return Err(Error::CatalogParse(format!(
                        "operation '{}' has an empty path placeholder",
                        op.id
                    )));
                }
                for spec in op.query_params.iter().chain(&op.body_params) {
                    if let Some(default) = &spec.default_value {
                        spec.check(default).map_err(|e| {
                            Error::CatalogParse(format!("operation '{}': {e}", op.id))
                        })?;
                    }
                }
            }
        }

        Ok(())
    }
}
