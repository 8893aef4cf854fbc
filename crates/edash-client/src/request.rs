//! Turning an operation descriptor plus caller values into a concrete request.

use crate::auth::{AUTHORIZATION, AuthConfig};
use crate::error::{ClientError, Result};
use crate::types::{ClientConfig, ExecutionParams, ExecutionRequest};
use edash_core::OperationDescriptor;
use edash_core::catalog::{placeholders, render_value};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

const CONTENT_TYPE: &str = "Content-Type";

/// Substitute `{name}` tokens with percent-encoded path values.
///
/// Any token left over after substitution is an error; a request is never
/// sent with a literal `{name}` in its URL.
pub fn resolve_path(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut resolved = template.to_string();
    for (name, value) in values {
        resolved = resolved.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
    }

    let remaining = placeholders(&resolved);
    if !remaining.is_empty() {
        return Err(ClientError::UnresolvedPlaceholder(remaining.join(", ")));
    }
    Ok(resolved)
}

/// Query pairs in map order, with `null` values dropped.
pub fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    query
        .iter()
        .filter_map(|(name, value)| render_value(value).map(|v| (name.clone(), v)))
        .collect()
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

/// Defaults, then caller overrides, then the credential. Names compare
/// case-insensitively and the last writer wins.
pub fn merge_headers(
    defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
    auth: &AuthConfig,
) -> Vec<(String, String)> {
    let mut headers = Vec::with_capacity(defaults.len() + overrides.len() + 1);
    for (name, value) in defaults.iter().chain(overrides) {
        set_header(&mut headers, name, value);
    }
    if let Some(value) = auth.header_value() {
        set_header(&mut headers, AUTHORIZATION, &value);
    }
    headers
}

/// Build the request for `operation` without sending it.
pub fn build_request(
    config: &ClientConfig,
    operation: &OperationDescriptor,
    params: &ExecutionParams,
) -> Result<ExecutionRequest> {
    let path = resolve_path(&operation.path, &params.path)?;
    let mut url = url::Url::parse(&format!("{}{}", config.base_url.trim_end_matches('/'), path))?;

    let pairs = query_pairs(&params.query);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    let mut headers = merge_headers(&config.headers, &params.headers, &config.auth);

    let body = match (&params.body, operation.method.allows_body()) {
        (Some(body), true) => {
            if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE)) {
                headers.push((CONTENT_TYPE.to_string(), "application/json".to_string()));
            }
            Some(serde_json::to_vec(body)?)
        }
        _ => None,
    };

    debug!("Request URL: {} {}", operation.method, url);

    Ok(ExecutionRequest {
        method: operation.method,
        url,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use edash_core::HttpMethod;
    use serde_json::json;

    fn operation(method: HttpMethod, path: &str) -> OperationDescriptor {
        OperationDescriptor {
            id: "op".to_string(),
            name: "Op".to_string(),
            description: String::new(),
            method,
            path: path.to_string(),
            requires_auth: false,
            query_params: vec![],
            body_params: vec![],
        }
    }

    #[test]
    fn test_path_values_are_percent_encoded() {
        let values = BTreeMap::from([("id".to_string(), "a b/c".to_string())]);
        assert_eq!(resolve_path("/users/{id}", &values).unwrap(), "/users/a%20b%2Fc");
    }

    #[test]
    fn test_unresolved_placeholder_is_rejected() {
        let values = BTreeMap::from([("id".to_string(), "7".to_string())]);
        let err = resolve_path("/users/{id}/posts/{post_id}", &values).unwrap_err();
        assert!(matches!(err, ClientError::UnresolvedPlaceholder(ref names) if names == "post_id"));
    }

    #[test]
    fn test_null_query_values_are_dropped() {
        let query = json!({"page": 2, "provider": null, "green": true});
        let pairs = query_pairs(query.as_object().unwrap());
        assert_eq!(
            pairs,
            vec![
                ("green".to_string(), "true".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_credential_overrides_caller_authorization() {
        let defaults = BTreeMap::from([("Accept".to_string(), "application/json".to_string())]);
        let overrides = BTreeMap::from([
            ("authorization".to_string(), "Bearer caller".to_string()),
            ("accept".to_string(), "text/plain".to_string()),
        ]);
        let headers = merge_headers(&defaults, &overrides, &AuthConfig::token("server"));

        assert_eq!(headers.len(), 2);
        assert!(headers.contains(&("accept".to_string(), "text/plain".to_string())));
        assert!(headers.contains(&("Authorization".to_string(), "Token server".to_string())));
    }

    #[test]
    fn test_get_never_carries_a_body() {
        let config = ClientConfig::new("http://localhost:8080/");
        let params = ExecutionParams::new().body(json!({"a": 1}));

        let request =
            build_request(&config, &operation(HttpMethod::Get, "/items"), &params).unwrap();
        assert!(request.body.is_none());
        assert_eq!(request.url.as_str(), "http://localhost:8080/items");

        let request =
            build_request(&config, &operation(HttpMethod::Post, "/items"), &params).unwrap();
        assert_eq!(request.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
        assert!(
            request
                .headers
                .contains(&("Content-Type".to_string(), "application/json".to_string()))
        );
    }

    #[test]
    fn test_query_is_appended_only_when_present() {
        let config = ClientConfig::new("http://localhost:8080");
        let op = operation(HttpMethod::Get, "/api/energy/french");

        let request = build_request(&config, &op, &ExecutionParams::new()).unwrap();
        assert_eq!(request.url.query(), None);

        let params = ExecutionParams::new().query("filter_type", "green").query("page", 1);
        let request = build_request(&config, &op, &params).unwrap();
        assert_eq!(request.url.query(), Some("filter_type=green&page=1"));
    }
}
