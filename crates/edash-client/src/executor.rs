//! The request executor: one operation in, one normalized outcome out.

use crate::cache::{CacheKey, ResponseCache};
use crate::request::build_request;
use crate::types::{
    ApiFailure, ApiResponse, ClientConfig, ExecutionParams, ExecutionRequest, ExecutionResult,
};
use edash_core::{HttpMethod, OperationDescriptor};
use edash_telemetry::{OperationSpanAttributes, trace_operation_call};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Issues requests described by catalog operations.
///
/// Every call makes at most one network attempt and never retries. The
/// optional cache is the only state shared between calls.
#[derive(Debug, Clone, Default)]
pub struct RequestExecutor {
    client: reqwest::Client,
    cache: Option<Arc<ResponseCache>>,
}

impl RequestExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing HTTP client (shared connection pool).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Memoize successful GET responses.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    /// Build, dispatch and normalize one call.
    #[instrument(skip(self, config, operation, params), fields(operation = %operation.id))]
    pub async fn execute(
        &self,
        config: &ClientConfig,
        operation: &OperationDescriptor,
        params: &ExecutionParams,
    ) -> ExecutionResult {
        let started = Instant::now();

        let request = match build_request(config, operation, params) {
            Ok(request) => request,
            Err(err) => {
                warn!("Rejected {} before dispatch: {}", operation.id, err);
                return Err(err.into());
            }
        };
        let url = request.url.to_string();

        let cache = self
            .cache
            .as_deref()
            .filter(|_| operation.method == HttpMethod::Get);
        let key = cache.map(|_| CacheKey::new(&operation.id, params));

        if let (Some(cache), Some(key)) = (cache, &key) {
            if let Some(hit) = cache.get(key) {
                debug!("Cache hit for {}", operation.id);
                record(operation, &url, &Ok(hit.clone()), true, started);
                return Ok(hit);
            }
        }

        let result = self.send(request, config.timeout).await;

        if let (Some(cache), Some(key), Ok(response)) = (cache, key, &result) {
            cache.insert(key, response.clone());
        }

        record(operation, &url, &result, false, started);
        result
    }

    /// Dispatch a prepared request, racing it against `timeout`.
    ///
    /// When the timer wins the in-flight request future is dropped, which
    /// aborts the connection.
    pub async fn send(&self, request: ExecutionRequest, timeout: Duration) -> ExecutionResult {
        let url = request.url.clone();
        tokio::select! {
            result = self.round_trip(request) => result,
            _ = tokio::time::sleep(timeout) => {
                warn!("Request to {} timed out after {:?}", url, timeout);
                Err(ApiFailure::timeout())
            }
        }
    }

    async fn round_trip(&self, request: ExecutionRequest) -> ExecutionResult {
        let mut builder = self.client.request(to_reqwest_method(request.method), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();

        debug!("Response status: {}", status);

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let bytes = response.bytes().await.map_err(classify_transport_error)?;
        let data = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| ApiFailure::invalid_json(&e, status.as_u16(), status_text.as_str()))?
        };

        if !status.is_success() {
            error!("API request failed with status {}: {}", status, data);
            return Err(ApiFailure::from_status(status.as_u16(), status_text, data));
        }

        Ok(ApiResponse {
            data,
            status: status.as_u16(),
            status_text,
            headers,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Timeouts reported by the transport itself count as timeouts; everything
/// else is a network error with status 0.
fn classify_transport_error(err: reqwest::Error) -> ApiFailure {
    if err.is_timeout() {
        ApiFailure::timeout()
    } else {
        ApiFailure::network(err.to_string())
    }
}

fn record(
    operation: &OperationDescriptor,
    url: &str,
    result: &ExecutionResult,
    cache_hit: bool,
    started: Instant,
) {
    let (status, outcome) = match result {
        Ok(response) => (Some(response.status), "success"),
        Err(failure) => (failure.status, "failure"),
    };
    trace_operation_call(OperationSpanAttributes {
        operation_id: operation.id.clone(),
        method: operation.method.to_string(),
        url: url.to_string(),
        status,
        outcome: outcome.to_string(),
        cache_hit,
        elapsed_ms: started.elapsed().as_millis() as u64,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn get_op(path: &str) -> OperationDescriptor {
        OperationDescriptor {
            id: "list-offers".to_string(),
            name: "List offers".to_string(),
            description: String::new(),
            method: HttpMethod::Get,
            path: path.to_string(),
            requires_auth: false,
            query_params: vec![],
            body_params: vec![],
        }
    }

    #[tokio::test]
    async fn test_success_is_normalized() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/offers")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [], "count": 0}"#)
            .create_async()
            .await;

        let config = ClientConfig::new(server.url());
        let params = ExecutionParams::new().query("page", 2).query("provider", Value::Null);
        let response = RequestExecutor::new()
            .execute(&config, &get_op("/offers"), &params)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.data["count"], 0);
        assert_eq!(response.headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_null_query_value_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/offers")
            .match_query(Matcher::Exact("page=1".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let params = ExecutionParams::new().query("page", 1).query("provider", Value::Null);
        RequestExecutor::new()
            .execute(&ClientConfig::new(server.url()), &get_op("/offers"), &params)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_carries_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/offers")
            .with_status(404)
            .with_body(r#"{"error":"missing"}"#)
            .create_async()
            .await;

        let failure = RequestExecutor::new()
            .execute(
                &ClientConfig::new(server.url()),
                &get_op("/offers"),
                &ExecutionParams::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.status_text.as_deref(), Some("Not Found"));
        assert_eq!(failure.message, "Request failed");
        assert_eq!(failure.data.unwrap()["error"], "missing");
    }

    #[tokio::test]
    async fn test_empty_body_parses_as_null() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/offers").with_status(204).create_async().await;

        let response = RequestExecutor::new()
            .execute(
                &ClientConfig::new(server.url()),
                &get_op("/offers"),
                &ExecutionParams::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(response.data, Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_json_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/offers")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let failure = RequestExecutor::new()
            .execute(
                &ClientConfig::new(server.url()),
                &get_op("/offers"),
                &ExecutionParams::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(failure.status, Some(200));
        assert!(failure.data.is_none());
    }

    #[tokio::test]
    async fn test_credential_overrides_caller_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/offers")
            .match_header("authorization", "Token server-secret")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let config = ClientConfig::new(server.url()).with_auth(AuthConfig::token("server-secret"));
        let params = ExecutionParams::new().header("Authorization", "Token caller");
        RequestExecutor::new()
            .execute(&config, &get_op("/offers"), &params)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_never_dispatches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let failure = RequestExecutor::new()
            .execute(
                &ClientConfig::new(server.url()),
                &get_op("/offers/{id}"),
                &ExecutionParams::new(),
            )
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(failure.status, Some(400));
        assert_eq!(failure.status_text.as_deref(), Some("Bad Request"));
    }

    #[tokio::test]
    async fn test_timeout_wins_against_slow_upstream() {
        let app = axum::Router::new().route(
            "/slow",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let timeout = Duration::from_millis(200);
        let config = ClientConfig::new(format!("http://{addr}")).with_timeout(timeout);

        let started = Instant::now();
        let failure = RequestExecutor::new()
            .execute(&config, &get_op("/slow"), &ExecutionParams::new())
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(failure.is_timeout());
        assert_eq!(failure.message, "Request timeout");
        assert!(elapsed >= timeout);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let failure = RequestExecutor::new()
            .execute(
                &ClientConfig::new(format!("http://{addr}")),
                &get_op("/offers"),
                &ExecutionParams::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(failure.status, Some(0));
        assert_eq!(failure.status_text.as_deref(), Some("Network Error"));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_gets_but_not_failures() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/offers")
            .with_status(200)
            .with_body(json!({"count": 1}).to_string())
            .expect(1)
            .create_async()
            .await;
        let failing = server
            .mock("GET", "/broken")
            .with_status(500)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let executor = RequestExecutor::new().with_cache(Arc::new(ResponseCache::default()));
        let config = ClientConfig::new(server.url());

        for _ in 0..2 {
            let response = executor
                .execute(&config, &get_op("/offers"), &ExecutionParams::new())
                .await
                .unwrap();
            assert_eq!(response.data["count"], 1);
        }

        let mut broken = get_op("/broken");
        broken.id = "broken".to_string();
        for _ in 0..2 {
            assert!(executor.execute(&config, &broken, &ExecutionParams::new()).await.is_err());
        }

        ok.assert_async().await;
        failing.assert_async().await;
        assert_eq!(executor.cache().map(ResponseCache::len), Some(1));
    }
}
