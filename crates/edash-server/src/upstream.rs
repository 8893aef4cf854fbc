//! The single outbound client shared by every proxy route.

use crate::adapter::{Route, UpstreamQuery};
use crate::error::ProxyError;
use edash_client::AuthConfig;
use edash_core::EdashConfig;
use edash_telemetry::{UpstreamSpanAttributes, trace_upstream_call};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Calls `GET {base}{suffix}/?{query}` with the server-held token.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthConfig,
    timeout: Duration,
}

impl UpstreamClient {
    /// `token` of `None` builds a client that answers every call with a
    /// configuration error.
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            auth: token.map(AuthConfig::token).unwrap_or_default(),
            timeout,
        }
    }

    pub fn from_config(config: &EdashConfig) -> Self {
        Self::new(
            config.upstream.base_url.clone(),
            config.upstream.token.clone(),
            config.upstream_timeout(),
        )
    }

    pub fn has_credential(&self) -> bool {
        !self.auth.is_none()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, route: Route, query: &UpstreamQuery) -> Result<url::Url, ProxyError> {
        let raw = format!(
            "{}{}/?{}",
            self.base_url.trim_end_matches('/'),
            route.path_suffix(),
            query.to_query_string()
        );
        Ok(url::Url::parse(&raw)?)
    }

    /// Fetch and parse one upstream resource. `country` only labels logs
    /// and spans.
    pub async fn fetch(
        &self,
        country: &str,
        route: Route,
        query: &UpstreamQuery,
    ) -> Result<Value, ProxyError> {
        let authorization = self.auth.header_value().ok_or(ProxyError::MissingCredential)?;
        let url = self.url_for(route, query)?;

        debug!("Making {} {} API call to: {}", country, route.as_str(), url);

        let started = Instant::now();
        let outcome = self
            .http
            .get(url.clone())
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .send()
            .await;

        trace_upstream_call(UpstreamSpanAttributes {
            country: country.to_string(),
            route: route.as_str().to_string(),
            url: url.to_string(),
            status: outcome.as_ref().ok().map(|r| r.status().as_u16()),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });

        let response = outcome?;
        let status = response.status();
        if !status.is_success() {
            error!("{} API responded with status: {}", country, status);
            // reqwest and axum share the `http` crate's StatusCode
            return Err(ProxyError::UpstreamStatus(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_url_has_trailing_slash_before_query() {
        let client = UpstreamClient::new("https://example.com/list/", None, Duration::from_secs(1));
        let mut query = UpstreamQuery::new();
        query.append("country", "FRA");

        assert_eq!(
            client.url_for(Route::Providers, &query).unwrap().as_str(),
            "https://example.com/list/providers/?country=FRA"
        );
        assert_eq!(
            client.url_for(Route::Offers, &query).unwrap().as_str(),
            "https://example.com/list/?country=FRA"
        );
    }

    #[tokio::test]
    async fn test_missing_token_never_calls_upstream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let client = UpstreamClient::new(server.url(), None, Duration::from_secs(1));
        let err = client
            .fetch("FRA", Route::Offers, &UpstreamQuery::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::MissingCredential));
        assert!(!client.has_credential());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_and_content_type_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/providers/")
            .match_query(Matcher::UrlEncoded("country".into(), "ITA".into()))
            .match_header("authorization", "Token secret")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"[{"name": "Enel"}]"#)
            .create_async()
            .await;

        let client =
            UpstreamClient::new(server.url(), Some("secret".to_string()), Duration::from_secs(5));
        let mut query = UpstreamQuery::new();
        query.append("country", "ITA");

        let data = client.fetch("ITA", Route::Providers, &query).await.unwrap();
        assert_eq!(data[0]["name"], "Enel");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_kept() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(403)
            .with_body(r#"{"detail": "forbidden"}"#)
            .create_async()
            .await;

        let client =
            UpstreamClient::new(server.url(), Some("t".to_string()), Duration::from_secs(5));
        let err = client
            .fetch("FRA", Route::Offers, &UpstreamQuery::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }
}
