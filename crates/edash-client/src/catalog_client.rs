//! A client bound to one API group of the catalog.

use crate::auth::AuthConfig;
use crate::error::ClientError;
use crate::executor::RequestExecutor;
use crate::types::{ApiFailure, ClientConfig, ExecutionParams, ExecutionResult};
use edash_core::ApiGroup;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Executes the operations of one [`ApiGroup`], validating caller input
/// against the operation descriptors before anything is sent.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    api: ApiGroup,
    config: ClientConfig,
    executor: Arc<RequestExecutor>,
}

impl CatalogClient {
    /// Bind `api`. Groups without their own base URL (same-origin APIs) use
    /// `fallback_base_url`; group defaults supply the timeout, headers and
    /// an `apiKey` sent as a `Token` credential.
    pub fn new(api: ApiGroup, fallback_base_url: impl Into<String>) -> Self {
        let base_url = if api.base_url.is_empty() {
            fallback_base_url.into()
        } else {
            api.base_url.clone()
        };

        let mut config = ClientConfig::new(base_url);
        if let Some(timeout) = api.config.timeout {
            config = config.with_timeout(Duration::from_millis(timeout));
        }
        for (name, value) in &api.config.headers {
            config = config.with_header(name, value);
        }
        if let Some(key) = &api.config.api_key {
            config = config.with_auth(AuthConfig::token(key));
        }

        Self {
            api,
            config,
            executor: Arc::new(RequestExecutor::new()),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Share an executor (and its cache) between clients.
    pub fn with_executor(mut self, executor: Arc<RequestExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn api(&self) -> &ApiGroup {
        &self.api
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn operation_ids(&self) -> Vec<&str> {
        self.api.endpoints.iter().map(|op| op.id.as_str()).collect()
    }

    /// Validate and run one operation.
    #[instrument(skip(self, params), fields(api = %self.api.id))]
    pub async fn execute(&self, operation_id: &str, params: ExecutionParams) -> ExecutionResult {
        let operation = self
            .api
            .require_operation(operation_id)
            .map_err(ClientError::from)?;

        if operation.requires_auth && self.config.auth.is_none() {
            return Err(ClientError::MissingCredentials(operation.id.clone()).into());
        }

        let query = operation.resolve_query(&params.query).map_err(ClientError::from)?;
        if let Some(body) = &params.body {
            operation.check_body(body).map_err(ClientError::from)?;
        }

        debug!("Executing {} with {} query parameter(s)", operation.id, query.len());

        let params = ExecutionParams { query, ..params };
        self.executor.execute(&self.config, operation, &params).await
    }

    /// Like [`execute`](Self::execute), with the body given as raw JSON text.
    pub async fn execute_with_body_text(
        &self,
        operation_id: &str,
        params: ExecutionParams,
        body_text: &str,
    ) -> ExecutionResult {
        let params = params.with_body_text(body_text).map_err(ApiFailure::from)?;
        self.execute(operation_id, params).await
    }
}
