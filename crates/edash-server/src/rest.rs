use crate::adapter::{InboundQuery, Market, translate};
use crate::cors::{preflight, with_cors};
use crate::error::{ProxyError, ProxyFailure};
use crate::french::FrenchMarket;
use crate::italian::ItalianMarket;
use crate::passthrough::{FAILURE_LABEL, translate_passthrough};
use crate::upstream::UpstreamClient;
use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use edash_client::{
    ApiFailure, CatalogClient, ExecutionOutcome, ExecutionParams, RequestExecutor, ResponseCache,
};
use edash_core::{ApiGroup, Catalog, EdashConfig};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, instrument};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub upstream: Arc<UpstreamClient>,
    pub executor: Arc<RequestExecutor>,
    /// Where catalog operations are sent; normally this server
    pub client_base_url: String,
    /// Used for groups that do not declare their own timeout
    pub client_timeout: Duration,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        upstream: UpstreamClient,
        client_base_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            upstream: Arc::new(upstream),
            executor: Arc::new(RequestExecutor::new()),
            client_base_url: client_base_url.into(),
            client_timeout: edash_client::DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &EdashConfig, catalog: Catalog) -> Self {
        let mut executor = RequestExecutor::new();
        if let Some(ttl) = config.cache_ttl() {
            executor = executor.with_cache(Arc::new(ResponseCache::new(ttl)));
        }

        Self {
            catalog: Arc::new(catalog),
            upstream: Arc::new(UpstreamClient::from_config(config)),
            executor: Arc::new(executor),
            client_base_url: config.client_base_url(),
            client_timeout: config.client_timeout(),
        }
    }

    fn catalog_client(&self, api: &ApiGroup) -> CatalogClient {
        let client = CatalogClient::new(api.clone(), self.client_base_url.clone())
            .with_executor(self.executor.clone());
        match api.config.timeout {
            Some(_) => client,
            None => client.with_timeout(self.client_timeout),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check endpoints
        .route("/health", get(health_check))
        .route("/readiness", get(readiness_check))
        // Proxy adapters
        .route("/api/energy", get(energy_passthrough).options(preflight))
        .route("/api/energy/french", get(french_energy).options(preflight))
        .route("/api/energy/italian", get(italian_energy).options(preflight))
        // Catalog browsing and execution
        .route("/api/v1/catalog", get(list_catalog))
        .route("/api/v1/catalog/:api_id", get(get_catalog_api))
        .route(
            "/api/v1/catalog/:api_id/operations/:operation_id/execute",
            post(execute_operation),
        )
        // Middleware layers (applied in reverse order)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    with_cors(router)
}

/// Health check endpoint - returns OK if the service is running
async fn health_check() -> impl IntoResponse {
    tracing::debug!("Health check requested");
    (StatusCode::OK, "OK")
}

/// Ready only when the upstream credential is configured
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!("Readiness check requested");

    if state.upstream.has_credential() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn french_energy(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    proxy_market(&state, &FrenchMarket, pairs.into()).await
}

async fn italian_energy(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    proxy_market(&state, &ItalianMarket, pairs.into()).await
}

#[instrument(skip_all, fields(country = market.country()))]
async fn proxy_market(state: &AppState, market: &dyn Market, inbound: InboundQuery) -> Response {
    let failure = |err: ProxyError| {
        error!("{} Error: {}", market.endpoint_label(), err);
        ProxyFailure::new(
            &err,
            market.failure_label(),
            Some(market.country()),
            Some(market.endpoint_label()),
        )
        .into_response()
    };

    if !state.upstream.has_credential() {
        return failure(ProxyError::MissingCredential);
    }

    let translation = translate(market, &inbound);
    let result = state
        .upstream
        .fetch(market.country(), translation.route, &translation.query)
        .await
        .and_then(|data| market.reshape(translation.route, data));

    match result {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(err) => failure(err),
    }
}

/// Generic forwarder; every failure is a 500.
async fn energy_passthrough(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let translation = translate_passthrough(&pairs.into());

    match state
        .upstream
        .fetch("passthrough", translation.route, &translation.query)
        .await
    {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(err) => {
            error!("API Error: {}", err);
            let mut failure = ProxyFailure::new(&err, FAILURE_LABEL, None, None);
            failure.status = StatusCode::INTERNAL_SERVER_ERROR;
            failure.into_response()
        }
    }
}

async fn list_catalog(State(state): State<AppState>) -> Json<Vec<ApiGroup>> {
    Json(state.catalog.apis().to_vec())
}

async fn get_catalog_api(
    Path(api_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiGroup>, AppError> {
    state
        .catalog
        .get_api(&api_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(edash_core::Error::UnknownApi(api_id)))
}

/// Body of an execution request; body text is parsed server-side.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteOperationRequest {
    pub query: Map<String, Value>,
    pub path: BTreeMap<String, String>,
    pub body: Option<String>,
    /// Per-call header overrides; the group credential still wins.
    pub headers: BTreeMap<String, String>,
}

/// Always 200; the outcome travels in the payload.
async fn execute_operation(
    Path((api_id, operation_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(req): Json<ExecuteOperationRequest>,
) -> Json<ExecutionOutcome> {
    let Some(api) = state.catalog.get_api(&api_id) else {
        let err = edash_core::Error::UnknownApi(api_id);
        return Json(ExecutionOutcome::Failure(ApiFailure::local(
            404,
            "Not Found",
            err.to_string(),
        )));
    };

    let client = state.catalog_client(api);
    let params = ExecutionParams {
        query: req.query,
        path: req.path,
        headers: req.headers,
        body: None,
    };

    let result = match req.body.as_deref() {
        Some(text) => client.execute_with_body_text(&operation_id, params, text).await,
        None => client.execute(&operation_id, params).await,
    };

    Json(result.into())
}

// Error handling
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn not_found(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let json = serde_json::json!({
            "error": self.message
        });
        (self.status, Json(json)).into_response()
    }
}
