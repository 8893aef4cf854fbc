//! Span helpers for upstream proxy calls and catalog operation executions

use crate::attributes::*;

/// Attributes recorded for one call from a proxy adapter to the upstream API
#[derive(Debug, Clone)]
pub struct UpstreamSpanAttributes {
    pub country: String,
    pub route: String,
    pub url: String,
    pub status: Option<u16>,
    pub elapsed_ms: u64,
}

/// Attributes recorded for one request-executor call
#[derive(Debug, Clone)]
pub struct OperationSpanAttributes {
    pub operation_id: String,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub outcome: String,
    pub cache_hit: bool,
    pub elapsed_ms: u64,
}

/// Record a span for a proxied upstream call.
pub fn trace_upstream_call(attrs: UpstreamSpanAttributes) {
    let span = tracing::info_span!(
        "upstream_call",
        { HTTP_REQUEST_METHOD } = "GET",
        { URL_FULL } = %attrs.url,
        { EDASH_MARKET_COUNTRY } = %attrs.country,
        { EDASH_ROUTE } = %attrs.route,
        { EDASH_ELAPSED_MS } = attrs.elapsed_ms,
        { HTTP_RESPONSE_STATUS_CODE } = tracing::field::Empty,
    );

    if let Some(status) = attrs.status {
        span.record(HTTP_RESPONSE_STATUS_CODE, status);
    }

    let _guard = span.enter();
}

/// Record a span for an executed catalog operation.
pub fn trace_operation_call(attrs: OperationSpanAttributes) {
    let span = tracing::info_span!(
        "execute_operation",
        { EDASH_OPERATION_ID } = %attrs.operation_id,
        { HTTP_REQUEST_METHOD } = %attrs.method,
        { URL_FULL } = %attrs.url,
        { EDASH_OUTCOME } = %attrs.outcome,
        { EDASH_CACHE_HIT } = attrs.cache_hit,
        { EDASH_ELAPSED_MS } = attrs.elapsed_ms,
        { HTTP_RESPONSE_STATUS_CODE } = tracing::field::Empty,
    );

    if let Some(status) = attrs.status {
        span.record(HTTP_RESPONSE_STATUS_CODE, status);
    }

    let _guard = span.enter();
}
