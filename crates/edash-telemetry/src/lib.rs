//! # Energy Dashboard Telemetry
//!
//! Structured logging and OpenTelemetry tracing for the proxy adapters and the
//! request executor.
//!
//! Span attribute names follow the OpenTelemetry HTTP semantic conventions;
//! dashboard-specific attributes live under the `edash.` prefix.

mod spans;
mod tracer;

pub use spans::{
    OperationSpanAttributes, UpstreamSpanAttributes, trace_operation_call, trace_upstream_call,
};
pub use tracer::{TelemetryOptions, init_telemetry, register_span_processor, tracer_provider};

/// OpenTelemetry span attribute constants.
pub mod attributes {
    // HTTP semantic conventions
    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    pub const URL_FULL: &str = "url.full";

    // Dashboard attributes
    pub const EDASH_OPERATION_ID: &str = "edash.operation.id";
    pub const EDASH_OUTCOME: &str = "edash.outcome";
    pub const EDASH_CACHE_HIT: &str = "edash.cache.hit";
    pub const EDASH_MARKET_COUNTRY: &str = "edash.market.country";
    pub const EDASH_ROUTE: &str = "edash.route";
    pub const EDASH_ELAPSED_MS: &str = "edash.elapsed_ms";

    /// Default tracer / service name
    pub const SERVICE_NAME: &str = "edash";
}
