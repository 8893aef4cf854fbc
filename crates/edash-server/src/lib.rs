//! HTTP surface of the energy dashboard
//!
//! Proxy adapters for the French and Italian markets plus a generic
//! passthrough, catalog browsing and execution, and health checks.

pub mod adapter;
pub mod cors;
pub mod error;
pub mod french;
pub mod italian;
pub mod passthrough;
pub mod reshape;
pub mod rest;
pub mod upstream;

pub use adapter::{InboundQuery, Market, Route, Translation, UpstreamQuery, translate};
pub use error::{FailureBody, ProxyError, ProxyFailure};
pub use french::FrenchMarket;
pub use italian::ItalianMarket;
pub use rest::{AppState, ExecuteOperationRequest, create_router};
pub use upstream::UpstreamClient;
