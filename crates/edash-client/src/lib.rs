//! # Energy Dashboard Client
//!
//! Executes catalog operations over HTTP and normalizes every outcome into
//! `Result<ApiResponse, ApiFailure>`.
//!
//! ## Features
//!
//! - Path placeholder substitution with percent-encoding
//! - Query rendering that drops `null` values
//! - Token, Bearer and Basic credentials in the `Authorization` header
//! - A per-call timeout raced against the round trip
//! - Optional memoization of successful GET responses
//!
//! ## Example
//!
//! ```no_run
//! use edash_client::{AuthConfig, CatalogClient, ExecutionParams};
//! use edash_core::Catalog;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let api = Catalog::builtin().get_api("italian-energy-market").cloned().unwrap();
//! let client = CatalogClient::new(api, "http://127.0.0.1:8080")
//!     .with_auth(AuthConfig::token("my-token"));
//!
//! match client
//!     .execute("italian-price-summary", ExecutionParams::new().query("limit", 5))
//!     .await
//! {
//!     Ok(response) => println!("{} {}", response.status, response.data),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! # }
//! ```

mod auth;
mod cache;
mod catalog_client;
mod error;
mod executor;
mod request;
mod types;

pub use auth::{AUTHORIZATION, AuthConfig};
pub use cache::{CacheKey, DEFAULT_TTL, ResponseCache};
pub use catalog_client::CatalogClient;
pub use error::{ClientError, Result};
pub use executor::RequestExecutor;
pub use request::{build_request, merge_headers, query_pairs, resolve_path};
pub use types::{
    ApiFailure, ApiResponse, ClientConfig, DEFAULT_TIMEOUT, ExecutionOutcome, ExecutionParams,
    ExecutionRequest, ExecutionResult,
};
