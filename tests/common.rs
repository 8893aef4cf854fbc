//! Common test utilities and helpers

#![allow(dead_code)]

use axum::Router;
use edash_core::Catalog;
use edash_server::{AppState, UpstreamClient, create_router};
use std::net::SocketAddr;
use std::time::Duration;

pub const TEST_TOKEN: &str = "test-token";

/// Serve `router` on an ephemeral port and return its address.
pub async fn spawn(router: Router) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

/// Dashboard router proxying to `upstream_url`, with catalog operations
/// sent to `client_base_url`.
pub fn dashboard(upstream_url: &str, token: Option<&str>, client_base_url: &str) -> Router {
    let upstream = UpstreamClient::new(
        upstream_url,
        token.map(str::to_string),
        Duration::from_secs(5),
    );
    create_router(AppState::new(Catalog::builtin(), upstream, client_base_url))
}

/// Dashboard bound to a real port so catalog operations can call back into
/// its own proxy routes.
pub async fn spawn_dashboard(upstream_url: &str) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = dashboard(upstream_url, Some(TEST_TOKEN), &format!("http://{addr}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

/// An upstream that accepts requests and never answers within `delay`.
pub async fn spawn_slow_upstream(delay: Duration) -> anyhow::Result<SocketAddr> {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "{}"
    });
    spawn(router).await
}
