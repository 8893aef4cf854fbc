use anyhow::{Context, Result};
use clap::Parser;
use edash_core::{Catalog, EdashConfig, LogFormat};
use edash_server::{AppState, create_router};
use edash_telemetry::{TelemetryOptions, attributes::SERVICE_NAME, init_telemetry};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "edash-server", version, about = "Energy market API dashboard proxy")]
struct Cli {
    /// Configuration file (defaults to the nearest config.toml)
    #[arg(long, env = "EDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Catalog document (JSON or YAML) replacing the built-in markets
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config =
        EdashConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let defaults = TelemetryOptions::default();
    init_telemetry(&TelemetryOptions {
        json: config.observability.log_format == LogFormat::Json,
        default_filter: config
            .observability
            .log_filter
            .clone()
            .unwrap_or(defaults.default_filter),
        service_name: config
            .observability
            .service_name
            .clone()
            .unwrap_or_else(|| SERVICE_NAME.to_string()),
    })
    .context("Failed to initialize telemetry")?;

    config.validate().context("Invalid configuration")?;

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("Failed to load catalog: {}", path.display()))?,
        None => Catalog::builtin(),
    };

    let app = create_router(AppState::from_config(&config, catalog));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Energy dashboard listening on http://{}", addr);
    info!("Upstream: {}", config.upstream.base_url);

    axum::serve(listener, app)
        .await
        .context("Server failed to start")?;

    Ok(())
}
