use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use backoffice_mock_api::{app::app, config, database::JsonStore};

#[derive(Parser)]
#[command(name = "backoffice-mock-api")]
#[command(about = "Mock backoffice REST API serving a JSON document with response envelopes")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides HOST)")]
    host: Option<String>,

    #[arg(long, help = "JSON document to serve (overrides DB_PATH)")]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORT, DB_PATH, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(db) = args.db {
        config.data.db_path = db;
    }
    tracing::info!("Starting backoffice mock API in {:?} mode", config.environment);

    let store = JsonStore::load(&config.data.db_path)
        .with_context(|| format!("failed to load {}", config.data.db_path.display()))?;

    let app = app(Arc::new(store), &config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    let base = format!("{}/{}", config.routes.alias_prefix, config.routes.resource);
    tracing::info!("Backoffice mock API listening on http://{}", bind_addr);
    tracing::info!("  GET {}?page=0&size=10", base);
    tracing::info!("  GET {}/:id", base);
    tracing::info!("  GET {}/mitra-list", base);
    tracing::info!("  GET {}/roles", base);
    tracing::info!("  GET {}", config.routes.health_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
