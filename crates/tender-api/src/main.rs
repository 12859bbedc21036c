//! # tender-api Entry Point
//!
//! Reads configuration from flags and the environment, connects to
//! Postgres when `DATABASE_URL` is set (in-memory mode otherwise),
//! hydrates the stores, and serves the application router.

use std::sync::Arc;

use clap::Parser;

use tender_api::auth::{PgSessions, SessionResolver, StaticSessions};
use tender_api::{db, AppConfig, AppState};

/// Tender Stack API server.
#[derive(Parser, Debug)]
#[command(name = "tender-api", version, about)]
struct Cli {
    /// Bind address (overrides TENDER_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides TENDER_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Postgres connection URL (overrides DATABASE_URL).
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok());
    let pool = db::init_pool(database_url.as_deref()).await?;

    let sessions: Arc<dyn SessionResolver> = match &pool {
        Some(pool) => Arc::new(PgSessions::new(pool.clone())),
        None => Arc::new(StaticSessions::default()),
    };

    let state = AppState::with_config(config.clone(), pool, sessions);
    db::hydrate(&state).await?;

    let app = tender_api::app(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "server started");
    axum::serve(listener, app).await?;
    Ok(())
}
