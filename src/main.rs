use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use streamhub_api::config::AppConfig;
use streamhub_api::store::PostgresStore;
use streamhub_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    if config.server.debug {
        tracing::info!("Debug mode enabled");
    }

    let store = Arc::new(
        PostgresStore::connect(&config.database)
            .await
            .context("failed to connect to database")?,
    );
    store
        .init_schema()
        .await
        .context("failed to initialize database schema")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store.clone(), store.clone(), store.clone(), store)?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("StreamHub API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
