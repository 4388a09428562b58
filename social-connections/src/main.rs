//! Social login connections server.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use social_connections::config::AppConfig;
use social_connections::handlers;
use social_connections::state::AppState;
use social_connections::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("social_connections=debug,tower_http=debug")),
        )
        .init();

    let config = AppConfig::load()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store).await?;
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
