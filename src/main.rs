use tracing_subscriber::EnvFilter;

use devconnector_api::app::{router, AppState};
use devconnector_api::config::AppConfig;
use devconnector_api::store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devconnector_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate()?;
    tracing::info!("Starting DevConnector API in {:?} mode", config.environment);
    if let Some(url) = config.redacted_database_url() {
        tracing::info!("Document store: {}", url);
    }

    let store = store::open(&config).await?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    let app = router(AppState::new(config, store));

    tracing::info!("DevConnector API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
