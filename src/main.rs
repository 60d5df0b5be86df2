use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wedding_api::{config::Config, db, services::metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    if config.champion_tokens.is_empty() {
        info!("CHAMPION_TOKENS not set, photo uploads are disabled");
    }
    for provider in &config.storage_providers {
        info!(name = %provider.name, quota_bytes = provider.quota_bytes, "storage provider registered");
    }

    metrics::start(pool.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let app = wedding_api::app(AppState::new(pool, config));

    info!("wedding API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
