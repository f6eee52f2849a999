use std::sync::Arc;

use anyhow::{Context, Result};

use epicu_api::app::{app, AppState};
use epicu_api::auth::Clock;
use epicu_api::config;
use epicu_api::store::AirtableStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epicu_api=info,tower_http=info".into()),
        )
        .init();

    let cfg = config::config();
    let store = AirtableStore::from_config(&cfg.airtable)
        .context("Airtable store initialization failed")?;
    let state = AppState::new(Arc::new(store), Clock::system());

    let port: u16 = std::env::var("EPICU_API_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "epicu-api listening");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;

    Ok(())
}
