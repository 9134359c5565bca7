use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use tracing::info;

use contracts_api::api::{RateLimitConfig, create_router_with_rate_limit};
use contracts_api::app::AppState;
use contracts_api::infra::observability::{init_metrics_handle, init_tracing};
use contracts_api::infra::{AppConfig, EthereumContractClient, PostgresStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let metrics = init_metrics_handle();

    let store = PostgresStore::with_defaults(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    store
        .run_migrations()
        .await
        .context("failed to run migrations")?;

    let chain = EthereumContractClient::connect(
        &config.ws_url,
        config.private_key.expose_secret(),
        &config.nft_contract,
    )
    .await
    .context("failed to connect to Ethereum node")?;

    let mut state = AppState::new(
        Arc::new(chain),
        Arc::new(store),
        config.api_auth_key.clone(),
    );
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let router = create_router_with_rate_limit(Arc::new(state), RateLimitConfig::from_env());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("shutdown signal received");
}
