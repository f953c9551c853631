use std::sync::Arc;

use prd_guru::config::Config;
use prd_guru::gateway::GatewayRegistry;
use prd_guru::store::Store;
use prd_guru::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prd_guru=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        port = config.port,
        default_provider = %config.default_provider,
        platform_keys = config.platform_keys.len(),
        "prd-guru starting"
    );

    let store = Store::connect(&config.database_url).await?;
    let gateways = GatewayRegistry::from_catalog(&config.catalog, config.gateway_timeout)?;
    info!(providers = ?gateways.providers(), "model gateways ready");

    let addr = format!("0.0.0.0:{}", config.port);
    let app = prd_guru::app(Arc::new(AppState::new(config, store, gateways)));

    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
