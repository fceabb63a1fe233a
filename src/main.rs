/*
 * Simple DEX console
 * Main entry point for the application
 */

use simple_dex::{api, config::Config, service::DexService};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Simple DEX console");

    let config = match std::env::var("DEX_CONFIG_FILE") {
        Ok(path) => Config::from_file(&path),
        Err(_) => Config::from_env(),
    }
    .map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        chain_id = config.chain.chain_id,
        interface = ?config.dex.interface,
        "Configuration loaded successfully"
    );
    if config.dex.address.is_none() {
        error!("DEX_ADDRESS not set; reserve reads and swaps will be rejected");
    }

    let dex_service = Arc::new(DexService::new(config.clone())?);
    let _poller = dex_service.clone().spawn_poller();

    let api_state = api::ApiState {
        config: config.clone(),
        dex_service,
    };

    info!("Starting API server on {}:{}", config.server.host, config.server.port);

    let rocket = api::create_rocket(api_state);
    rocket
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("API server failed: {e}"))?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_dex=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
