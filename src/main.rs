use std::path::PathBuf;

use anyhow::Result;
use avwx_hub::{AvwxConfig, api::AppState, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AvwxConfig::load_from_path(config_path)?;

    logging::init(&config.logging)?;
    tracing::info!(version = avwx_hub::VERSION, "Starting avwx-hub");

    let state = AppState::from_config(&config)?;
    tracing::info!(
        providers = state.registry.len(),
        sites = state.registry.all_sites().len(),
        "Provider registry ready"
    );

    web::run(&config.server, state).await
}
