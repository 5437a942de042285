//! `aigentd serve` — Start the HTTP API gateway.

use aigentd_config::AppConfig;
use aigentd_gateway::GatewayState;
use std::sync::Arc;
use tracing::warn;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if config.auth_tokens.is_empty() {
        warn!("No auth tokens configured; every API request will be rejected");
    }

    let store = super::build_store(&config).await?;
    let queue = super::build_queue(&config, store.clone());
    let state = Arc::new(GatewayState {
        store,
        queue,
        auth_tokens: config.auth_tokens.clone(),
    });

    println!("aigentd gateway");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Store:     {} ({})", config.store.backend, config.store.path);
    println!("   Tokens:    {}", config.auth_tokens.len());

    aigentd_gateway::serve(state, &config.server.host, config.server.port).await
}
