use std::sync::Arc;
use std::time::Duration;

use mc_relay_proto::codec::JsonCodec;
use mc_relay_server::{ExtensionHost, Relay, RelayConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match RelayConfig::load("relay.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load relay.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "MC Relay v{} starting on {}, upstream {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr(),
        config.upstream.address,
        config.upstream.port
    );
    info!(
        "Tick every {:?}, command prefix {:?}",
        config.tick_interval(),
        config.relay.command_prefix
    );

    let mut host = ExtensionHost::new();
    host.enable_all(&config.extensions.disabled);

    let relay = Relay::new(config, Arc::new(JsonCodec), host);
    let listener = match relay.bind().await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    relay.run(listener, shutdown_rx).await;
    if !relay.drain(Duration::from_secs(5)).await {
        info!("Session still active, exiting anyway");
    }
    info!("Relay shut down.");
}
