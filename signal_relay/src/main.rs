//! Signal relay entry point

use clap::Parser;
use signal_relay::{AppState, Config, Registry, SignalingError, SignalingRouter, serve};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SignalingError> {
    let config = Config::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("signal_relay={}", config.log_level)));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Signal relay listening on ws://{}/ws", addr);

    let state = AppState {
        router: SignalingRouter::new(Registry::new()),
        max_message_bytes: config.max_message_bytes,
        outbox_capacity: config.outbox_capacity,
    };
    serve(listener, state, shutdown_signal()).await?;

    info!("Signal relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
