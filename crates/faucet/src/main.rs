//! Faucet service binary

use clap::Parser;
use claim_faucet::api::router;
use claim_faucet::logging::init_logging;
use claim_faucet::{metrics, FaucetConfig, FaucetService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Faucet service CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Listening port
    #[arg(long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Log format (pretty, compact, json)
    #[arg(long)]
    log_format: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => FaucetConfig::from_file(path)?,
        None => FaucetConfig::from_env(),
    };

    if let Some(port) = args.port {
        config.server_addr = format!("0.0.0.0:{}", port);
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging)?;
    info!("Starting faucet service v{}", env!("CARGO_PKG_VERSION"));

    // Missing credentials are the only fatal condition
    config.validate()?;

    info!("Configuration:");
    info!("  Server address: {}", config.server_addr);
    info!("  Allowed origins: {:?}", config.allowed_origins);
    info!("  Confirmation poll interval: {}ms", config.confirmation_poll_interval_ms);
    for network in &config.networks {
        info!(
            "  Network {} ({}): contract {}",
            network.name,
            network.chain_id,
            network.contract_address().unwrap_or("<not configured>")
        );
    }

    metrics::register_metrics();

    let service = Arc::new(FaucetService::from_config(&config)?);
    info!("Faucet service initialized");

    let app = router(service, &config.allowed_origins);

    let addr: SocketAddr = config.server_addr.parse()?;
    info!("Server running on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Queued claims that have not settled are abandoned here
    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
