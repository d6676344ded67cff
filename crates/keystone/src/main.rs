//! # Keystone - site backend
//!
//! Serves the service catalog, gates the contact form behind email
//! verification, and runs the one-time-code flows for email and phone.
//!
//! ## Architecture
//! ```text
//! Site → Keystone → Mailer / SMS gateway
//!           ↓
//!      OTP store (in-process)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod catalog;
mod config;
mod delivery;
mod otp;
mod routes;
mod state;
mod validation;

use crate::config::AppConfig;
use crate::otp::{OtpManager, sweeper_worker};
use crate::state::AppState;

/// Keystone - site backend
#[derive(Parser, Debug)]
#[command(name = "keystone")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/keystone.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("🏭 Starting Keystone v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!("📋 Configuration loaded from {}", args.config);

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Initialize the verification code store
    let otp = Arc::new(OtpManager::with_system_clock(config.otp.policy()));

    // Spawn expiry sweeper
    let sweeper_otp = otp.clone();
    let sweeper_shutdown = shutdown_tx.subscribe();
    let sweep_interval = config.otp.sweep_interval();
    let sweeper = tokio::spawn(async move {
        sweeper_worker(sweeper_otp, sweep_interval, sweeper_shutdown).await;
    });

    // Initialize application state
    let state = AppState::new(config.clone(), otp);

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Keystone listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c(), shutdown_tx))
        .await
        .context("Server error")?;

    sweeper.await.context("Sweeper task panicked")?;

    info!("👋 Keystone shutdown complete");
    Ok(())
}

/// Resolve once `signal` fires, broadcasting shutdown to background workers.
///
/// If the signal handler cannot be installed the server keeps running
/// instead of stopping immediately.
async fn shutdown_on<F>(signal: F, shutdown_tx: broadcast::Sender<()>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C, graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
    let _ = shutdown_tx.send(());
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to install JSON log subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_broadcasts_shutdown() {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        shutdown_on(async { Ok(()) }, shutdown_tx).await;
        assert!(shutdown_rx.recv().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_signal_handler_keeps_serving() {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let signal = async { Err(std::io::Error::other("no signal support")) };

        let waited = tokio::time::timeout(
            Duration::from_secs(3600),
            shutdown_on(signal, shutdown_tx),
        )
        .await;
        assert!(waited.is_err());
        assert!(matches!(
            shutdown_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Closed)
        ));
    }
}
