//! Playback Core host process
//!
//! Owns the shared cache, vote coordinator and track states for one bot
//! process and keeps their expiry sweepers running until shutdown.

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playback_core::{AppState, Config};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the shared application state
/// 4. Start the background expiry sweepers
/// 5. Wait for SIGINT/SIGTERM, then stop the sweepers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playback_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting playback core");

    let config = Config::from_env();
    config.validate().context("refusing to start")?;
    info!(
        "Configuration loaded: cache_max_entries={}, cache_default_ttl={}s, cache_cleanup_interval={}s, vote_window={}s, vote_sweep_interval={}s",
        config.cache_max_entries,
        config.cache_default_ttl,
        config.cache_cleanup_interval,
        config.vote_window,
        config.vote_sweep_interval
    );

    let state = AppState::from_config(&config);
    let sweepers = state.spawn_sweepers(&config);
    info!("Expiry sweepers started");

    shutdown_signal(sweepers).await?;

    let stats = state.cache.stats().await;
    info!(
        "Final cache stats: {}",
        serde_json::to_string(&stats).context("serializing cache stats")?
    );
    info!("Shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the sweepers.
async fn shutdown_signal(sweepers: Vec<JoinHandle<()>>) -> anyhow::Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("installing Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("installing SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res?;
            info!("Received Ctrl+C, initiating shutdown...");
        }
        res = terminate => {
            res?;
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for sweeper in sweepers {
        sweeper.abort();
    }
    warn!("Expiry sweepers aborted");
    Ok(())
}
