//! Rally Server - Authoritative match engine
//!
//! This is the main entry point for the match engine. It owns:
//! - The room's phase state machine and robot state
//! - Per-register resolution of programmed cards
//! - Redacted per-viewer snapshot broadcasting
//!
//! Network transport is an external collaborator: it drives the room
//! through a `RoomHandle` and receives snapshots on per-player channels.

mod config;
mod game;

use rand::Rng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::Config;
use crate::game::RoomTask;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Rally Server match engine");

    let room_id = Uuid::new_v4();
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let (task, handle) = RoomTask::new(room_id, seed, config.room_settings());

    tokio::spawn(task.run());

    info!(
        room_id = %handle.id,
        seed,
        min_players = config.min_players,
        max_players = config.max_players,
        "Room ready, transport attaches via RoomHandle"
    );

    shutdown_signal().await;

    drop(handle);
    info!("Engine shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
