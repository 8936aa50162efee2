use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use workout_reps::config::Config;
use workout_reps::logging;
use workout_reps::server::{serve, ServerState};
use workout_reps::session::{JsonlStore, SessionSettings, WorkoutStore};

const CONFIG_PATH: &str = "rep_server.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH)?;
    let log_path = logging::init("rep_server", &config.server.log_dir, config.debug.verbose)?;

    tracing::info!("Rep Server ({})", env!("GIT_VERSION"));
    tracing::info!("Log: {}", log_path.display());
    tracing::info!(
        "Tick: {} ms, inbox: {} frames, frame: {}x{}",
        config.session.tick_ms,
        config.session.inbox_capacity,
        config.session.frame_width,
        config.session.frame_height
    );
    if config.debug.verbose {
        tracing::info!("Verbose mode: ON");
    }

    let bind_addr: std::net::SocketAddr = config
        .server
        .listen_addr
        .parse()
        .context("invalid listen_addr")?;
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    let store = JsonlStore::new(&config.server.results_path);
    tracing::info!("Results: {}", store.path().display());
    match store.summary() {
        Ok(summary) => tracing::info!(
            "History: {} workouts, {} reps, {} s total, recent average {:.1} reps",
            summary.total_workouts,
            summary.total_reps,
            summary.total_duration_seconds,
            summary.recent_average_reps
        ),
        Err(e) => tracing::warn!("could not read history: {e:#}"),
    }
    let state = Arc::new(ServerState::new(SessionSettings::from_config(&config), store));

    tokio::select! {
        result = serve(listener, state) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
