mod api;
mod config;
mod db;
mod error;
mod fetcher;
mod refresh;
mod trends;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::refresh::Refresher;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    info!("Database ready at {}", cfg.db_path);

    let health = Arc::new(HealthState::new());
    let refresher = Arc::new(Refresher::new(cfg.clone(), pool.clone(), Arc::clone(&health))?);

    // --- Startup refresh: a failure here is reported but the API still serves stored data ---
    if cfg.refresh_on_start {
        if let Err(e) = refresher.refresh().await {
            warn!("Startup refresh failed, serving existing data: {e}");
        }
    }

    // --- Background refresh (disabled when REFRESH_INTERVAL_SECS=0) ---
    if cfg.refresh_interval_secs > 0 {
        info!("Background refresh every {}s", cfg.refresh_interval_secs);
        let background = Arc::clone(&refresher);
        tokio::spawn(async move { background.run().await });
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        pool: pool.clone(),
        refresher,
        health,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
