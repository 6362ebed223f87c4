mod api;
mod config;
mod db;
mod error;
mod etl;
mod seed;
mod source;
mod types;

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, EtlOnStartup};
use crate::error::{AppError, Result};
use crate::etl::run_etl;
use crate::source::EspnClient;

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
    let health = Arc::new(HealthState::new());

    // --- Startup ETL ---
    let should_run = match cfg.etl_on_startup {
        EtlOnStartup::Always => true,
        EtlOnStartup::Never => false,
        EtlOnStartup::Empty => db::team_count(&pool).await? == 0,
    };
    if should_run {
        startup_etl(&cfg, &pool, &health).await?;
    } else {
        info!(mode = ?cfg.etl_on_startup, "Skipping startup ETL");
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        pool: pool.clone(),
        health,
        db_path: cfg.db_path.clone(),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Pulls the configured league. On failure either falls back to the sample
/// league or aborts startup, depending on `seed_on_failure`.
async fn startup_etl(cfg: &Config, pool: &SqlitePool, health: &HealthState) -> Result<()> {
    let client = EspnClient::new(cfg)?;

    // An unreachable league fails the fetch; one with fewer than two teams
    // fails league config conversion.
    match run_etl(&client, cfg.league_id, cfg.season_year, pool).await {
        Ok(report) => {
            health.record_etl(true, report.skipped.len() as u64);
            health.set_sample_data(false);
            info!(
                league = %report.league_name,
                teams = report.stats.teams,
                players = report.stats.players,
                "League loaded"
            );
            Ok(())
        }
        Err(e) => {
            health.record_etl(false, 0);
            if !cfg.seed_on_failure {
                return Err(AppError::Etl(e));
            }
            warn!("ETL failed ({e}); loading sample data instead");
            let report = seed::load_sample_data(pool).await?;
            health.set_sample_data(true);
            info!(teams = report.stats.teams, "Sample data loaded");
            Ok(())
        }
    }
}
