pub mod aggregate;
pub mod normalize;

use tracing::{info, warn};

use crate::db::writer::{PersistStats, SnapshotWriter};
use crate::error::EtlError;
use crate::source::LeagueSource;
use crate::types::SkippedEntity;

pub use aggregate::{build_snapshot, AggregateReport};

/// Result of one successful ETL run.
#[derive(Debug, Clone)]
pub struct EtlReport {
    pub league_name: String,
    pub stats: PersistStats,
    pub skipped: Vec<SkippedEntity>,
}

/// Fetch, normalize and persist one league, replacing the stored snapshot.
pub async fn run_etl(
    source: &dyn LeagueSource,
    league_id: i64,
    year: i32,
    pool: &sqlx::SqlitePool,
) -> Result<EtlReport, EtlError> {
    info!(league_id, year, platform = %source.platform(), "Starting ETL run");

    let report = build_snapshot(source, league_id, year).await?;
    for s in &report.skipped {
        warn!(kind = %s.kind, source_id = ?s.source_id, "Skipped: {}", s.reason);
    }

    let stats = SnapshotWriter::new(pool.clone())
        .persist(&report.snapshot)
        .await?;

    info!(
        teams = stats.teams,
        players = stats.players,
        roster_entries = stats.roster_entries,
        matchups = stats.matchups,
        skipped = report.skipped.len(),
        "ETL run complete"
    );

    Ok(EtlReport {
        league_name: report.snapshot.league.league_name,
        stats,
        skipped: report.skipped,
    })
}
