use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::config::BENCH_SLOT;
use crate::error::StoreError;
use crate::types::{new_id, FantasyMatchup, FantasyTeam, LeagueConfig, Player, RosterEntry, Snapshot};

/// Row counts written by one persist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistStats {
    pub teams: usize,
    pub players: usize,
    pub roster_entries: usize,
    pub matchups: usize,
}

/// Replaces the stored snapshot with a new one inside a single transaction.
/// On any error the transaction is dropped uncommitted and the previous
/// snapshot stays in place.
pub struct SnapshotWriter {
    pool: sqlx::SqlitePool,
}

impl SnapshotWriter {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn persist(&self, snap: &Snapshot) -> Result<PersistStats, StoreError> {
        let mut tx = self.pool.begin().await?;

        clear_snapshot(&mut tx).await?;

        insert_league(&mut tx, &snap.league).await?;
        for team in &snap.teams {
            insert_team(&mut tx, team).await?;
        }
        for player in &snap.players {
            insert_player(&mut tx, player).await?;
        }

        let acquired_date = snap.generated_at.to_rfc3339();
        let mut slots: HashMap<String, String> = HashMap::new();
        for entry in &snap.roster_entries {
            let slot_id = match slots.get(&entry.slot) {
                Some(id) => id.clone(),
                None => {
                    let id = resolve_roster_slot(&mut tx, &entry.slot).await?;
                    slots.insert(entry.slot.clone(), id.clone());
                    id
                }
            };
            insert_roster_entry(&mut tx, entry, &slot_id, &acquired_date).await?;
        }

        for matchup in &snap.matchups {
            insert_matchup(&mut tx, matchup).await?;
        }

        tx.commit().await?;

        let stats = PersistStats {
            teams: snap.teams.len(),
            players: snap.players.len(),
            roster_entries: snap.roster_entries.len(),
            matchups: snap.matchups.len(),
        };
        info!(
            teams = stats.teams,
            players = stats.players,
            roster_entries = stats.roster_entries,
            matchups = stats.matchups,
            "Snapshot persisted"
        );
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Children before parents. Auxiliary rows cascade.
async fn clear_snapshot(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    for table in [
        "fantasy_matchups",
        "roster_entries",
        "players",
        "fantasy_teams",
        "league_config",
    ] {
        let res = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *conn)
            .await?;
        debug!(table, rows = res.rows_affected(), "Cleared");
    }
    Ok(())
}

async fn insert_league(conn: &mut SqliteConnection, l: &LeagueConfig) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO league_config (
            id, league_name, platform, platform_league_id, season_year,
            scoring_type, team_count, playoff_teams
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&l.id)
    .bind(&l.league_name)
    .bind(l.platform.to_string())
    .bind(&l.platform_league_id)
    .bind(l.season_year)
    .bind(l.scoring_type.to_string())
    .bind(i64::from(l.team_count))
    .bind(l.playoff_teams.map(i64::from))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_team(conn: &mut SqliteConnection, t: &FantasyTeam) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO fantasy_teams (
            id, owner_name, team_name, platform_team_id,
            wins, losses, ties, points_for, points_against
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&t.id)
    .bind(&t.owner_name)
    .bind(&t.team_name)
    .bind(&t.platform_team_id)
    .bind(i64::from(t.wins))
    .bind(i64::from(t.losses))
    .bind(i64::from(t.ties))
    .bind(t.points_for)
    .bind(t.points_against)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_player(conn: &mut SqliteConnection, p: &Player) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO players (
            id, espn_id, name, position, nfl_team_id, jersey_number, height,
            weight, age, experience_years, college, is_active, is_injured, injury_status
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&p.id)
    .bind(&p.espn_id)
    .bind(&p.name)
    .bind(p.position.as_str())
    .bind(&p.nfl_team_id)
    .bind(p.jersey_number)
    .bind(&p.height)
    .bind(p.weight)
    .bind(p.age)
    .bind(p.experience_years)
    .bind(&p.college)
    .bind(p.is_active)
    .bind(p.is_injured)
    .bind(&p.injury_status)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_roster_entry(
    conn: &mut SqliteConnection,
    e: &RosterEntry,
    roster_position_id: &str,
    acquired_date: &str,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO roster_entries (
            id, fantasy_team_id, player_id, roster_position_id,
            is_starting, acquired_date, acquisition_type
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&e.id)
    .bind(&e.fantasy_team_id)
    .bind(&e.player_id)
    .bind(roster_position_id)
    .bind(e.is_starting)
    .bind(acquired_date)
    .bind(e.acquisition_type.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_matchup(conn: &mut SqliteConnection, m: &FantasyMatchup) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO fantasy_matchups (
            id, week, home_team_id, away_team_id,
            home_score, away_score, winner_id, is_playoff
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&m.id)
    .bind(i64::from(m.week))
    .bind(&m.home_team_id)
    .bind(&m.away_team_id)
    .bind(m.home_score)
    .bind(m.away_score)
    .bind(&m.winner_id)
    .bind(m.is_playoff)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// `roster_positions` id for `slot`, falling back to the bench row. The
/// bench row is created on first use.
async fn resolve_roster_slot(conn: &mut SqliteConnection, slot: &str) -> Result<String, StoreError> {
    if let Some(id) = find_slot(conn, slot).await? {
        return Ok(id);
    }
    if let Some(id) = find_slot(conn, BENCH_SLOT).await? {
        debug!(slot, "Unknown roster slot, using bench");
        return Ok(id);
    }

    let id = new_id();
    sqlx::query("INSERT INTO roster_positions (id, position, count, is_bench) VALUES (?, ?, 1, 1)")
        .bind(&id)
        .bind(BENCH_SLOT)
        .execute(&mut *conn)
        .await?;
    info!(slot, "Created bench roster slot");
    Ok(id)
}

async fn find_slot(conn: &mut SqliteConnection, position: &str) -> Result<Option<String>, StoreError> {
    let id = sqlx::query_scalar("SELECT id FROM roster_positions WHERE position = ?")
        .bind(position)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}
