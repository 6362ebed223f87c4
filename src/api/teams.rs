use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::api::routes::ApiState;
use crate::db::models::{
    MatchupRow, RosterPlayerRow, TeamRow, MATCHUP_SELECT, PLAYER_COLUMNS, PLAYER_JOIN,
    POSITION_ORDER,
};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamMetrics {
    pub total_games: i64,
    pub win_percentage: f64,
    pub average_points_for: f64,
    pub average_points_against: f64,
    pub point_differential: f64,
}

impl TeamMetrics {
    pub fn of(t: &TeamRow) -> Self {
        let total_games = t.total_games();
        let games = total_games.max(1) as f64;
        Self {
            total_games,
            win_percentage: t.wins as f64 / games,
            average_points_for: t.points_for / games,
            average_points_against: t.points_against / games,
            point_differential: t.points_for - t.points_against,
        }
    }
}

#[derive(Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<TeamRow>,
}

#[derive(Debug, Serialize)]
pub struct StandingRow {
    #[serde(flatten)]
    pub team: TeamRow,
    #[serde(flatten)]
    pub metrics: TeamMetrics,
    pub rank: usize,
}

#[derive(Serialize)]
pub struct StandingsResponse {
    pub standings: Vec<StandingRow>,
}

#[derive(Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: TeamRow,
    #[serde(flatten)]
    pub metrics: TeamMetrics,
    pub roster: Vec<RosterPlayerRow>,
}

#[derive(Serialize)]
pub struct TeamDetailResponse {
    pub team: TeamDetail,
}

#[derive(Debug, Serialize)]
pub struct RosterComposition {
    pub starting_players: usize,
    pub bench_players: usize,
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub team_id: String,
    pub starting_lineup: Vec<RosterPlayerRow>,
    pub bench: Vec<RosterPlayerRow>,
    pub total_players: usize,
    pub position_counts: BTreeMap<String, usize>,
    pub roster_composition: RosterComposition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub matchup_id: String,
    pub week: i64,
    pub is_home: bool,
    pub opponent_id: String,
    pub opponent_name: Option<String>,
    pub opponent_owner: Option<String>,
    pub team_score: f64,
    pub opponent_score: f64,
    pub result: &'static str,
    pub is_playoff: i64,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub team_id: String,
    pub team_name: String,
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Serialize)]
pub struct TeamWithPlayers {
    #[serde(flatten)]
    pub team: TeamRow,
    pub players: Vec<RosterPlayerRow>,
    pub player_count: usize,
    pub roster_composition: BTreeMap<String, usize>,
}

#[derive(Serialize)]
pub struct TeamsWithPlayersResponse {
    pub teams: Vec<TeamWithPlayers>,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

pub fn position_counts(roster: &[RosterPlayerRow]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for r in roster {
        *counts.entry(r.player.position.clone()).or_insert(0) += 1;
    }
    counts
}

/// Ranked by wins, then points for, both descending.
pub fn standings(teams: Vec<TeamRow>) -> Vec<StandingRow> {
    let mut teams = teams;
    teams.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.points_for.total_cmp(&a.points_for))
    });
    teams
        .into_iter()
        .enumerate()
        .map(|(i, team)| StandingRow {
            metrics: TeamMetrics::of(&team),
            team,
            rank: i + 1,
        })
        .collect()
}

pub fn split_roster(team_id: String, roster: Vec<RosterPlayerRow>) -> RosterResponse {
    let total_players = roster.len();
    let position_counts = position_counts(&roster);
    let (starting_lineup, bench): (Vec<_>, Vec<_>) =
        roster.into_iter().partition(|r| r.is_starting != 0);

    RosterResponse {
        team_id,
        roster_composition: RosterComposition {
            starting_players: starting_lineup.len(),
            bench_players: bench.len(),
        },
        starting_lineup,
        bench,
        total_players,
        position_counts,
    }
}

/// W/L/T from the team's side; TBD while both scores are zero.
pub fn game_result(team_score: f64, opponent_score: f64) -> &'static str {
    if team_score <= 0.0 && opponent_score <= 0.0 {
        "TBD"
    } else if team_score > opponent_score {
        "W"
    } else if team_score < opponent_score {
        "L"
    } else {
        "T"
    }
}

pub fn schedule_entry(team_id: &str, m: &MatchupRow) -> ScheduleEntry {
    let is_home = m.home_team_id == team_id;
    let (opponent_id, opponent_name, opponent_owner, team_score, opponent_score) = if is_home {
        (&m.away_team_id, &m.away_team_name, &m.away_owner_name, m.home_score, m.away_score)
    } else {
        (&m.home_team_id, &m.home_team_name, &m.home_owner_name, m.away_score, m.home_score)
    };

    ScheduleEntry {
        matchup_id: m.id.clone(),
        week: m.week,
        is_home,
        opponent_id: opponent_id.clone(),
        opponent_name: opponent_name.clone(),
        opponent_owner: opponent_owner.clone(),
        team_score,
        opponent_score,
        result: game_result(team_score, opponent_score),
        is_playoff: m.is_playoff,
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

const TEAM_SELECT: &str = r#"
    SELECT id, owner_name, team_name, platform_team_id,
           wins, losses, ties, points_for, points_against
    FROM fantasy_teams
"#;

pub(crate) async fn fetch_teams(pool: &SqlitePool) -> Result<Vec<TeamRow>, AppError> {
    let rows = sqlx::query_as::<_, TeamRow>(&format!("{TEAM_SELECT} ORDER BY team_name"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub(crate) async fn fetch_team(pool: &SqlitePool, team_id: &str) -> Result<TeamRow, AppError> {
    sqlx::query_as::<_, TeamRow>(&format!("{TEAM_SELECT} WHERE id = ?"))
        .bind(team_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum RosterOrder {
    /// Position, then starters, then name.
    ByPosition,
    /// Starters first, then position, then name.
    StartersFirst,
}

pub(crate) async fn fetch_roster(
    pool: &SqlitePool,
    team_id: &str,
    order: RosterOrder,
) -> Result<Vec<RosterPlayerRow>, AppError> {
    let order_by = match order {
        RosterOrder::ByPosition => format!("{POSITION_ORDER}, re.is_starting DESC, p.name"),
        RosterOrder::StartersFirst => format!("re.is_starting DESC, {POSITION_ORDER}, p.name"),
    };
    let sql = format!(
        r#"
        SELECT {PLAYER_COLUMNS},
               rp.position AS roster_position, re.is_starting,
               re.acquisition_type, re.acquired_date
        FROM roster_entries re
        JOIN players p ON p.id = re.player_id
        {PLAYER_JOIN}
        LEFT JOIN roster_positions rp ON rp.id = re.roster_position_id
        WHERE re.fantasy_team_id = ?
        ORDER BY {order_by}
        "#
    );
    let rows = sqlx::query_as::<_, RosterPlayerRow>(&sql)
        .bind(team_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn get_teams(State(state): State<ApiState>) -> Result<Json<TeamsResponse>, AppError> {
    let teams = fetch_teams(&state.pool).await?;
    Ok(Json(TeamsResponse { teams }))
}

/// Every team with its roster, best scoring first.
pub async fn get_teams_with_players(
    State(state): State<ApiState>,
) -> Result<Json<TeamsWithPlayersResponse>, AppError> {
    let teams =
        sqlx::query_as::<_, TeamRow>(&format!("{TEAM_SELECT} ORDER BY points_for DESC, team_name"))
            .fetch_all(&state.pool)
            .await?;

    let mut out = Vec::with_capacity(teams.len());
    for team in teams {
        let players = fetch_roster(&state.pool, &team.id, RosterOrder::ByPosition).await?;
        out.push(TeamWithPlayers {
            player_count: players.len(),
            roster_composition: position_counts(&players),
            team,
            players,
        });
    }
    Ok(Json(TeamsWithPlayersResponse { teams: out }))
}

pub async fn get_standings(
    State(state): State<ApiState>,
) -> Result<Json<StandingsResponse>, AppError> {
    let teams = fetch_teams(&state.pool).await?;
    Ok(Json(StandingsResponse {
        standings: standings(teams),
    }))
}

pub async fn get_team(
    State(state): State<ApiState>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamDetailResponse>, AppError> {
    let team = fetch_team(&state.pool, &team_id).await?;
    let roster = fetch_roster(&state.pool, &team_id, RosterOrder::ByPosition).await?;
    Ok(Json(TeamDetailResponse {
        team: TeamDetail {
            metrics: TeamMetrics::of(&team),
            team,
            roster,
        },
    }))
}

pub async fn get_team_roster(
    State(state): State<ApiState>,
    Path(team_id): Path<String>,
) -> Result<Json<RosterResponse>, AppError> {
    fetch_team(&state.pool, &team_id).await?;
    let roster = fetch_roster(&state.pool, &team_id, RosterOrder::StartersFirst).await?;
    Ok(Json(split_roster(team_id, roster)))
}

pub async fn get_team_schedule(
    State(state): State<ApiState>,
    Path(team_id): Path<String>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let team = fetch_team(&state.pool, &team_id).await?;
    let matchups = sqlx::query_as::<_, MatchupRow>(&format!(
        "{MATCHUP_SELECT} WHERE m.home_team_id = ? OR m.away_team_id = ? ORDER BY m.week"
    ))
    .bind(&team_id)
    .bind(&team_id)
    .fetch_all(&state.pool)
    .await?;

    let schedule = matchups
        .iter()
        .map(|m| schedule_entry(&team_id, m))
        .collect();

    Ok(Json(ScheduleResponse {
        team_id,
        team_name: team.team_name,
        schedule,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PlayerRow;

    fn team(id: &str, wins: i64, losses: i64, points_for: f64) -> TeamRow {
        TeamRow {
            id: id.to_string(),
            owner_name: format!("Owner {id}"),
            team_name: format!("Team {id}"),
            platform_team_id: Some(id.to_string()),
            wins,
            losses,
            ties: 0,
            points_for,
            points_against: 100.0,
        }
    }

    fn roster_player(name: &str, position: &str, is_starting: i64) -> RosterPlayerRow {
        RosterPlayerRow {
            player: PlayerRow {
                id: name.to_string(),
                espn_id: None,
                name: name.to_string(),
                position: position.to_string(),
                nfl_team_id: None,
                jersey_number: None,
                height: None,
                weight: None,
                age: None,
                experience_years: None,
                college: None,
                is_active: 1,
                is_injured: 0,
                injury_status: None,
                nfl_team_name: None,
                nfl_team_code: None,
            },
            roster_position: None,
            is_starting,
            acquisition_type: None,
            acquired_date: None,
        }
    }

    #[test]
    fn standings_rank_by_wins_then_points() {
        let rows = standings(vec![
            team("a", 5, 9, 1800.0),
            team("b", 9, 5, 2000.0),
            team("c", 9, 5, 2100.0),
        ]);
        let order: Vec<(&str, usize)> = rows.iter().map(|r| (r.team.id.as_str(), r.rank)).collect();
        assert_eq!(order, vec![("c", 1), ("b", 2), ("a", 3)]);
        assert!((rows[0].metrics.win_percentage - 9.0 / 14.0).abs() < 1e-9);
        assert!((rows[0].metrics.average_points_for - 150.0).abs() < 1e-9);
        assert!((rows[0].metrics.point_differential - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn metrics_without_games_do_not_divide_by_zero() {
        let m = TeamMetrics::of(&team("x", 0, 0, 0.0));
        assert_eq!(m.total_games, 0);
        assert_eq!(m.win_percentage, 0.0);
        assert_eq!(m.average_points_for, 0.0);
    }

    #[test]
    fn results_from_team_perspective() {
        assert_eq!(game_result(0.0, 0.0), "TBD");
        assert_eq!(game_result(101.5, 99.0), "W");
        assert_eq!(game_result(80.0, 99.0), "L");
        assert_eq!(game_result(90.0, 90.0), "T");
    }

    #[test]
    fn schedule_entry_flips_for_away_team() {
        let m = MatchupRow {
            id: "m1".to_string(),
            week: 3,
            home_team_id: "h".to_string(),
            away_team_id: "a".to_string(),
            home_score: 120.0,
            away_score: 95.5,
            winner_id: Some("h".to_string()),
            is_playoff: 0,
            home_team_name: Some("Home".to_string()),
            home_owner_name: Some("H. Owner".to_string()),
            away_team_name: Some("Away".to_string()),
            away_owner_name: Some("A. Owner".to_string()),
        };
        let home = schedule_entry("h", &m);
        assert!(home.is_home);
        assert_eq!(home.opponent_name.as_deref(), Some("Away"));
        assert_eq!(home.result, "W");

        let away = schedule_entry("a", &m);
        assert!(!away.is_home);
        assert_eq!(away.opponent_id, "h");
        assert_eq!(away.team_score, 95.5);
        assert_eq!(away.result, "L");
    }

    #[test]
    fn roster_splits_starters_and_counts_positions() {
        let resp = split_roster(
            "t1".to_string(),
            vec![
                roster_player("QB1", "QB", 1),
                roster_player("RB1", "RB", 1),
                roster_player("RB2", "RB", 0),
            ],
        );
        assert_eq!(resp.total_players, 3);
        assert_eq!(resp.roster_composition.starting_players, 2);
        assert_eq!(resp.roster_composition.bench_players, 1);
        assert_eq!(resp.position_counts.get("RB"), Some(&2));
        assert_eq!(resp.bench[0].player.name, "RB2");
    }
}
