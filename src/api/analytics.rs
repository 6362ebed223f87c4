use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::routes::ApiState;
use crate::api::teams::{fetch_teams, TeamMetrics};
use crate::db::models::{
    LeagueRow, LineupPlayerRow, PositionStatsRow, TeamRow, PLAYER_COLUMNS, PLAYER_JOIN,
};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct LeagueSummary {
    pub total_teams: usize,
    pub total_active_players: usize,
    pub total_points_scored: f64,
    pub league_average_points: f64,
}

#[derive(Debug, Serialize)]
pub struct TeamMetricView {
    pub team_id: String,
    pub team_name: String,
    pub points_for: f64,
    pub points_against: f64,
    pub win_pct: f64,
    pub avg_points: f64,
}

#[derive(Debug, Serialize)]
pub struct LeagueAnalytics {
    pub league: Option<LeagueRow>,
    pub league_summary: LeagueSummary,
    pub position_distribution: BTreeMap<String, usize>,
    pub team_metrics: Vec<TeamMetricView>,
    pub highest_scoring_team: Option<String>,
    pub lowest_scoring_team: Option<String>,
}

#[derive(Serialize)]
pub struct LeagueAnalyticsResponse {
    pub analytics: LeagueAnalytics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalView {
    pub position: String,
    pub total_players: i64,
    pub rostered_players: i64,
    pub available_players: i64,
    pub starting_players: i64,
    pub roster_percentage: f64,
    pub scarcity_rating: &'static str,
}

#[derive(Serialize)]
pub struct PositionalResponse {
    pub positional_analysis: Vec<PositionalView>,
}

/// Bench players listed per team in the lineup view.
const BENCH_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
pub struct OptimalLineup {
    pub team_id: String,
    pub team_name: String,
    pub optimal_lineup: BTreeMap<String, LineupPlayerRow>,
    pub bench_players: Vec<LineupPlayerRow>,
}

#[derive(Serialize)]
pub struct OptimalLineupsResponse {
    pub optimal_lineups: Vec<OptimalLineup>,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Takes the first player seen at each position as the starter. Rows must be
/// ordered best projection first within a position.
pub fn optimal_lineup(
    roster: Vec<LineupPlayerRow>,
) -> (BTreeMap<String, LineupPlayerRow>, Vec<LineupPlayerRow>) {
    let mut lineup = BTreeMap::new();
    let mut bench = Vec::new();
    for row in roster {
        if lineup.contains_key(&row.player.position) {
            if bench.len() < BENCH_LIMIT {
                bench.push(row);
            }
        } else {
            lineup.insert(row.player.position.clone(), row);
        }
    }
    (lineup, bench)
}

pub fn league_analytics(
    league: Option<LeagueRow>,
    teams: &[TeamRow],
    active_positions: &[String],
) -> LeagueAnalytics {
    let total_points_scored: f64 = teams.iter().map(|t| t.points_for).sum();
    let league_average_points = if teams.is_empty() {
        0.0
    } else {
        total_points_scored / teams.len() as f64
    };

    let mut position_distribution = BTreeMap::new();
    for pos in active_positions {
        *position_distribution.entry(pos.clone()).or_insert(0) += 1;
    }

    let team_metrics = teams
        .iter()
        .map(|t| {
            let m = TeamMetrics::of(t);
            TeamMetricView {
                team_id: t.id.clone(),
                team_name: t.team_name.clone(),
                points_for: t.points_for,
                points_against: t.points_against,
                win_pct: m.win_percentage,
                avg_points: m.average_points_for,
            }
        })
        .collect();

    let highest_scoring_team = teams
        .iter()
        .max_by(|a, b| a.points_for.total_cmp(&b.points_for))
        .map(|t| t.team_name.clone());
    let lowest_scoring_team = teams
        .iter()
        .min_by(|a, b| a.points_for.total_cmp(&b.points_for))
        .map(|t| t.team_name.clone());

    LeagueAnalytics {
        league,
        league_summary: LeagueSummary {
            total_teams: teams.len(),
            total_active_players: active_positions.len(),
            total_points_scored,
            league_average_points,
        },
        position_distribution,
        team_metrics,
        highest_scoring_team,
        lowest_scoring_team,
    }
}

pub fn scarcity_rating(roster_percentage: f64) -> &'static str {
    if roster_percentage > 80.0 {
        "High"
    } else if roster_percentage > 60.0 {
        "Medium"
    } else {
        "Low"
    }
}

pub fn positional_view(s: PositionStatsRow) -> PositionalView {
    let roster_percentage = if s.total_players > 0 {
        s.rostered_players as f64 / s.total_players as f64 * 100.0
    } else {
        0.0
    };
    PositionalView {
        available_players: s.total_players - s.rostered_players,
        scarcity_rating: scarcity_rating(roster_percentage),
        roster_percentage,
        position: s.position,
        total_players: s.total_players,
        rostered_players: s.rostered_players,
        starting_players: s.starting_players,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn get_league_analytics(
    State(state): State<ApiState>,
) -> Result<Json<LeagueAnalyticsResponse>, AppError> {
    let league = sqlx::query_as::<_, LeagueRow>(
        r#"
        SELECT id, league_name, platform, platform_league_id, season_year,
               scoring_type, team_count, playoff_teams
        FROM league_config
        WHERE is_active = 1
        LIMIT 1
        "#,
    )
    .fetch_optional(&state.pool)
    .await?;
    let teams = fetch_teams(&state.pool).await?;
    let positions: Vec<String> =
        sqlx::query_scalar("SELECT position FROM players WHERE is_active = 1")
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(LeagueAnalyticsResponse {
        analytics: league_analytics(league, &teams, &positions),
    }))
}

pub async fn get_positional_analytics(
    State(state): State<ApiState>,
) -> Result<Json<PositionalResponse>, AppError> {
    let rows = sqlx::query_as::<_, PositionStatsRow>(
        r#"
        SELECT p.position,
               COUNT(*) AS total_players,
               COUNT(re.player_id) AS rostered_players,
               COUNT(CASE WHEN re.is_starting = 1 THEN 1 END) AS starting_players
        FROM players p
        LEFT JOIN roster_entries re ON re.player_id = p.id
        WHERE p.is_active = 1
        GROUP BY p.position
        ORDER BY p.position
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(PositionalResponse {
        positional_analysis: rows.into_iter().map(positional_view).collect(),
    }))
}

/// Best projected player per position for every team.
pub async fn get_optimal_lineups(
    State(state): State<ApiState>,
) -> Result<Json<OptimalLineupsResponse>, AppError> {
    let teams = fetch_teams(&state.pool).await?;
    let sql = format!(
        r#"
        SELECT {PLAYER_COLUMNS}, re.is_starting,
               (SELECT MAX(pp.projected_fantasy_points)
                FROM player_projections pp
                WHERE pp.player_id = p.id) AS projected_fantasy_points
        FROM roster_entries re
        JOIN players p ON p.id = re.player_id
        {PLAYER_JOIN}
        WHERE re.fantasy_team_id = ?
        ORDER BY p.position,
                 projected_fantasy_points IS NULL,
                 projected_fantasy_points DESC,
                 p.name
        "#
    );

    let mut optimal_lineups = Vec::with_capacity(teams.len());
    for team in teams {
        let roster = sqlx::query_as::<_, LineupPlayerRow>(&sql)
            .bind(&team.id)
            .fetch_all(&state.pool)
            .await?;
        let (optimal_lineup, bench_players) = optimal_lineup(roster);
        optimal_lineups.push(OptimalLineup {
            team_id: team.id,
            team_name: team.team_name,
            optimal_lineup,
            bench_players,
        });
    }

    Ok(Json(OptimalLineupsResponse { optimal_lineups }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PlayerRow;

    fn lineup_player(name: &str, position: &str, projected: Option<f64>) -> LineupPlayerRow {
        LineupPlayerRow {
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
            is_starting: 0,
            projected_fantasy_points: projected,
        }
    }

    fn team(name: &str, wins: i64, points_for: f64) -> TeamRow {
        TeamRow {
            id: name.to_lowercase(),
            owner_name: "O".to_string(),
            team_name: name.to_string(),
            platform_team_id: None,
            wins,
            losses: 2,
            ties: 0,
            points_for,
            points_against: 0.0,
        }
    }

    #[test]
    fn scarcity_thresholds() {
        assert_eq!(scarcity_rating(80.1), "High");
        assert_eq!(scarcity_rating(80.0), "Medium");
        assert_eq!(scarcity_rating(60.0), "Low");
    }

    #[test]
    fn positional_view_counts_available() {
        let v = positional_view(PositionStatsRow {
            position: "RB".to_string(),
            total_players: 10,
            rostered_players: 9,
            starting_players: 4,
        });
        assert_eq!(v.available_players, 1);
        assert!((v.roster_percentage - 90.0).abs() < 1e-9);
        assert_eq!(v.scarcity_rating, "High");
    }

    #[test]
    fn league_summary_and_extremes() {
        let teams = vec![team("Alpha", 2, 300.0), team("Beta", 1, 200.0)];
        let positions = vec!["QB".to_string(), "RB".to_string(), "RB".to_string()];
        let a = league_analytics(None, &teams, &positions);

        assert_eq!(a.league_summary.total_teams, 2);
        assert_eq!(a.league_summary.total_active_players, 3);
        assert!((a.league_summary.league_average_points - 250.0).abs() < 1e-9);
        assert_eq!(a.position_distribution.get("RB"), Some(&2));
        assert_eq!(a.highest_scoring_team.as_deref(), Some("Alpha"));
        assert_eq!(a.lowest_scoring_team.as_deref(), Some("Beta"));
        assert!((a.team_metrics[0].win_pct - 0.5).abs() < 1e-9);
    }

    #[test]
    fn lineup_takes_first_player_per_position() {
        let (lineup, bench) = optimal_lineup(vec![
            lineup_player("qb1", "QB", Some(22.0)),
            lineup_player("qb2", "QB", Some(15.0)),
            lineup_player("rb1", "RB", None),
        ]);
        assert_eq!(lineup.len(), 2);
        assert_eq!(lineup["QB"].player.name, "qb1");
        assert_eq!(lineup["RB"].player.name, "rb1");
        assert_eq!(bench.len(), 1);
        assert_eq!(bench[0].player.name, "qb2");
    }

    #[test]
    fn lineup_bench_is_capped() {
        let roster = (0..15)
            .map(|i| lineup_player(&format!("wr{i}"), "WR", Some(20.0 - i as f64)))
            .collect();
        let (lineup, bench) = optimal_lineup(roster);
        assert_eq!(lineup["WR"].player.name, "wr0");
        assert_eq!(bench.len(), BENCH_LIMIT);
    }

    #[test]
    fn empty_league() {
        let a = league_analytics(None, &[], &[]);
        assert_eq!(a.league_summary.league_average_points, 0.0);
        assert!(a.highest_scoring_team.is_none());
    }
}
