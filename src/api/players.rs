use std::collections::{BTreeMap, BTreeSet};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::api::routes::ApiState;
use crate::db::models::{
    PlayerRankingRow, PlayerRow, PlayerTeamRow, ProjectionRow, RankingRow, PLAYER_COLUMNS,
    PLAYER_JOIN,
};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct PlayersQuery {
    pub position: Option<String>,
}

#[derive(Serialize)]
pub struct PlayersResponse {
    pub players: Vec<PlayerRow>,
}

#[derive(Serialize)]
pub struct AvailablePlayersResponse {
    pub available_players: Vec<PlayerRow>,
    pub available_by_position: BTreeMap<String, Vec<PlayerRow>>,
    pub total_available: usize,
}

#[derive(Serialize)]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub player: PlayerRow,
    pub fantasy_team: Option<PlayerTeamRow>,
}

#[derive(Serialize)]
pub struct PlayerDetailResponse {
    pub player: PlayerDetail,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RankingsQuery {
    pub position: Option<String>,
    pub week: Option<u32>,
}

#[derive(Serialize)]
pub struct RankingsResponse {
    pub rankings: Vec<PlayerRankingRow>,
    pub rankings_by_position: BTreeMap<String, Vec<PlayerRankingRow>>,
    pub filters: RankingsQuery,
}

#[derive(Deserialize)]
pub struct WeekQuery {
    pub week: Option<u32>,
}

#[derive(Serialize)]
pub struct ProjectionsResponse {
    pub player_id: String,
    pub player_name: String,
    pub projections: Vec<ProjectionRow>,
    pub total_projections: usize,
}

#[derive(Debug, Serialize)]
pub struct ComparedPlayer {
    #[serde(flatten)]
    pub player: PlayerRow,
    pub recent_projections: Vec<ProjectionRow>,
    pub rankings: Vec<RankingRow>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total_players: usize,
    pub positions: Vec<String>,
    pub teams: Vec<String>,
}

#[derive(Serialize)]
pub struct ComparisonResponse {
    pub comparison: Vec<ComparedPlayer>,
    pub comparison_summary: ComparisonSummary,
}

const RANKING_COLUMNS: &str = r#"
    pr.id, pr.player_id, pr.position, pr.source, pr.rank, pr.week,
    pr.season_year, pr.tier, pr.notes, pr.created_at
"#;

const PROJECTION_SELECT: &str = r#"
    SELECT id, player_id, week, season_year, source, projected_fantasy_points,
           projected_passing_yards, projected_passing_touchdowns,
           projected_rushing_yards, projected_rushing_touchdowns,
           projected_receiving_yards, projected_receiving_touchdowns,
           projected_receptions, confidence_rating, created_at
    FROM player_projections
"#;

/// Projections kept per player in a comparison.
const COMPARE_PROJECTIONS: i64 = 5;
const COMPARE_RANKINGS: i64 = 3;

/// Groups rows by position, keeping at most `cap` per position when given.
pub fn group_by_position<T: Clone>(
    rows: &[T],
    position: impl Fn(&T) -> &str,
    cap: Option<usize>,
) -> BTreeMap<String, Vec<T>> {
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        let group = groups.entry(position(row).to_string()).or_default();
        if cap.map_or(true, |c| group.len() < c) {
            group.push(row.clone());
        }
    }
    groups
}

/// Distinct positions and NFL team names across the compared players, sorted.
pub fn comparison_summary(players: &[ComparedPlayer]) -> ComparisonSummary {
    let positions: BTreeSet<&str> = players.iter().map(|p| p.player.position.as_str()).collect();
    let teams: BTreeSet<&str> = players
        .iter()
        .filter_map(|p| p.player.nfl_team_name.as_deref())
        .collect();
    ComparisonSummary {
        total_players: players.len(),
        positions: positions.into_iter().map(str::to_string).collect(),
        teams: teams.into_iter().map(str::to_string).collect(),
    }
}

async fn fetch_player(pool: &SqlitePool, player_id: &str) -> Result<Option<PlayerRow>, AppError> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players p {PLAYER_JOIN} WHERE p.id = ?");
    let player = sqlx::query_as::<_, PlayerRow>(&sql)
        .bind(player_id)
        .fetch_optional(pool)
        .await?;
    Ok(player)
}

pub async fn get_players(
    State(state): State<ApiState>,
    Query(params): Query<PlayersQuery>,
) -> Result<Json<PlayersResponse>, AppError> {
    let sql = format!(
        r#"
        SELECT {PLAYER_COLUMNS}
        FROM players p
        {PLAYER_JOIN}
        WHERE ?1 IS NULL OR p.position = ?1
        ORDER BY p.name
        "#
    );
    let position = params.position.map(|p| p.to_ascii_uppercase());
    let players = sqlx::query_as::<_, PlayerRow>(&sql)
        .bind(position)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(PlayersResponse { players }))
}

/// Active players on no fantasy roster.
pub async fn get_available_players(
    State(state): State<ApiState>,
) -> Result<Json<AvailablePlayersResponse>, AppError> {
    let sql = format!(
        r#"
        SELECT {PLAYER_COLUMNS}
        FROM players p
        {PLAYER_JOIN}
        LEFT JOIN roster_entries re ON re.player_id = p.id
        WHERE re.player_id IS NULL AND p.is_active = 1
        ORDER BY p.position, p.name
        "#
    );
    let players = sqlx::query_as::<_, PlayerRow>(&sql)
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(AvailablePlayersResponse {
        available_by_position: group_by_position(&players, |p| p.position.as_str(), None),
        total_available: players.len(),
        available_players: players,
    }))
}

pub async fn get_player(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerDetailResponse>, AppError> {
    let player = fetch_player(&state.pool, &player_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;

    let fantasy_team = sqlx::query_as::<_, PlayerTeamRow>(
        r#"
        SELECT ft.id AS fantasy_team_id, ft.team_name, ft.owner_name,
               re.is_starting, re.acquisition_type, re.acquired_date
        FROM roster_entries re
        JOIN fantasy_teams ft ON ft.id = re.fantasy_team_id
        WHERE re.player_id = ?
        "#,
    )
    .bind(&player_id)
    .fetch_optional(&state.pool)
    .await?;

    Ok(Json(PlayerDetailResponse {
        player: PlayerDetail {
            player,
            fantasy_team,
        },
    }))
}

/// Rankings ordered by position then rank, optionally filtered.
pub async fn get_rankings(
    State(state): State<ApiState>,
    Query(filters): Query<RankingsQuery>,
) -> Result<Json<RankingsResponse>, AppError> {
    let sql = format!(
        r#"
        SELECT {RANKING_COLUMNS},
               p.name, p.position AS player_position,
               nt.team_name AS nfl_team_name, nt.team_code AS nfl_team_code
        FROM player_rankings pr
        JOIN players p ON p.id = pr.player_id
        {PLAYER_JOIN}
        WHERE (?1 IS NULL OR pr.position = ?1)
          AND (?2 IS NULL OR pr.week = ?2)
        ORDER BY pr.position, pr.rank
        "#
    );
    let filters = RankingsQuery {
        position: filters.position.map(|p| p.to_ascii_uppercase()),
        week: filters.week,
    };
    let rankings = sqlx::query_as::<_, PlayerRankingRow>(&sql)
        .bind(&filters.position)
        .bind(filters.week.map(i64::from))
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(RankingsResponse {
        rankings_by_position: group_by_position(&rankings, |r| r.ranking.position.as_str(), None),
        rankings,
        filters,
    }))
}

/// Side-by-side view of players with their latest projections and rankings.
/// Unknown ids are left out; fewer than two known players is a 400.
pub async fn compare_players(
    State(state): State<ApiState>,
    Json(player_ids): Json<Vec<String>>,
) -> Result<Json<ComparisonResponse>, AppError> {
    if player_ids.len() < 2 {
        return Err(AppError::BadRequest("Must provide at least 2 player IDs".to_string()));
    }

    let mut comparison = Vec::with_capacity(player_ids.len());
    for player_id in &player_ids {
        let Some(player) = fetch_player(&state.pool, player_id).await? else {
            continue;
        };
        let recent_projections = sqlx::query_as::<_, ProjectionRow>(&format!(
            "{PROJECTION_SELECT} WHERE player_id = ? ORDER BY week DESC, created_at DESC LIMIT ?"
        ))
        .bind(player_id)
        .bind(COMPARE_PROJECTIONS)
        .fetch_all(&state.pool)
        .await?;
        let rankings = sqlx::query_as::<_, RankingRow>(&format!(
            "SELECT {RANKING_COLUMNS} FROM player_rankings pr \
             WHERE pr.player_id = ? ORDER BY pr.created_at DESC LIMIT ?"
        ))
        .bind(player_id)
        .bind(COMPARE_RANKINGS)
        .fetch_all(&state.pool)
        .await?;

        comparison.push(ComparedPlayer {
            player,
            recent_projections,
            rankings,
        });
    }

    if comparison.len() < 2 {
        return Err(AppError::BadRequest(
            "Could not find enough valid players to compare".to_string(),
        ));
    }

    Ok(Json(ComparisonResponse {
        comparison_summary: comparison_summary(&comparison),
        comparison,
    }))
}

pub async fn get_player_projections(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<WeekQuery>,
) -> Result<Json<ProjectionsResponse>, AppError> {
    let player = fetch_player(&state.pool, &player_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;

    let projections = sqlx::query_as::<_, ProjectionRow>(&format!(
        "{PROJECTION_SELECT} WHERE player_id = ?1 AND (?2 IS NULL OR week = ?2) \
         ORDER BY week DESC, created_at DESC"
    ))
    .bind(&player_id)
    .bind(params.week.map(i64::from))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ProjectionsResponse {
        player_id,
        player_name: player.name,
        total_projections: projections.len(),
        projections,
    }))
}
