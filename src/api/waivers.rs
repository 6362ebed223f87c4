use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::players::group_by_position;
use crate::api::routes::ApiState;
use crate::db::models::{WaiverCandidateRow, WaiverPriorityRow, PLAYER_COLUMNS, PLAYER_JOIN};
use crate::error::AppError;

const MAX_RECOMMENDATIONS: i64 = 50;
const PER_POSITION: usize = 10;

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<WaiverCandidateRow>,
    pub recommendations_by_position: BTreeMap<String, Vec<WaiverCandidateRow>>,
    pub total_recommendations: usize,
}

#[derive(Serialize)]
pub struct PriorityResponse {
    pub waiver_order: Vec<WaiverPriorityRow>,
    pub total_teams: usize,
}

/// Unrostered active players that carry a ranking or a projection, best
/// rank first, then highest projection.
pub async fn get_recommendations(
    State(state): State<ApiState>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let sql = format!(
        r#"
        WITH candidates AS (
            SELECT {PLAYER_COLUMNS},
                   (SELECT MIN(pr.rank) FROM player_rankings pr WHERE pr.player_id = p.id) AS rank,
                   (SELECT pr.tier FROM player_rankings pr WHERE pr.player_id = p.id
                    ORDER BY pr.rank LIMIT 1) AS tier,
                   (SELECT MAX(pp.projected_fantasy_points) FROM player_projections pp
                    WHERE pp.player_id = p.id) AS projected_fantasy_points
            FROM players p
            {PLAYER_JOIN}
            LEFT JOIN roster_entries re ON re.player_id = p.id
            WHERE re.player_id IS NULL AND p.is_active = 1
        )
        SELECT * FROM candidates
        WHERE rank IS NOT NULL OR projected_fantasy_points IS NOT NULL
        ORDER BY rank ASC NULLS LAST, projected_fantasy_points DESC NULLS LAST
        LIMIT ?
        "#
    );
    let recommendations = sqlx::query_as::<_, WaiverCandidateRow>(&sql)
        .bind(MAX_RECOMMENDATIONS)
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(RecommendationsResponse {
        recommendations_by_position: group_by_position(
            &recommendations,
            |r| r.player.position.as_str(),
            Some(PER_POSITION),
        ),
        total_recommendations: recommendations.len(),
        recommendations,
    }))
}

pub async fn get_priority(
    State(state): State<ApiState>,
) -> Result<Json<PriorityResponse>, AppError> {
    let waiver_order = sqlx::query_as::<_, WaiverPriorityRow>(
        r#"
        SELECT wp.id, wp.fantasy_team_id, wp.priority_order, wp.season_year,
               ft.team_name, ft.owner_name
        FROM waiver_priorities wp
        JOIN fantasy_teams ft ON ft.id = wp.fantasy_team_id
        ORDER BY wp.priority_order
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(PriorityResponse {
        total_teams: waiver_order.len(),
        waiver_order,
    }))
}
