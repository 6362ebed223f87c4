use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::api::routes::ApiState;
use crate::api::teams::{fetch_roster, RosterOrder};
use crate::config::MAX_WEEK;
use crate::db::models::{MatchupRow, RosterPlayerRow, MATCHUP_SELECT};
use crate::error::AppError;

#[derive(Serialize)]
pub struct MatchupsResponse {
    pub matchups: Vec<MatchupRow>,
    pub matchups_by_week: BTreeMap<i64, Vec<MatchupRow>>,
    pub total_matchups: usize,
}

#[derive(Serialize)]
pub struct WeekMatchupsResponse {
    pub week: u32,
    pub matchups: Vec<MatchupRow>,
    pub total_matchups: usize,
}

#[derive(Serialize)]
pub struct MatchupDetail {
    #[serde(flatten)]
    pub matchup: MatchupRow,
    pub home_roster: Vec<RosterPlayerRow>,
    pub away_roster: Vec<RosterPlayerRow>,
}

#[derive(Serialize)]
pub struct MatchupDetailResponse {
    pub matchup: MatchupDetail,
}

pub fn by_week(matchups: &[MatchupRow]) -> BTreeMap<i64, Vec<MatchupRow>> {
    let mut weeks: BTreeMap<i64, Vec<MatchupRow>> = BTreeMap::new();
    for m in matchups {
        weeks.entry(m.week).or_default().push(m.clone());
    }
    weeks
}

pub async fn get_matchups(
    State(state): State<ApiState>,
) -> Result<Json<MatchupsResponse>, AppError> {
    let matchups = sqlx::query_as::<_, MatchupRow>(&format!(
        "{MATCHUP_SELECT} ORDER BY m.week, m.created_at, m.rowid"
    ))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(MatchupsResponse {
        matchups_by_week: by_week(&matchups),
        total_matchups: matchups.len(),
        matchups,
    }))
}

pub async fn get_week_matchups(
    State(state): State<ApiState>,
    Path(week): Path<u32>,
) -> Result<Json<WeekMatchupsResponse>, AppError> {
    if week == 0 || week > MAX_WEEK {
        return Err(AppError::BadRequest(format!(
            "week must be between 1 and {MAX_WEEK}"
        )));
    }
    let matchups = sqlx::query_as::<_, MatchupRow>(&format!(
        "{MATCHUP_SELECT} WHERE m.week = ? ORDER BY m.created_at, m.rowid"
    ))
    .bind(i64::from(week))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(WeekMatchupsResponse {
        week,
        total_matchups: matchups.len(),
        matchups,
    }))
}

pub async fn get_matchup(
    State(state): State<ApiState>,
    Path(matchup_id): Path<String>,
) -> Result<Json<MatchupDetailResponse>, AppError> {
    let matchup = sqlx::query_as::<_, MatchupRow>(&format!("{MATCHUP_SELECT} WHERE m.id = ?"))
        .bind(&matchup_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Matchup not found".to_string()))?;

    let home_roster =
        fetch_roster(&state.pool, &matchup.home_team_id, RosterOrder::StartersFirst).await?;
    let away_roster =
        fetch_roster(&state.pool, &matchup.away_team_id, RosterOrder::StartersFirst).await?;

    Ok(Json(MatchupDetailResponse {
        matchup: MatchupDetail {
            matchup,
            home_roster,
            away_roster,
        },
    }))
}
