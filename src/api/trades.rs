use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::api::routes::ApiState;
use crate::db::models::{
    RankedPlayerRow, TradeAnalysisRow, TradeItemRow, TradeProposalRow, PLAYER_COLUMNS, PLAYER_JOIN,
};
use crate::error::AppError;
use crate::types::{new_id, TradeStatus};

/// Value of a player without a ranking.
const DEFAULT_RANK: i64 = 100;
const VALUE_CEILING: i64 = 200;
/// Value difference still considered balanced.
const BALANCE_TOLERANCE: i64 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    pub proposing_team_id: String,
    pub receiving_team_id: String,
    #[serde(default)]
    pub proposing_players: Vec<String>,
    #[serde(default)]
    pub receiving_players: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub proposal: TradeProposalRow,
    pub trade_items: Vec<TradeItemRow>,
    pub analysis: Option<TradeAnalysisRow>,
}

#[derive(Serialize)]
pub struct ProposalsResponse {
    pub proposals: Vec<ProposalView>,
    pub total_proposals: usize,
}

#[derive(Serialize)]
pub struct CreatedProposal {
    pub proposal_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TradeAnalysis {
    pub proposing_team_value: i64,
    pub receiving_team_value: i64,
    pub value_difference: i64,
    pub trade_balance: &'static str,
    pub proposing_players_details: Vec<RankedPlayerRow>,
    pub receiving_players_details: Vec<RankedPlayerRow>,
    pub recommendation: &'static str,
}

#[derive(Serialize)]
pub struct TradeAnalysisResponse {
    pub analysis: TradeAnalysis,
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

pub fn player_value(rank: Option<i64>) -> i64 {
    (VALUE_CEILING - rank.unwrap_or(DEFAULT_RANK)).max(0)
}

pub fn evaluate_trade(
    proposing: Vec<RankedPlayerRow>,
    receiving: Vec<RankedPlayerRow>,
) -> TradeAnalysis {
    let proposing_team_value: i64 = proposing.iter().map(|p| player_value(p.rank)).sum();
    let receiving_team_value: i64 = receiving.iter().map(|p| player_value(p.rank)).sum();
    let value_difference = (proposing_team_value - receiving_team_value).abs();
    let balanced = value_difference <= BALANCE_TOLERANCE;

    TradeAnalysis {
        proposing_team_value,
        receiving_team_value,
        value_difference,
        trade_balance: if balanced { "Balanced" } else { "Unbalanced" },
        proposing_players_details: proposing,
        receiving_players_details: receiving,
        recommendation: if balanced { "Accept" } else { "Consider carefully" },
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

async fn validate_teams(pool: &SqlitePool, req: &TradeRequest) -> Result<(), AppError> {
    if req.proposing_team_id == req.receiving_team_id {
        return Err(AppError::BadRequest("A team cannot trade with itself".to_string()));
    }
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fantasy_teams WHERE id IN (?, ?)")
        .bind(&req.proposing_team_id)
        .bind(&req.receiving_team_id)
        .fetch_one(pool)
        .await?;
    if found != 2 {
        return Err(AppError::BadRequest("Invalid team IDs".to_string()));
    }
    Ok(())
}

/// True when every id in `players` is rostered by `team_id`.
async fn all_on_roster(pool: &SqlitePool, team_id: &str, players: &[String]) -> Result<bool, AppError> {
    if players.is_empty() {
        return Ok(true);
    }
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(DISTINCT player_id) FROM roster_entries WHERE fantasy_team_id = ");
    qb.push_bind(team_id);
    qb.push(" AND player_id IN (");
    let mut sep = qb.separated(", ");
    for id in players {
        sep.push_bind(id);
    }
    sep.push_unseparated(")");

    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    let mut distinct = players.to_vec();
    distinct.sort();
    distinct.dedup();
    Ok(count == distinct.len() as i64)
}

async fn ranked_players(pool: &SqlitePool, ids: &[String]) -> Result<Vec<RankedPlayerRow>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        r#"
        SELECT {PLAYER_COLUMNS},
               (SELECT MIN(pr.rank) FROM player_rankings pr WHERE pr.player_id = p.id) AS rank,
               (SELECT pr.tier FROM player_rankings pr WHERE pr.player_id = p.id
                ORDER BY pr.rank LIMIT 1) AS tier
        FROM players p
        {PLAYER_JOIN}
        WHERE p.id IN (
        "#
    ));
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(id);
    }
    sep.push_unseparated(")");

    let rows = qb.build_query_as::<RankedPlayerRow>().fetch_all(pool).await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn get_proposals(
    State(state): State<ApiState>,
) -> Result<Json<ProposalsResponse>, AppError> {
    let proposals = sqlx::query_as::<_, TradeProposalRow>(
        r#"
        SELECT tp.id, tp.proposing_team_id, tp.receiving_team_id, tp.status,
               tp.proposed_date, tp.response_date, tp.notes,
               pt.team_name AS proposing_team_name, pt.owner_name AS proposing_owner,
               rt.team_name AS receiving_team_name, rt.owner_name AS receiving_owner
        FROM trade_proposals tp
        LEFT JOIN fantasy_teams pt ON pt.id = tp.proposing_team_id
        LEFT JOIN fantasy_teams rt ON rt.id = tp.receiving_team_id
        ORDER BY tp.proposed_date DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let mut views = Vec::with_capacity(proposals.len());
    for proposal in proposals {
        let trade_items = sqlx::query_as::<_, TradeItemRow>(
            r#"
            SELECT ti.id, ti.trade_proposal_id, ti.team_id, ti.player_id,
                   ti.draft_round, ti.draft_pick_year,
                   p.name AS player_name, p.position, ft.team_name
            FROM trade_items ti
            LEFT JOIN players p ON p.id = ti.player_id
            LEFT JOIN fantasy_teams ft ON ft.id = ti.team_id
            WHERE ti.trade_proposal_id = ?
            "#,
        )
        .bind(&proposal.id)
        .fetch_all(&state.pool)
        .await?;

        let analysis = sqlx::query_as::<_, TradeAnalysisRow>(
            r#"
            SELECT id, trade_proposal_id, team_a_value, team_b_value,
                   team_a_roster_improvement, team_b_roster_improvement, analysis_notes
            FROM trade_analysis
            WHERE trade_proposal_id = ?
            "#,
        )
        .bind(&proposal.id)
        .fetch_optional(&state.pool)
        .await?;

        views.push(ProposalView {
            proposal,
            trade_items,
            analysis,
        });
    }

    Ok(Json(ProposalsResponse {
        total_proposals: views.len(),
        proposals: views,
    }))
}

pub async fn create_proposal(
    State(state): State<ApiState>,
    Json(req): Json<TradeRequest>,
) -> Result<Json<CreatedProposal>, AppError> {
    validate_teams(&state.pool, &req).await?;
    if !all_on_roster(&state.pool, &req.proposing_team_id, &req.proposing_players).await? {
        return Err(AppError::BadRequest(
            "Some proposing players don't belong to proposing team".to_string(),
        ));
    }
    if !all_on_roster(&state.pool, &req.receiving_team_id, &req.receiving_players).await? {
        return Err(AppError::BadRequest(
            "Some receiving players don't belong to receiving team".to_string(),
        ));
    }

    let proposal_id = new_id();
    let mut tx = state.pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO trade_proposals (id, proposing_team_id, receiving_team_id, status, notes, proposed_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&proposal_id)
    .bind(&req.proposing_team_id)
    .bind(&req.receiving_team_id)
    .bind(TradeStatus::Pending.to_string())
    .bind(&req.notes)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    let sides = [
        (&req.proposing_team_id, &req.proposing_players),
        (&req.receiving_team_id, &req.receiving_players),
    ];
    for (team_id, players) in sides {
        for player_id in players {
            sqlx::query(
                "INSERT INTO trade_items (id, trade_proposal_id, team_id, player_id) VALUES (?, ?, ?, ?)",
            )
            .bind(new_id())
            .bind(&proposal_id)
            .bind(team_id)
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(proposal_id = %proposal_id, "Trade proposal created");

    Ok(Json(CreatedProposal {
        proposal_id,
        status: "created",
        message: "Trade proposal created successfully",
    }))
}

pub async fn analyze_trade(
    State(state): State<ApiState>,
    Json(req): Json<TradeRequest>,
) -> Result<Json<TradeAnalysisResponse>, AppError> {
    validate_teams(&state.pool, &req).await?;
    let proposing = ranked_players(&state.pool, &req.proposing_players).await?;
    let receiving = ranked_players(&state.pool, &req.receiving_players).await?;
    Ok(Json(TradeAnalysisResponse {
        analysis: evaluate_trade(proposing, receiving),
    }))
}
