use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::health::{get_health, HealthState};
use crate::api::{analytics, matchups, players, teams, trades, waivers};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub health: Arc<HealthState>,
    /// Reported by /health.
    pub db_path: String,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        // teams
        .route("/api/teams", get(teams::get_teams))
        .route("/api/teams-with-players", get(teams::get_teams_with_players))
        .route("/api/teams/standings", get(teams::get_standings))
        .route("/api/teams/:id", get(teams::get_team))
        .route("/api/teams/:id/roster", get(teams::get_team_roster))
        .route("/api/teams/:id/schedule", get(teams::get_team_schedule))
        // players
        .route("/api/players", get(players::get_players))
        .route("/api/players/available", get(players::get_available_players))
        .route("/api/players/rankings", get(players::get_rankings))
        .route("/api/players/compare", post(players::compare_players))
        .route("/api/players/:id", get(players::get_player))
        .route("/api/players/:id/projections", get(players::get_player_projections))
        // matchups
        .route("/api/matchups", get(matchups::get_matchups))
        .route("/api/matchups/week/:week", get(matchups::get_week_matchups))
        .route("/api/matchups/:id", get(matchups::get_matchup))
        // trades
        .route(
            "/api/trades/proposals",
            get(trades::get_proposals).post(trades::create_proposal),
        )
        .route("/api/trades/analyze", post(trades::analyze_trade))
        // analytics
        .route("/api/analytics/league", get(analytics::get_league_analytics))
        .route("/api/analytics/positional", get(analytics::get_positional_analytics))
        .route("/api/analytics/optimal-lineups", get(analytics::get_optimal_lineups))
        // waivers
        .route("/api/waivers/recommendations", get(waivers::get_recommendations))
        .route("/api/waivers/priority", get(waivers::get_priority))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::test_pool;
    use crate::etl::fixtures::{player, two_team_league};
    use crate::etl::run_etl;
    use crate::source::{MemorySource, SourceMatchup};
    use crate::types::Platform;

    /// Two-team league with one free agent (id 20, "Free Guy") and a week 1
    /// result. Returns the router and the pool behind it.
    async fn app() -> (Router, sqlx::SqlitePool) {
        let pool = test_pool().await;
        let source = MemorySource::new(Platform::Espn, two_team_league())
            .with_week(
                1,
                vec![SourceMatchup {
                    home_team_id: Some(1),
                    away_team_id: Some(2),
                    home_score: Some(100.0),
                    away_score: Some(80.0),
                    ..SourceMatchup::default()
                }],
            )
            .with_free_agents(vec![player(20, "Free Guy", "WR")]);
        run_etl(&source, 42, 2024, &pool).await.unwrap();

        let state = ApiState {
            pool: pool.clone(),
            health: Arc::new(HealthState::new()),
            db_path: "memory".to_string(),
        };
        (router(state), pool)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        call(app, Method::GET, uri, None).await
    }

    async fn team_id(pool: &sqlx::SqlitePool, platform_id: &str) -> String {
        sqlx::query_scalar("SELECT id FROM fantasy_teams WHERE platform_team_id = ?")
            .bind(platform_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn player_id(pool: &sqlx::SqlitePool, espn_id: &str) -> String {
        sqlx::query_scalar("SELECT id FROM players WHERE espn_id = ?")
            .bind(espn_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let (app, _) = app().await;
        let (status, body) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "memory");
    }

    #[tokio::test]
    async fn standings_are_ranked() {
        let (app, _) = app().await;
        let (status, body) = get(&app, "/api/teams/standings").await;
        assert_eq!(status, StatusCode::OK);
        let standings = body["standings"].as_array().unwrap();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0]["team_name"], "Alpha");
        assert_eq!(standings[0]["rank"], 1);
        assert_eq!(standings[0]["win_percentage"], 1.0);
    }

    #[tokio::test]
    async fn unknown_team_is_404_with_detail() {
        let (app, _) = app().await;
        let (status, body) = get(&app, "/api/teams/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Team not found");

        let (status, _) = get(&app, "/api/teams/nope/schedule").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn team_detail_roster_and_schedule() {
        let (app, pool) = app().await;
        let alpha = team_id(&pool, "1").await;

        let (status, body) = get(&app, &format!("/api/teams/{alpha}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["team"]["roster"][0]["name"], "A");
        assert_eq!(body["team"]["roster"][0]["roster_position"], "QB");

        let (_, body) = get(&app, &format!("/api/teams/{alpha}/roster")).await;
        assert_eq!(body["total_players"], 1);
        assert_eq!(body["starting_lineup"].as_array().unwrap().len(), 1);
        assert_eq!(body["position_counts"]["QB"], 1);

        let (_, body) = get(&app, &format!("/api/teams/{alpha}/schedule")).await;
        assert_eq!(body["team_name"], "Alpha");
        assert_eq!(body["schedule"][0]["result"], "W");
        assert_eq!(body["schedule"][0]["opponent_name"], "Beta");
    }

    #[tokio::test]
    async fn players_and_availability() {
        let (app, pool) = app().await;
        let (_, body) = get(&app, "/api/players").await;
        assert_eq!(body["players"].as_array().unwrap().len(), 2);

        let (_, body) = get(&app, "/api/players?position=wr").await;
        assert_eq!(body["players"][0]["name"], "Free Guy");

        let (_, body) = get(&app, "/api/players/available").await;
        assert_eq!(body["total_available"], 1);
        assert_eq!(body["available_by_position"]["WR"][0]["name"], "Free Guy");

        let a = player_id(&pool, "10").await;
        let (_, body) = get(&app, &format!("/api/players/{a}")).await;
        assert_eq!(body["player"]["fantasy_team"]["team_name"], "Alpha");

        let (status, _) = get(&app, "/api/players/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn matchups_by_week_and_detail() {
        let (app, _) = app().await;
        let (_, body) = get(&app, "/api/matchups").await;
        assert_eq!(body["total_matchups"], 1);
        assert_eq!(body["matchups_by_week"]["1"].as_array().unwrap().len(), 1);
        let id = body["matchups"][0]["id"].as_str().unwrap().to_string();

        let (_, body) = get(&app, "/api/matchups/week/1").await;
        assert_eq!(body["total_matchups"], 1);

        let (status, _) = get(&app, "/api/matchups/week/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = get(&app, &format!("/api/matchups/{id}")).await;
        assert_eq!(body["matchup"]["home_team_name"], "Alpha");
        assert_eq!(body["matchup"]["home_roster"].as_array().unwrap().len(), 1);
        assert!(body["matchup"]["away_roster"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn trade_proposal_lifecycle() {
        let (app, pool) = app().await;
        let alpha = team_id(&pool, "1").await;
        let beta = team_id(&pool, "2").await;
        let a = player_id(&pool, "10").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/trades/proposals",
            Some(json!({ "proposing_team_id": alpha, "receiving_team_id": "ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid team IDs");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/trades/proposals",
            Some(json!({ "proposing_team_id": alpha, "receiving_team_id": alpha })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "A team cannot trade with itself");

        // Player A belongs to Alpha, not Beta.
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/trades/proposals",
            Some(json!({
                "proposing_team_id": beta,
                "receiving_team_id": alpha,
                "proposing_players": [a],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/trades/proposals",
            Some(json!({
                "proposing_team_id": alpha,
                "receiving_team_id": beta,
                "proposing_players": [a],
                "notes": "QB for depth",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "created");

        let (_, body) = get(&app, "/api/trades/proposals").await;
        assert_eq!(body["total_proposals"], 1);
        let proposal = &body["proposals"][0];
        assert_eq!(proposal["status"], "Pending");
        assert_eq!(proposal["proposing_team_name"], "Alpha");
        assert_eq!(proposal["trade_items"][0]["player_name"], "A");
        assert!(proposal["analysis"].is_null());
    }

    #[tokio::test]
    async fn trade_analysis_uses_rankings() {
        let (app, pool) = app().await;
        let alpha = team_id(&pool, "1").await;
        let beta = team_id(&pool, "2").await;
        let a = player_id(&pool, "10").await;
        let fa = player_id(&pool, "20").await;

        sqlx::query(
            "INSERT INTO player_rankings (id, player_id, position, source, rank) VALUES ('r1', ?, 'QB', 'test', 10)",
        )
        .bind(&a)
        .execute(&pool)
        .await
        .unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/trades/analyze",
            Some(json!({
                "proposing_team_id": alpha,
                "receiving_team_id": beta,
                "proposing_players": [a],
                "receiving_players": [fa],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let analysis = &body["analysis"];
        assert_eq!(analysis["proposing_team_value"], 190);
        assert_eq!(analysis["receiving_team_value"], 100);
        assert_eq!(analysis["trade_balance"], "Unbalanced");
        assert_eq!(analysis["proposing_players_details"][0]["rank"], 10);
    }

    #[tokio::test]
    async fn analytics_views() {
        let (app, _) = app().await;
        let (_, body) = get(&app, "/api/analytics/league").await;
        let analytics = &body["analytics"];
        assert_eq!(analytics["league"]["league_name"], "Test League");
        assert_eq!(analytics["league_summary"]["total_teams"], 2);
        assert_eq!(analytics["highest_scoring_team"], "Alpha");

        let (_, body) = get(&app, "/api/analytics/positional").await;
        let rows = body["positional_analysis"].as_array().unwrap();
        let qb = rows.iter().find(|r| r["position"] == "QB").unwrap();
        assert_eq!(qb["rostered_players"], 1);
        assert_eq!(qb["scarcity_rating"], "High");
        let wr = rows.iter().find(|r| r["position"] == "WR").unwrap();
        assert_eq!(wr["available_players"], 1);
    }

    async fn add_projection(pool: &sqlx::SqlitePool, id: &str, player: &str, week: i64, points: f64) {
        sqlx::query(
            "INSERT INTO player_projections (id, player_id, week, season_year, source, projected_fantasy_points) \
             VALUES (?, ?, ?, 2024, 'test', ?)",
        )
        .bind(id)
        .bind(player)
        .bind(week)
        .bind(points)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn add_ranking(pool: &sqlx::SqlitePool, id: &str, player: &str, position: &str, rank: i64, week: i64) {
        sqlx::query(
            "INSERT INTO player_rankings (id, player_id, position, source, rank, week) VALUES (?, ?, ?, 'test', ?, ?)",
        )
        .bind(id)
        .bind(player)
        .bind(position)
        .bind(rank)
        .bind(week)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn teams_with_players_sorted_by_points() {
        let (app, _) = app().await;
        let (status, body) = get(&app, "/api/teams-with-players").await;
        assert_eq!(status, StatusCode::OK);
        let teams = body["teams"].as_array().unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0]["team_name"], "Alpha");
        assert_eq!(teams[0]["player_count"], 1);
        assert_eq!(teams[0]["players"][0]["name"], "A");
        assert_eq!(teams[0]["roster_composition"]["QB"], 1);
        assert_eq!(teams[1]["team_name"], "Beta");
        assert_eq!(teams[1]["player_count"], 0);
    }

    #[tokio::test]
    async fn rankings_filter_by_position_and_week() {
        let (app, pool) = app().await;
        let a = player_id(&pool, "10").await;
        let fa = player_id(&pool, "20").await;
        add_ranking(&pool, "r1", &a, "QB", 3, 1).await;
        add_ranking(&pool, "r2", &fa, "WR", 7, 1).await;
        add_ranking(&pool, "r3", &fa, "WR", 5, 2).await;

        let (status, body) = get(&app, "/api/players/rankings").await;
        assert_eq!(status, StatusCode::OK);
        let ranks: Vec<i64> = body["rankings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["rank"].as_i64().unwrap())
            .collect();
        assert_eq!(ranks, vec![3, 5, 7]);
        assert_eq!(body["rankings"][0]["name"], "A");
        assert_eq!(body["rankings"][0]["player_position"], "QB");
        assert_eq!(body["rankings_by_position"]["WR"].as_array().unwrap().len(), 2);

        let (_, body) = get(&app, "/api/players/rankings?position=wr&week=1").await;
        assert_eq!(body["rankings"].as_array().unwrap().len(), 1);
        assert_eq!(body["rankings"][0]["id"], "r2");
        assert_eq!(body["filters"]["position"], "WR");
        assert_eq!(body["filters"]["week"], 1);
    }

    #[tokio::test]
    async fn compare_needs_two_known_players() {
        let (app, pool) = app().await;
        let a = player_id(&pool, "10").await;
        let fa = player_id(&pool, "20").await;
        add_projection(&pool, "pp1", &a, 1, 18.0).await;
        add_projection(&pool, "pp2", &a, 2, 21.0).await;
        add_ranking(&pool, "r1", &fa, "WR", 12, 1).await;

        let (status, body) = call(&app, Method::POST, "/api/players/compare", Some(json!([a]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Must provide at least 2 player IDs");

        let (status, body) =
            call(&app, Method::POST, "/api/players/compare", Some(json!([a, "missing"]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Could not find enough valid players to compare");

        let (status, body) =
            call(&app, Method::POST, "/api/players/compare", Some(json!([a, "missing", fa]))).await;
        assert_eq!(status, StatusCode::OK);
        let comparison = body["comparison"].as_array().unwrap();
        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison[0]["name"], "A");
        assert_eq!(comparison[0]["recent_projections"][0]["week"], 2);
        assert_eq!(comparison[0]["recent_projections"].as_array().unwrap().len(), 2);
        assert_eq!(comparison[1]["rankings"][0]["rank"], 12);
        assert_eq!(body["comparison_summary"]["total_players"], 2);
        assert_eq!(body["comparison_summary"]["positions"], json!(["QB", "WR"]));
    }

    #[tokio::test]
    async fn player_projections_by_week() {
        let (app, pool) = app().await;
        let a = player_id(&pool, "10").await;
        add_projection(&pool, "pp1", &a, 1, 18.0).await;
        add_projection(&pool, "pp2", &a, 2, 21.0).await;

        let (status, body) = get(&app, &format!("/api/players/{a}/projections")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["player_name"], "A");
        assert_eq!(body["total_projections"], 2);
        assert_eq!(body["projections"][0]["week"], 2);

        let (_, body) = get(&app, &format!("/api/players/{a}/projections?week=1")).await;
        assert_eq!(body["total_projections"], 1);
        assert_eq!(body["projections"][0]["projected_fantasy_points"], 18.0);

        let (status, body) = get(&app, "/api/players/nope/projections").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Player not found");
    }

    #[tokio::test]
    async fn optimal_lineups_per_team() {
        let (app, pool) = app().await;
        let a = player_id(&pool, "10").await;
        add_projection(&pool, "pp1", &a, 1, 18.0).await;
        add_projection(&pool, "pp2", &a, 2, 21.0).await;

        let (status, body) = get(&app, "/api/analytics/optimal-lineups").await;
        assert_eq!(status, StatusCode::OK);
        let lineups = body["optimal_lineups"].as_array().unwrap();
        assert_eq!(lineups.len(), 2);
        let alpha = lineups.iter().find(|l| l["team_name"] == "Alpha").unwrap();
        assert_eq!(alpha["optimal_lineup"]["QB"]["name"], "A");
        assert_eq!(alpha["optimal_lineup"]["QB"]["projected_fantasy_points"], 21.0);
        assert!(alpha["bench_players"].as_array().unwrap().is_empty());
        let beta = lineups.iter().find(|l| l["team_name"] == "Beta").unwrap();
        assert!(beta["optimal_lineup"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn waiver_views() {
        let (app, pool) = app().await;
        let (_, body) = get(&app, "/api/waivers/recommendations").await;
        assert_eq!(body["total_recommendations"], 0);

        let fa = player_id(&pool, "20").await;
        sqlx::query(
            "INSERT INTO player_projections (id, player_id, week, season_year, source, projected_fantasy_points) \
             VALUES ('pp1', ?, 1, 2024, 'test', 12.5)",
        )
        .bind(&fa)
        .execute(&pool)
        .await
        .unwrap();
        let alpha = team_id(&pool, "1").await;
        sqlx::query(
            "INSERT INTO waiver_priorities (id, fantasy_team_id, priority_order, season_year) VALUES ('w1', ?, 1, 2024)",
        )
        .bind(&alpha)
        .execute(&pool)
        .await
        .unwrap();

        let (_, body) = get(&app, "/api/waivers/recommendations").await;
        assert_eq!(body["total_recommendations"], 1);
        assert_eq!(body["recommendations"][0]["projected_fantasy_points"], 12.5);
        assert_eq!(body["recommendations_by_position"]["WR"][0]["name"], "Free Guy");

        let (_, body) = get(&app, "/api/waivers/priority").await;
        assert_eq!(body["total_teams"], 1);
        assert_eq!(body["waiver_order"][0]["team_name"], "Alpha");
    }
}
