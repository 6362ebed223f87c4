//! Row types read by the query service.

use serde::Serialize;

/// Player columns plus the NFL team join. Pair with [`PLAYER_JOIN`].
pub const PLAYER_COLUMNS: &str = r#"
    p.id, p.espn_id, p.name, p.position, p.nfl_team_id, p.jersey_number,
    p.height, p.weight, p.age, p.experience_years, p.college,
    p.is_active, p.is_injured, p.injury_status,
    nt.team_name AS nfl_team_name, nt.team_code AS nfl_team_code
"#;

pub const PLAYER_JOIN: &str = "LEFT JOIN nfl_teams nt ON nt.id = p.nfl_team_id";

/// Sort key QB, RB, WR, TE, K, DEF, then everything else.
pub const POSITION_ORDER: &str = r#"
    CASE p.position
        WHEN 'QB' THEN 1 WHEN 'RB' THEN 2 WHEN 'WR' THEN 3
        WHEN 'TE' THEN 4 WHEN 'K' THEN 5 WHEN 'DEF' THEN 6
        ELSE 7
    END
"#;

pub const MATCHUP_SELECT: &str = r#"
    SELECT m.id, m.week, m.home_team_id, m.away_team_id, m.home_score, m.away_score,
           m.winner_id, m.is_playoff,
           ht.team_name AS home_team_name, ht.owner_name AS home_owner_name,
           at.team_name AS away_team_name, at.owner_name AS away_owner_name
    FROM fantasy_matchups m
    LEFT JOIN fantasy_teams ht ON ht.id = m.home_team_id
    LEFT JOIN fantasy_teams at ON at.id = m.away_team_id
"#;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeamRow {
    pub id: String,
    pub owner_name: String,
    pub team_name: String,
    pub platform_team_id: Option<String>,
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
    pub points_for: f64,
    pub points_against: f64,
}

impl TeamRow {
    pub fn total_games(&self) -> i64 {
        self.wins + self.losses + self.ties
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: String,
    pub espn_id: Option<String>,
    pub name: String,
    pub position: String,
    pub nfl_team_id: Option<String>,
    pub jersey_number: Option<i64>,
    pub height: Option<String>,
    pub weight: Option<i64>,
    pub age: Option<i64>,
    pub experience_years: Option<i64>,
    pub college: Option<String>,
    pub is_active: i64,
    pub is_injured: i64,
    pub injury_status: Option<String>,
    pub nfl_team_name: Option<String>,
    pub nfl_team_code: Option<String>,
}

/// A player as seen on a fantasy roster.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RosterPlayerRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub player: PlayerRow,
    pub roster_position: Option<String>,
    pub is_starting: i64,
    pub acquisition_type: Option<String>,
    pub acquired_date: Option<String>,
}

/// Fantasy team holding a player.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlayerTeamRow {
    pub fantasy_team_id: String,
    pub team_name: String,
    pub owner_name: String,
    pub is_starting: i64,
    pub acquisition_type: Option<String>,
    pub acquired_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MatchupRow {
    pub id: String,
    pub week: i64,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_score: f64,
    pub away_score: f64,
    pub winner_id: Option<String>,
    pub is_playoff: i64,
    pub home_team_name: Option<String>,
    pub home_owner_name: Option<String>,
    pub away_team_name: Option<String>,
    pub away_owner_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TradeProposalRow {
    pub id: String,
    pub proposing_team_id: String,
    pub receiving_team_id: String,
    pub status: String,
    pub proposed_date: String,
    pub response_date: Option<String>,
    pub notes: Option<String>,
    pub proposing_team_name: Option<String>,
    pub proposing_owner: Option<String>,
    pub receiving_team_name: Option<String>,
    pub receiving_owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TradeItemRow {
    pub id: String,
    pub trade_proposal_id: String,
    pub team_id: String,
    pub player_id: Option<String>,
    pub draft_round: Option<i64>,
    pub draft_pick_year: Option<i64>,
    pub player_name: Option<String>,
    pub position: Option<String>,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TradeAnalysisRow {
    pub id: String,
    pub trade_proposal_id: String,
    pub team_a_value: Option<f64>,
    pub team_b_value: Option<f64>,
    pub team_a_roster_improvement: Option<f64>,
    pub team_b_roster_improvement: Option<f64>,
    pub analysis_notes: Option<String>,
}

/// Player with its best ranking, if any.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RankedPlayerRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub player: PlayerRow,
    pub rank: Option<i64>,
    pub tier: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WaiverCandidateRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub player: PlayerRow,
    pub rank: Option<i64>,
    pub tier: Option<i64>,
    pub projected_fantasy_points: Option<f64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WaiverPriorityRow {
    pub id: String,
    pub fantasy_team_id: String,
    pub priority_order: i64,
    pub season_year: i64,
    pub team_name: String,
    pub owner_name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PositionStatsRow {
    pub position: String,
    pub total_players: i64,
    pub rostered_players: i64,
    pub starting_players: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeagueRow {
    pub id: String,
    pub league_name: String,
    pub platform: String,
    pub platform_league_id: Option<String>,
    pub season_year: i64,
    pub scoring_type: String,
    pub team_count: Option<i64>,
    pub playoff_teams: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RankingRow {
    pub id: String,
    pub player_id: String,
    pub position: String,
    pub source: String,
    pub rank: i64,
    pub week: Option<i64>,
    pub season_year: Option<i64>,
    pub tier: Option<i64>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// A ranking with the ranked player's name and NFL team.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlayerRankingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ranking: RankingRow,
    pub name: String,
    pub player_position: String,
    pub nfl_team_name: Option<String>,
    pub nfl_team_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectionRow {
    pub id: String,
    pub player_id: String,
    pub week: i64,
    pub season_year: i64,
    pub source: String,
    pub projected_fantasy_points: Option<f64>,
    pub projected_passing_yards: Option<i64>,
    pub projected_passing_touchdowns: Option<i64>,
    pub projected_rushing_yards: Option<i64>,
    pub projected_rushing_touchdowns: Option<i64>,
    pub projected_receiving_yards: Option<i64>,
    pub projected_receiving_touchdowns: Option<i64>,
    pub projected_receptions: Option<i64>,
    pub confidence_rating: Option<i64>,
    pub created_at: String,
}

/// Rostered player with its best projection, for lineup building.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LineupPlayerRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub player: PlayerRow,
    pub is_starting: i64,
    pub projected_fantasy_points: Option<f64>,
}
