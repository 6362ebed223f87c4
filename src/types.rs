use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Qb,
    Rb,
    Wr,
    Te,
    K,
    Def,
    Flex,
    Superflex,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Rb => "RB",
            Position::Wr => "WR",
            Position::Te => "TE",
            Position::K => "K",
            Position::Def => "DEF",
            Position::Flex => "FLEX",
            Position::Superflex => "SUPERFLEX",
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringType {
    Standard,
    #[serde(rename = "PPR")]
    Ppr,
    #[serde(rename = "Half-PPR")]
    HalfPpr,
}

impl std::fmt::Display for ScoringType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScoringType::Standard => "Standard",
            ScoringType::Ppr => "PPR",
            ScoringType::HalfPpr => "Half-PPR",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "ESPN")]
    Espn,
    Yahoo,
    Sleeper,
    Custom,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Platform::Espn => "ESPN",
            Platform::Yahoo => "Yahoo",
            Platform::Sleeper => "Sleeper",
            Platform::Custom => "Custom",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionType {
    Draft,
    Waiver,
    Trade,
    #[serde(rename = "Free Agent")]
    FreeAgent,
}

impl AcquisitionType {
    /// Lenient parse of a platform acquisition tag. Unknown tags yield `None`.
    pub fn from_source_tag(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "DRAFT" => Some(AcquisitionType::Draft),
            "WAIVER" | "WAIVERS" => Some(AcquisitionType::Waiver),
            "TRADE" => Some(AcquisitionType::Trade),
            "FREEAGENT" | "FREEAGENTS" | "ADD" => Some(AcquisitionType::FreeAgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for AcquisitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AcquisitionType::Draft => "Draft",
            AcquisitionType::Waiver => "Waiver",
            AcquisitionType::Trade => "Trade",
            AcquisitionType::FreeAgent => "Free Agent",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TradeStatus::Pending => "Pending",
            TradeStatus::Accepted => "Accepted",
            TradeStatus::Rejected => "Rejected",
            TradeStatus::Expired => "Expired",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    League,
    Team,
    Player,
    RosterEntry,
    Matchup,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::League => "league",
            EntityKind::Team => "team",
            EntityKind::Player => "player",
            EntityKind::RosterEntry => "roster entry",
            EntityKind::Matchup => "matchup",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueConfig {
    pub id: String,
    pub league_name: String,
    pub platform: Platform,
    pub platform_league_id: String,
    pub season_year: i32,
    pub scoring_type: ScoringType,
    pub team_count: u32,
    pub playoff_teams: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FantasyTeam {
    pub id: String,
    pub owner_name: String,
    pub team_name: String,
    pub platform_team_id: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
}

/// Booleans are carried as 0/1 so rows bind exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: String,
    pub espn_id: Option<String>,
    pub name: String,
    pub position: Position,
    pub nfl_team_id: Option<String>,
    pub jersey_number: Option<i64>,
    pub height: Option<String>,
    pub weight: Option<i64>,
    pub age: Option<i64>,
    pub experience_years: Option<i64>,
    pub college: Option<String>,
    pub is_injured: i64,
    pub injury_status: Option<String>,
    pub is_active: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub id: String,
    pub fantasy_team_id: String,
    pub player_id: String,
    /// Declared roster slot, e.g. "QB", "FLEX", "BN".
    pub slot: String,
    pub is_starting: i64,
    pub acquisition_type: AcquisitionType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FantasyMatchup {
    pub id: String,
    pub week: u32,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_score: f64,
    pub away_score: f64,
    pub winner_id: Option<String>,
    pub is_playoff: i64,
}

/// Everything one ETL run produced.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub league: LeagueConfig,
    pub teams: Vec<FantasyTeam>,
    pub players: Vec<Player>,
    pub roster_entries: Vec<RosterEntry>,
    pub matchups: Vec<FantasyMatchup>,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Skipped entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Conversion(ConversionError),
    /// A team or player reference did not survive conversion.
    UnresolvedReference(String),
    MissingSourceId,
    AlreadyRostered { team_id: String },
    /// The source call for this entity group failed.
    SourceUnavailable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Conversion(e) => write!(f, "{e}"),
            SkipReason::UnresolvedReference(r) => write!(f, "unresolved reference: {r}"),
            SkipReason::MissingSourceId => write!(f, "missing source id"),
            SkipReason::AlreadyRostered { team_id } => {
                write!(f, "already rostered by source team {team_id}")
            }
            SkipReason::SourceUnavailable(e) => write!(f, "source unavailable: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntity {
    pub kind: EntityKind,
    pub source_id: Option<String>,
    pub reason: SkipReason,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
