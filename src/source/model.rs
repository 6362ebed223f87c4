//! Object graph handed over by a league source.
//!
//! Every scalar is optional: the normalizer decides which absences are fatal.
//! Lists default to empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLeague {
    pub league_id: Option<i64>,
    pub year: Option<i32>,
    pub settings: Option<SourceSettings>,
    pub teams: Vec<SourceTeam>,
    /// Current in-season week, when the platform reports one.
    pub current_week: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub name: Option<String>,
    pub playoff_team_count: Option<u32>,
    pub scoring: Option<SourceScoring>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceScoring {
    /// Points awarded per reception.
    pub reception: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceTeam {
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub owners: Vec<SourceOwner>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub ties: Option<u32>,
    pub points_for: Option<f64>,
    pub points_against: Option<f64>,
    pub roster: Vec<SourcePlayer>,
}

/// Owner entries come either as member records or as bare strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceOwner {
    Name(String),
    Record(OwnerRecord),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerRecord {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePlayer {
    pub player_id: Option<i64>,
    pub name: Option<String>,
    /// Platform position code, e.g. "RB" or "D/ST".
    pub position: Option<String>,
    pub pro_team_id: Option<i64>,
    pub jersey: Option<i64>,
    pub height: Option<String>,
    pub weight: Option<i64>,
    pub age: Option<i64>,
    pub experience: Option<i64>,
    pub college: Option<String>,
    pub injured: Option<bool>,
    pub injury_status: Option<InjuryStatus>,
    pub active: Option<bool>,
    /// Lineup slot label on a roster, e.g. "QB", "FLEX", "BN".
    pub lineup_slot: Option<String>,
    pub lineup_slot_id: Option<i64>,
    pub starter: Option<bool>,
    pub acquisition_type: Option<String>,
}

/// Team defenses report their injury status as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InjuryStatus {
    Text(String),
    List(Vec<serde_json::Value>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMatchup {
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
    /// Team id the platform declared the winner, if decided.
    pub winner_team_id: Option<i64>,
    pub is_playoff: Option<bool>,
}
