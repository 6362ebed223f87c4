//! Source object → internal record.
//!
//! Pure functions: no I/O, no storage. Defaults applied here:
//!
//! | field              | absent value                     |
//! |--------------------|----------------------------------|
//! | team record counts | 0                                |
//! | team points        | 0.0                              |
//! | player position    | QB                               |
//! | is_injured         | false                            |
//! | is_active          | true                             |
//! | roster slot        | `BN`                             |
//! | acquisition type   | Free Agent                       |
//! | matchup scores     | 0.0                              |
//! | is_playoff         | false                            |

use std::collections::HashMap;

use crate::config::{
    BENCH_LINEUP_SLOT_ID, BENCH_SLOT, FLEX_SLOT, IR_LINEUP_SLOT_ID, MAX_WEEK, UNKNOWN_OWNER,
};
use crate::error::ConversionError;
use crate::source::{InjuryStatus, SourceLeague, SourceMatchup, SourceOwner, SourcePlayer, SourceTeam};
use crate::types::{
    new_id, AcquisitionType, EntityKind, FantasyMatchup, FantasyTeam, LeagueConfig, Platform,
    Player, Position, RosterEntry, ScoringType,
};

const MAX_NAME_LEN: usize = 100;

/// Source id → internal id, for entities that converted successfully.
#[derive(Debug, Default, Clone)]
pub struct IdMaps {
    pub teams: HashMap<String, String>,
    pub players: HashMap<String, String>,
}

impl IdMaps {
    pub fn team(&self, source_id: i64) -> Option<&String> {
        self.teams.get(&source_id.to_string())
    }

    pub fn player(&self, source_id: i64) -> Option<&String> {
        self.players.get(&source_id.to_string())
    }
}

// ---------------------------------------------------------------------------
// League
// ---------------------------------------------------------------------------

pub fn normalize_league_config(
    league: &SourceLeague,
    platform: Platform,
) -> Result<LeagueConfig, ConversionError> {
    let settings = league
        .settings
        .as_ref()
        .ok_or_else(|| ConversionError::missing(EntityKind::League, "settings"))?;
    let name = settings
        .name
        .as_deref()
        .ok_or_else(|| ConversionError::missing(EntityKind::League, "name"))?;
    check_name(EntityKind::League, "league_name", name)?;

    let league_id = league
        .league_id
        .ok_or_else(|| ConversionError::missing(EntityKind::League, "league_id"))?;
    let year = league
        .year
        .ok_or_else(|| ConversionError::missing(EntityKind::League, "year"))?;
    check_range(EntityKind::League, "season_year", year as i64, 2000, 2030)?;

    let team_count = league.teams.len() as i64;
    check_range(EntityKind::League, "team_count", team_count, 2, 32)?;

    let playoff_teams = settings.playoff_team_count.filter(|n| *n > 0);
    if let Some(n) = playoff_teams {
        check_range(EntityKind::League, "playoff_teams", n as i64, 2, 16)?;
    }

    let reception = settings.scoring.as_ref().and_then(|s| s.reception);

    Ok(LeagueConfig {
        id: new_id(),
        league_name: name.to_string(),
        platform,
        platform_league_id: league_id.to_string(),
        season_year: year,
        scoring_type: infer_scoring_type(reception),
        team_count: team_count as u32,
        playoff_teams,
    })
}

pub fn infer_scoring_type(reception_points: Option<f64>) -> ScoringType {
    match reception_points {
        Some(r) if (r - 1.0).abs() < f64::EPSILON => ScoringType::Ppr,
        Some(r) if (r - 0.5).abs() < f64::EPSILON => ScoringType::HalfPpr,
        _ => ScoringType::Standard,
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

pub fn normalize_team(team: &SourceTeam) -> Result<FantasyTeam, ConversionError> {
    let team_id = team
        .team_id
        .ok_or_else(|| ConversionError::missing(EntityKind::Team, "team_id"))?;
    let team_name = team
        .team_name
        .as_deref()
        .ok_or_else(|| ConversionError::missing(EntityKind::Team, "team_name"))?;
    check_name(EntityKind::Team, "team_name", team_name)?;

    let owner_name = resolve_owner_name(&team.owners);
    check_name(EntityKind::Team, "owner_name", &owner_name)?;

    let points_for = check_points(EntityKind::Team, "points_for", team.points_for)?;
    let points_against = check_points(EntityKind::Team, "points_against", team.points_against)?;

    Ok(FantasyTeam {
        id: new_id(),
        owner_name,
        team_name: team_name.to_string(),
        platform_team_id: team_id.to_string(),
        wins: team.wins.unwrap_or(0),
        losses: team.losses.unwrap_or(0),
        ties: team.ties.unwrap_or(0),
        points_for,
        points_against,
    })
}

/// First owner's display name, else the first owner when it is a bare
/// string, else `"Unknown Owner"`.
pub fn resolve_owner_name(owners: &[SourceOwner]) -> String {
    let resolved = match owners.first() {
        Some(SourceOwner::Record(record)) => record.display_name.as_deref(),
        Some(SourceOwner::Name(name)) => Some(name.as_str()),
        _ => None,
    };
    resolved
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_OWNER)
        .to_string()
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

pub fn normalize_player(p: &SourcePlayer) -> Result<Player, ConversionError> {
    let name = p
        .name
        .as_deref()
        .ok_or_else(|| ConversionError::missing(EntityKind::Player, "name"))?;
    check_name(EntityKind::Player, "name", name)?;

    check_optional_range(EntityKind::Player, "jersey_number", p.jersey, 0, 99)?;
    check_optional_range(EntityKind::Player, "weight", p.weight, 100, 400)?;
    check_optional_range(EntityKind::Player, "age", p.age, 18, 50)?;
    check_optional_range(EntityKind::Player, "experience_years", p.experience, 0, 25)?;

    Ok(Player {
        id: new_id(),
        espn_id: p.player_id.map(|id| id.to_string()),
        name: name.to_string(),
        position: map_position(p.position.as_deref()),
        nfl_team_id: p.pro_team_id.map(|id| id.to_string()),
        jersey_number: p.jersey,
        height: p.height.clone(),
        weight: p.weight,
        age: p.age,
        experience_years: p.experience,
        college: p.college.clone(),
        is_injured: i64::from(p.injured.unwrap_or(false)),
        injury_status: normalize_injury_status(p.injury_status.as_ref()),
        is_active: i64::from(p.active.unwrap_or(true)),
    })
}

/// Position code lookup. Unknown or absent codes fall back to QB.
pub fn map_position(code: Option<&str>) -> Position {
    let Some(code) = code else {
        return Position::Qb;
    };
    match code.trim().to_ascii_uppercase().as_str() {
        "QB" => Position::Qb,
        "RB" => Position::Rb,
        "WR" => Position::Wr,
        "TE" => Position::Te,
        "K" => Position::K,
        "DEF" | "D/ST" => Position::Def,
        "FLEX" => Position::Flex,
        "SUPERFLEX" => Position::Superflex,
        _ => Position::Qb,
    }
}

/// Empty list → absent, non-empty list → first element, text passes through.
pub fn normalize_injury_status(status: Option<&InjuryStatus>) -> Option<String> {
    match status? {
        InjuryStatus::Text(s) => Some(s.clone()),
        InjuryStatus::List(items) => items.first().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

/// `None` when the team or the player did not make it into `maps`.
pub fn normalize_roster_entry(
    source_team_id: i64,
    p: &SourcePlayer,
    maps: &IdMaps,
) -> Option<RosterEntry> {
    let fantasy_team_id = maps.team(source_team_id)?;
    let player_id = maps.player(p.player_id?)?;

    let label = p
        .lineup_slot
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase);

    let is_starting = match (p.starter, p.lineup_slot_id, label.as_deref()) {
        (Some(flag), _, _) => flag,
        (None, Some(id), _) => id != BENCH_LINEUP_SLOT_ID && id != IR_LINEUP_SLOT_ID,
        (None, None, Some(l)) => l != BENCH_SLOT && l != "IR",
        (None, None, None) => false,
    };

    // A starter in a slot we have no label for still starts.
    let slot = label.unwrap_or_else(|| {
        if is_starting {
            FLEX_SLOT.to_string()
        } else {
            BENCH_SLOT.to_string()
        }
    });

    let acquisition_type = p
        .acquisition_type
        .as_deref()
        .and_then(AcquisitionType::from_source_tag)
        .unwrap_or(AcquisitionType::FreeAgent);

    Some(RosterEntry {
        id: new_id(),
        fantasy_team_id: fantasy_team_id.clone(),
        player_id: player_id.clone(),
        slot,
        is_starting: i64::from(is_starting),
        acquisition_type,
    })
}

// ---------------------------------------------------------------------------
// Matchups
// ---------------------------------------------------------------------------

/// `Ok(None)` when a team reference does not resolve.
pub fn normalize_matchup(
    m: &SourceMatchup,
    week: u32,
    maps: &IdMaps,
) -> Result<Option<FantasyMatchup>, ConversionError> {
    check_range(EntityKind::Matchup, "week", week as i64, 1, MAX_WEEK as i64)?;

    let home = m.home_team_id.and_then(|id| maps.team(id));
    let away = m.away_team_id.and_then(|id| maps.team(id));
    let (Some(home), Some(away)) = (home, away) else {
        return Ok(None);
    };

    let home_score = check_points(EntityKind::Matchup, "home_score", m.home_score)?;
    let away_score = check_points(EntityKind::Matchup, "away_score", m.away_score)?;

    let declared = m
        .winner_team_id
        .and_then(|id| maps.team(id))
        .filter(|w| *w == home || *w == away);
    let winner_id = match declared {
        Some(w) => Some(w.clone()),
        None if home_score > away_score => Some(home.clone()),
        None if away_score > home_score => Some(away.clone()),
        None => None,
    };

    Ok(Some(FantasyMatchup {
        id: new_id(),
        week,
        home_team_id: home.clone(),
        away_team_id: away.clone(),
        home_score,
        away_score,
        winner_id,
        is_playoff: i64::from(m.is_playoff.unwrap_or(false)),
    }))
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn check_name(entity: EntityKind, field: &'static str, value: &str) -> Result<(), ConversionError> {
    let len = value.trim().chars().count();
    if len == 0 || value.chars().count() > MAX_NAME_LEN {
        return Err(ConversionError::out_of_range(
            entity,
            field,
            format!("length must be 1..={MAX_NAME_LEN}, got {}", value.chars().count()),
        ));
    }
    Ok(())
}

fn check_range(
    entity: EntityKind,
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ConversionError> {
    if value < min || value > max {
        return Err(ConversionError::out_of_range(
            entity,
            field,
            format!("{value} not in {min}..={max}"),
        ));
    }
    Ok(())
}

fn check_optional_range(
    entity: EntityKind,
    field: &'static str,
    value: Option<i64>,
    min: i64,
    max: i64,
) -> Result<(), ConversionError> {
    match value {
        Some(v) => check_range(entity, field, v, min, max),
        None => Ok(()),
    }
}

fn check_points(
    entity: EntityKind,
    field: &'static str,
    value: Option<f64>,
) -> Result<f64, ConversionError> {
    let v = value.unwrap_or(0.0);
    if !v.is_finite() || v < 0.0 {
        return Err(ConversionError::out_of_range(entity, field, format!("{v} must be finite and >= 0")));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{OwnerRecord, SourceScoring, SourceSettings};
    use serde_json::json;

    fn league(teams: usize) -> SourceLeague {
        SourceLeague {
            league_id: Some(42),
            year: Some(2024),
            settings: Some(SourceSettings {
                name: Some("Test League".to_string()),
                playoff_team_count: Some(4),
                scoring: Some(SourceScoring { reception: Some(1.0) }),
            }),
            teams: (0..teams)
                .map(|i| SourceTeam {
                    team_id: Some(i as i64 + 1),
                    team_name: Some(format!("Team {}", i + 1)),
                    ..SourceTeam::default()
                })
                .collect(),
            current_week: None,
        }
    }

    fn maps() -> IdMaps {
        let mut maps = IdMaps::default();
        maps.teams.insert("1".to_string(), "t1".to_string());
        maps.teams.insert("2".to_string(), "t2".to_string());
        maps.players.insert("10".to_string(), "p10".to_string());
        maps
    }

    #[test]
    fn scoring_type_from_reception_points() {
        assert_eq!(infer_scoring_type(Some(1.0)), ScoringType::Ppr);
        assert_eq!(infer_scoring_type(Some(0.5)), ScoringType::HalfPpr);
        assert_eq!(infer_scoring_type(Some(0.25)), ScoringType::Standard);
        assert_eq!(infer_scoring_type(None), ScoringType::Standard);
    }

    #[test]
    fn league_config_reads_settings() {
        let cfg = normalize_league_config(&league(4), Platform::Espn).unwrap();
        assert_eq!(cfg.league_name, "Test League");
        assert_eq!(cfg.platform_league_id, "42");
        assert_eq!(cfg.team_count, 4);
        assert_eq!(cfg.playoff_teams, Some(4));
        assert_eq!(cfg.scoring_type, ScoringType::Ppr);
    }

    #[test]
    fn league_config_rejects_invalid_values() {
        let mut l = league(4);
        l.year = Some(1999);
        assert!(normalize_league_config(&l, Platform::Espn).is_err());

        assert!(normalize_league_config(&league(1), Platform::Espn).is_err());

        let mut l = league(4);
        l.settings.as_mut().unwrap().name = None;
        assert_eq!(
            normalize_league_config(&l, Platform::Espn).unwrap_err(),
            ConversionError::missing(EntityKind::League, "name")
        );

        let mut l = league(4);
        l.settings.as_mut().unwrap().playoff_team_count = Some(20);
        assert!(normalize_league_config(&l, Platform::Espn).is_err());
    }

    #[test]
    fn zero_playoff_teams_means_absent() {
        let mut l = league(4);
        l.settings.as_mut().unwrap().playoff_team_count = Some(0);
        let cfg = normalize_league_config(&l, Platform::Espn).unwrap();
        assert_eq!(cfg.playoff_teams, None);
    }

    #[test]
    fn owner_name_policy() {
        let record = |name: Option<&str>| {
            SourceOwner::Record(OwnerRecord {
                display_name: name.map(str::to_string),
                ..OwnerRecord::default()
            })
        };
        assert_eq!(resolve_owner_name(&[record(Some("Jane Doe"))]), "Jane Doe");
        assert_eq!(resolve_owner_name(&[SourceOwner::Name("jsmith".to_string())]), "jsmith");
        assert_eq!(resolve_owner_name(&[record(None)]), "Unknown Owner");
        assert_eq!(resolve_owner_name(&[record(Some("  "))]), "Unknown Owner");
        assert_eq!(resolve_owner_name(&[SourceOwner::Other(json!(7))]), "Unknown Owner");
        assert_eq!(resolve_owner_name(&[]), "Unknown Owner");
    }

    #[test]
    fn team_defaults_missing_record_fields() {
        let t = SourceTeam {
            team_id: Some(3),
            team_name: Some("Gridiron Gang".to_string()),
            wins: Some(2),
            ..SourceTeam::default()
        };
        let team = normalize_team(&t).unwrap();
        assert_eq!(team.platform_team_id, "3");
        assert_eq!(team.owner_name, "Unknown Owner");
        assert_eq!((team.wins, team.losses, team.ties), (2, 0, 0));
        assert_eq!(team.points_for, 0.0);
    }

    #[test]
    fn team_without_id_or_with_negative_points_fails() {
        let t = SourceTeam {
            team_name: Some("No Id".to_string()),
            ..SourceTeam::default()
        };
        assert!(normalize_team(&t).is_err());

        let t = SourceTeam {
            team_id: Some(1),
            team_name: Some("Negative".to_string()),
            points_for: Some(-1.0),
            ..SourceTeam::default()
        };
        assert!(normalize_team(&t).is_err());
    }

    #[test]
    fn injury_status_shapes() {
        assert_eq!(normalize_injury_status(Some(&InjuryStatus::List(vec![]))), None);
        assert_eq!(
            normalize_injury_status(Some(&InjuryStatus::List(vec![json!("QUESTIONABLE"), json!("OUT")]))),
            Some("QUESTIONABLE".to_string())
        );
        assert_eq!(
            normalize_injury_status(Some(&InjuryStatus::Text("OUT".to_string()))),
            Some("OUT".to_string())
        );
        assert_eq!(normalize_injury_status(None), None);
    }

    #[test]
    fn positions_map_with_qb_fallback() {
        assert_eq!(map_position(Some("RB")), Position::Rb);
        assert_eq!(map_position(Some("D/ST")), Position::Def);
        assert_eq!(map_position(Some("superflex")), Position::Superflex);
        assert_eq!(map_position(Some("P")), Position::Qb);
        assert_eq!(map_position(None), Position::Qb);
    }

    #[test]
    fn player_defaults_and_flags() {
        let p = SourcePlayer {
            player_id: Some(10),
            name: Some("A".to_string()),
            position: Some("XYZ".to_string()),
            pro_team_id: Some(12),
            ..SourcePlayer::default()
        };
        let player = normalize_player(&p).unwrap();
        assert_eq!(player.position, Position::Qb);
        assert_eq!(player.espn_id.as_deref(), Some("10"));
        assert_eq!(player.nfl_team_id.as_deref(), Some("12"));
        assert_eq!(player.is_injured, 0);
        assert_eq!(player.is_active, 1);
    }

    #[test]
    fn player_physical_attributes_are_validated() {
        let base = SourcePlayer {
            name: Some("A".to_string()),
            ..SourcePlayer::default()
        };
        let with = |f: fn(&mut SourcePlayer)| {
            let mut p = base.clone();
            f(&mut p);
            normalize_player(&p)
        };
        assert!(with(|p| p.jersey = Some(100)).is_err());
        assert!(with(|p| p.weight = Some(99)).is_err());
        assert!(with(|p| p.age = Some(17)).is_err());
        assert!(with(|p| p.experience = Some(26)).is_err());
        assert!(with(|p| p.jersey = Some(0)).is_ok());
        assert!(with(|p| p.name = Some(String::new())).is_err());
        assert!(with(|p| p.name = Some("x".repeat(101))).is_err());
    }

    #[test]
    fn roster_entry_skips_unresolved_references() {
        let p = SourcePlayer {
            player_id: Some(10),
            ..SourcePlayer::default()
        };
        assert!(normalize_roster_entry(1, &p, &maps()).is_some());
        assert!(normalize_roster_entry(9, &p, &maps()).is_none());

        let unknown = SourcePlayer {
            player_id: Some(11),
            ..SourcePlayer::default()
        };
        assert!(normalize_roster_entry(1, &unknown, &maps()).is_none());
    }

    #[test]
    fn roster_entry_starting_and_acquisition() {
        let mut p = SourcePlayer {
            player_id: Some(10),
            lineup_slot: Some("RB".to_string()),
            lineup_slot_id: Some(2),
            acquisition_type: Some("TRADE".to_string()),
            ..SourcePlayer::default()
        };
        let entry = normalize_roster_entry(1, &p, &maps()).unwrap();
        assert_eq!(entry.slot, "RB");
        assert_eq!(entry.is_starting, 1);
        assert_eq!(entry.acquisition_type, AcquisitionType::Trade);
        assert_eq!(entry.fantasy_team_id, "t1");
        assert_eq!(entry.player_id, "p10");

        p.lineup_slot_id = Some(21);
        p.acquisition_type = Some("KEEPER".to_string());
        let entry = normalize_roster_entry(1, &p, &maps()).unwrap();
        assert_eq!(entry.is_starting, 0);
        assert_eq!(entry.acquisition_type, AcquisitionType::FreeAgent);

        p.starter = Some(true);
        assert_eq!(normalize_roster_entry(1, &p, &maps()).unwrap().is_starting, 1);
    }

    #[test]
    fn roster_entry_defaults_to_bench() {
        let p = SourcePlayer {
            player_id: Some(10),
            ..SourcePlayer::default()
        };
        let entry = normalize_roster_entry(1, &p, &maps()).unwrap();
        assert_eq!(entry.slot, "BN");
        assert_eq!(entry.is_starting, 0);
    }

    #[test]
    fn unlabelled_starter_goes_to_flex() {
        let p = SourcePlayer {
            player_id: Some(10),
            starter: Some(true),
            ..SourcePlayer::default()
        };
        let entry = normalize_roster_entry(1, &p, &maps()).unwrap();
        assert_eq!(entry.slot, "FLEX");
        assert_eq!(entry.is_starting, 1);
    }

    fn matchup(home: f64, away: f64) -> SourceMatchup {
        SourceMatchup {
            home_team_id: Some(1),
            away_team_id: Some(2),
            home_score: Some(home),
            away_score: Some(away),
            ..SourceMatchup::default()
        }
    }

    #[test]
    fn matchup_winner_by_score_and_tie() {
        let m = normalize_matchup(&matchup(100.0, 80.0), 1, &maps()).unwrap().unwrap();
        assert_eq!(m.winner_id.as_deref(), Some("t1"));
        assert_eq!(m.is_playoff, 0);

        let m = normalize_matchup(&matchup(80.0, 100.0), 1, &maps()).unwrap().unwrap();
        assert_eq!(m.winner_id.as_deref(), Some("t2"));

        let m = normalize_matchup(&matchup(90.0, 90.0), 1, &maps()).unwrap().unwrap();
        assert_eq!(m.winner_id, None);
    }

    #[test]
    fn matchup_declared_winner_takes_precedence() {
        let mut src = matchup(80.0, 100.0);
        src.winner_team_id = Some(1);
        let m = normalize_matchup(&src, 3, &maps()).unwrap().unwrap();
        assert_eq!(m.winner_id.as_deref(), Some("t1"));
    }

    #[test]
    fn matchup_rejects_bad_week_and_scores() {
        assert!(normalize_matchup(&matchup(1.0, 2.0), 0, &maps()).is_err());
        assert!(normalize_matchup(&matchup(1.0, 2.0), 22, &maps()).is_err());
        assert!(normalize_matchup(&matchup(-1.0, 2.0), 1, &maps()).is_err());
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let err = normalize_matchup(&matchup(f64::NAN, 2.0), 1, &maps()).unwrap_err();
        assert!(err.to_string().contains("must be finite and >= 0"), "{err}");
        assert!(normalize_matchup(&matchup(1.0, f64::INFINITY), 1, &maps()).is_err());
    }

    #[test]
    fn matchup_with_unknown_team_is_skipped() {
        let mut src = matchup(1.0, 2.0);
        src.away_team_id = Some(99);
        assert_eq!(normalize_matchup(&src, 1, &maps()).unwrap(), None);
    }
}
