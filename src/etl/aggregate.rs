use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{MAX_WEEK, REGULAR_SEASON_WEEKS};
use crate::error::{AggregationError, SourceError};
use crate::etl::normalize::{
    normalize_league_config, normalize_matchup, normalize_player, normalize_roster_entry,
    normalize_team, IdMaps,
};
use crate::source::{LeagueSource, SourceLeague, SourcePlayer};
use crate::types::{EntityKind, Player, RosterEntry, SkipReason, SkippedEntity, Snapshot};

/// A snapshot plus everything that was left out of it.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedEntity>,
}

impl AggregateReport {
    pub fn skipped_of(&self, kind: EntityKind) -> usize {
        self.skipped.iter().filter(|s| s.kind == kind).count()
    }
}

/// Pull one league from `source` and convert it into a snapshot.
///
/// Only a failed league fetch or league config conversion aborts the run.
/// Every other failure drops the affected entity and is recorded in
/// `AggregateReport::skipped`.
pub async fn build_snapshot(
    source: &dyn LeagueSource,
    league_id: i64,
    year: i32,
) -> Result<AggregateReport, AggregationError> {
    let league = source.fetch_league(league_id, year).await?;
    let config = normalize_league_config(&league, source.platform())?;

    let mut skipped = Vec::new();
    let mut maps = IdMaps::default();

    // ---- teams
    let mut teams = Vec::with_capacity(league.teams.len());
    for t in &league.teams {
        match normalize_team(t) {
            Ok(team) => {
                maps.teams
                    .insert(team.platform_team_id.clone(), team.id.clone());
                teams.push(team);
            }
            Err(e) => {
                warn!(team_id = ?t.team_id, "Skipping team: {e}");
                skipped.push(SkippedEntity {
                    kind: EntityKind::Team,
                    source_id: t.team_id.map(|id| id.to_string()),
                    reason: SkipReason::Conversion(e),
                });
            }
        }
    }

    // ---- players: rostered first, then free agents
    let mut universe = PlayerUniverse::default();
    for p in league.teams.iter().flat_map(|t| t.roster.iter()) {
        universe.add(p, &mut maps, &mut skipped);
    }
    for p in &fetch_free_agents(source, &league, &mut skipped).await {
        universe.add(p, &mut maps, &mut skipped);
    }
    let players = universe.players;

    // ---- roster entries
    let roster_entries = build_roster(&league, &maps, &mut skipped);

    // ---- matchups
    let last_week = league
        .current_week
        .map(|w| w.min(MAX_WEEK))
        .unwrap_or(REGULAR_SEASON_WEEKS);
    let mut matchups = Vec::new();
    for week in 1..=last_week {
        let week_matchups = match source.scoreboard(&league, week).await {
            Ok(m) => m,
            Err(e) => {
                warn!(week, "Scoreboard unavailable, skipping week: {e}");
                skipped.push(SkippedEntity {
                    kind: EntityKind::Matchup,
                    source_id: Some(format!("week {week}")),
                    reason: SkipReason::SourceUnavailable(e.to_string()),
                });
                continue;
            }
        };
        for m in &week_matchups {
            let source_id = Some(format!(
                "week {week}: {} vs {}",
                fmt_id(m.home_team_id),
                fmt_id(m.away_team_id)
            ));
            match normalize_matchup(m, week, &maps) {
                Ok(Some(matchup)) => matchups.push(matchup),
                Ok(None) => skipped.push(SkippedEntity {
                    kind: EntityKind::Matchup,
                    source_id,
                    reason: SkipReason::UnresolvedReference("team".to_string()),
                }),
                Err(e) => skipped.push(SkippedEntity {
                    kind: EntityKind::Matchup,
                    source_id,
                    reason: SkipReason::Conversion(e),
                }),
            }
        }
    }

    info!(
        teams = teams.len(),
        players = players.len(),
        roster_entries = roster_entries.len(),
        matchups = matchups.len(),
        skipped = skipped.len(),
        "Aggregated league {}",
        config.league_name
    );

    Ok(AggregateReport {
        snapshot: Snapshot {
            league: config,
            teams,
            players,
            roster_entries,
            matchups,
            generated_at: Utc::now(),
        },
        skipped,
    })
}

/// Deduplicated player set keyed by source id; first occurrence wins.
#[derive(Default)]
struct PlayerUniverse {
    seen: HashSet<i64>,
    players: Vec<Player>,
}

impl PlayerUniverse {
    fn add(&mut self, p: &SourcePlayer, maps: &mut IdMaps, skipped: &mut Vec<SkippedEntity>) {
        let Some(source_id) = p.player_id else {
            debug!(name = ?p.name, "Player without source id");
            skipped.push(SkippedEntity {
                kind: EntityKind::Player,
                source_id: None,
                reason: SkipReason::MissingSourceId,
            });
            return;
        };
        if !self.seen.insert(source_id) {
            return;
        }
        match normalize_player(p) {
            Ok(player) => {
                maps.players.insert(source_id.to_string(), player.id.clone());
                self.players.push(player);
            }
            Err(e) => {
                warn!(player_id = source_id, "Skipping player: {e}");
                skipped.push(SkippedEntity {
                    kind: EntityKind::Player,
                    source_id: Some(source_id.to_string()),
                    reason: SkipReason::Conversion(e),
                });
            }
        }
    }
}

async fn fetch_free_agents(
    source: &dyn LeagueSource,
    league: &SourceLeague,
    skipped: &mut Vec<SkippedEntity>,
) -> Vec<SourcePlayer> {
    match source.free_agents(league).await {
        Ok(players) => {
            debug!(count = players.len(), "Fetched free agents");
            players
        }
        Err(SourceError::Unsupported(what)) => {
            debug!("Source does not list {what}");
            Vec::new()
        }
        Err(e) => {
            warn!("Free agent listing failed: {e}");
            skipped.push(SkippedEntity {
                kind: EntityKind::Player,
                source_id: None,
                reason: SkipReason::SourceUnavailable(e.to_string()),
            });
            Vec::new()
        }
    }
}

fn build_roster(
    league: &SourceLeague,
    maps: &IdMaps,
    skipped: &mut Vec<SkippedEntity>,
) -> Vec<RosterEntry> {
    let mut entries = Vec::new();
    // internal player id → source team id that rostered it first
    let mut rostered: HashMap<String, String> = HashMap::new();

    for t in &league.teams {
        for p in &t.roster {
            let entry = t
                .team_id
                .and_then(|team_id| normalize_roster_entry(team_id, p, maps));
            let source_id = Some(format!("{}/{}", fmt_id(t.team_id), fmt_id(p.player_id)));

            let Some(entry) = entry else {
                skipped.push(SkippedEntity {
                    kind: EntityKind::RosterEntry,
                    source_id,
                    reason: SkipReason::UnresolvedReference("team or player".to_string()),
                });
                continue;
            };

            if let Some(first_team) = rostered.get(&entry.player_id) {
                warn!(player_id = ?p.player_id, team_id = ?t.team_id, "Player already rostered");
                skipped.push(SkippedEntity {
                    kind: EntityKind::RosterEntry,
                    source_id,
                    reason: SkipReason::AlreadyRostered {
                        team_id: first_team.clone(),
                    },
                });
                continue;
            }

            rostered.insert(entry.player_id.clone(), fmt_id(t.team_id));
            entries.push(entry);
        }
    }
    entries
}

fn fmt_id(id: Option<i64>) -> String {
    id.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string())
}
