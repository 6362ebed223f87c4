use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::SourceError;
use crate::source::model::{
    InjuryStatus, OwnerRecord, SourceLeague, SourceMatchup, SourceOwner, SourcePlayer,
    SourceScoring, SourceSettings, SourceTeam,
};
use crate::source::LeagueSource;
use crate::types::Platform;

/// ESPN stat id for receptions in `scoringItems`.
const RECEPTION_STAT_ID: i64 = 53;

const LEAGUE_VIEWS: &[&str] = &["mTeam", "mRoster", "mSettings", "mStatus"];

/// Client for the ESPN Fantasy Football v3 read API.
pub struct EspnClient {
    client: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
    free_agent_limit: u32,
}

impl EspnClient {
    pub fn new(cfg: &Config) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;

        // Private leagues need both cookies; one alone is useless.
        let cookie = match (&cfg.espn_s2, &cfg.espn_swid) {
            (Some(s2), Some(swid)) => Some(format!("espn_s2={s2}; SWID={swid}")),
            _ => None,
        };

        Ok(Self {
            client,
            base_url: cfg.espn_api_url.trim_end_matches('/').to_string(),
            cookie,
            free_agent_limit: cfg.free_agent_limit,
        })
    }

    fn league_url(&self, league_id: i64, year: i32) -> String {
        format!(
            "{}/seasons/{}/segments/0/leagues/{}",
            self.base_url, year, league_id
        )
    }

    async fn get_json(
        &self,
        league_id: i64,
        year: i32,
        query: &[(&str, String)],
        fantasy_filter: Option<String>,
    ) -> Result<Value, SourceError> {
        let url = self.league_url(league_id, year);
        let mut req = self.client.get(&url).query(query);
        if let Some(cookie) = &self.cookie {
            req = req.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(filter) = fantasy_filter {
            req = req.header("x-fantasy-filter", filter);
        }

        debug!(url = %url, "ESPN request");
        let resp = req.send().await?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                return Err(SourceError::LeagueNotFound { league_id, year })
            }
            _ => {}
        }
        Ok(resp.error_for_status()?.json::<Value>().await?)
    }
}

#[async_trait]
impl LeagueSource for EspnClient {
    fn platform(&self) -> Platform {
        Platform::Espn
    }

    async fn fetch_league(&self, league_id: i64, year: i32) -> Result<SourceLeague, SourceError> {
        let query: Vec<(&str, String)> = LEAGUE_VIEWS
            .iter()
            .map(|v| ("view", (*v).to_string()))
            .collect();
        let v = self.get_json(league_id, year, &query, None).await?;
        parse_league(&v)
    }

    async fn scoreboard(
        &self,
        league: &SourceLeague,
        week: u32,
    ) -> Result<Vec<SourceMatchup>, SourceError> {
        let (league_id, year) = league_key(league)?;
        let query = [
            ("view", "mMatchupScore".to_string()),
            ("scoringPeriodId", week.to_string()),
        ];
        let v = self.get_json(league_id, year, &query, None).await?;
        Ok(parse_scoreboard(&v, week))
    }

    async fn free_agents(&self, league: &SourceLeague) -> Result<Vec<SourcePlayer>, SourceError> {
        let (league_id, year) = league_key(league)?;
        let week = league.current_week.unwrap_or(1);
        let filter = serde_json::json!({
            "players": {
                "filterStatus": { "value": ["FREEAGENT", "WAIVERS"] },
                "limit": self.free_agent_limit,
                "sortPercOwned": { "sortPriority": 1, "sortAsc": false }
            }
        });
        let query = [
            ("view", "kona_player_info".to_string()),
            ("scoringPeriodId", week.to_string()),
        ];
        let v = self
            .get_json(league_id, year, &query, Some(filter.to_string()))
            .await?;
        Ok(parse_free_agents(&v))
    }
}

fn league_key(league: &SourceLeague) -> Result<(i64, i32), SourceError> {
    match (league.league_id, league.year) {
        (Some(id), Some(year)) => Ok((id, year)),
        _ => Err(SourceError::Malformed(
            "league graph lacks id or season".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

pub fn parse_league(v: &Value) -> Result<SourceLeague, SourceError> {
    if !v.is_object() {
        return Err(SourceError::Malformed(
            "league response was not an object".to_string(),
        ));
    }

    let settings = v.get("settings").map(|s| SourceSettings {
        name: s.get("name").and_then(|n| n.as_str()).map(str::to_string),
        playoff_team_count: s
            .get("scheduleSettings")
            .and_then(|ss| ss.get("playoffTeamCount"))
            .and_then(|c| c.as_u64())
            .map(|c| c as u32),
        scoring: s.get("scoringSettings").map(|sc| SourceScoring {
            reception: reception_points(sc),
        }),
    });

    let members: HashMap<String, OwnerRecord> = v
        .get("members")
        .and_then(|m| m.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|m| {
                    let id = m.get("id")?.as_str()?.to_string();
                    Some((
                        id,
                        OwnerRecord {
                            display_name: str_field(m, "displayName"),
                            first_name: str_field(m, "firstName"),
                            last_name: str_field(m, "lastName"),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    let teams = v
        .get("teams")
        .and_then(|t| t.as_array())
        .map(|arr| arr.iter().map(|t| parse_team(t, &members)).collect())
        .unwrap_or_default();

    let current_week = v
        .get("status")
        .and_then(|s| s.get("currentMatchupPeriod"))
        .and_then(|w| w.as_u64())
        .or_else(|| v.get("scoringPeriodId").and_then(|w| w.as_u64()))
        .map(|w| w as u32);

    Ok(SourceLeague {
        league_id: v.get("id").and_then(|i| i.as_i64()),
        year: v.get("seasonId").and_then(|y| y.as_i64()).map(|y| y as i32),
        settings,
        teams,
        current_week,
    })
}

fn reception_points(scoring_settings: &Value) -> Option<f64> {
    scoring_settings
        .get("scoringItems")
        .and_then(|items| items.as_array())?
        .iter()
        .find(|item| item.get("statId").and_then(|s| s.as_i64()) == Some(RECEPTION_STAT_ID))
        .and_then(|item| item.get("points"))
        .and_then(|p| p.as_f64())
}

fn parse_team(t: &Value, members: &HashMap<String, OwnerRecord>) -> SourceTeam {
    // Newer seasons carry `name`; older ones split it into location + nickname.
    let team_name = str_field(t, "name").or_else(|| {
        let location = t.get("location").and_then(|l| l.as_str()).unwrap_or("");
        let nickname = t.get("nickname").and_then(|n| n.as_str()).unwrap_or("");
        let joined = format!("{location} {nickname}").trim().to_string();
        (!joined.is_empty()).then_some(joined)
    });

    let owners = t
        .get("owners")
        .and_then(|o| o.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| o.as_str())
                .filter_map(|id| members.get(id).cloned().map(SourceOwner::Record))
                .collect()
        })
        .unwrap_or_default();

    let overall = t.get("record").and_then(|r| r.get("overall"));
    let record_u32 = |key: &str| {
        overall
            .and_then(|o| o.get(key))
            .and_then(|x| x.as_u64())
            .map(|x| x as u32)
    };
    let record_f64 = |key: &str| overall.and_then(|o| o.get(key)).and_then(|x| x.as_f64());

    let roster = t
        .get("roster")
        .and_then(|r| r.get("entries"))
        .and_then(|e| e.as_array())
        .map(|arr| arr.iter().map(parse_roster_entry).collect())
        .unwrap_or_default();

    SourceTeam {
        team_id: t.get("id").and_then(|i| i.as_i64()),
        team_name,
        owners,
        wins: record_u32("wins"),
        losses: record_u32("losses"),
        ties: record_u32("ties"),
        points_for: record_f64("pointsFor"),
        points_against: record_f64("pointsAgainst"),
        roster,
    }
}

fn parse_roster_entry(e: &Value) -> SourcePlayer {
    let player = e
        .get("playerPoolEntry")
        .and_then(|p| p.get("player"))
        .unwrap_or(&Value::Null);

    let mut out = parse_player_info(player);
    if out.player_id.is_none() {
        out.player_id = e.get("playerId").and_then(|i| i.as_i64());
    }
    if let Some(status) = e.get("injuryStatus").and_then(injury_status) {
        out.injury_status = Some(status);
    }
    out.lineup_slot_id = e.get("lineupSlotId").and_then(|s| s.as_i64());
    out.lineup_slot = out.lineup_slot_id.and_then(lineup_slot_label).map(str::to_string);
    out.acquisition_type = str_field(e, "acquisitionType");
    out
}

/// Player fields shared by roster entries and the free-agent listing.
fn parse_player_info(p: &Value) -> SourcePlayer {
    SourcePlayer {
        player_id: p.get("id").and_then(|i| i.as_i64()),
        name: str_field(p, "fullName"),
        position: p
            .get("defaultPositionId")
            .and_then(|id| id.as_i64())
            .and_then(position_code)
            .map(str::to_string),
        pro_team_id: p.get("proTeamId").and_then(|i| i.as_i64()).filter(|id| *id != 0),
        // ESPN sends jerseys as strings.
        jersey: p
            .get("jersey")
            .and_then(|j| j.as_i64().or_else(|| j.as_str().and_then(|s| s.parse().ok()))),
        injured: p.get("injured").and_then(|i| i.as_bool()),
        injury_status: p.get("injuryStatus").and_then(injury_status),
        active: p.get("active").and_then(|a| a.as_bool()),
        ..SourcePlayer::default()
    }
}

fn injury_status(v: &Value) -> Option<InjuryStatus> {
    match v {
        Value::String(s) => Some(InjuryStatus::Text(s.clone())),
        Value::Array(items) => Some(InjuryStatus::List(items.clone())),
        _ => None,
    }
}

pub fn parse_scoreboard(v: &Value, week: u32) -> Vec<SourceMatchup> {
    let Some(schedule) = v.get("schedule").and_then(|s| s.as_array()) else {
        return Vec::new();
    };

    schedule
        .iter()
        .filter(|m| m.get("matchupPeriodId").and_then(|p| p.as_u64()) == Some(week as u64))
        .map(|m| {
            let side_team = |side: &str| m.get(side).and_then(|s| s.get("teamId")).and_then(|i| i.as_i64());
            let side_score = |side: &str| {
                m.get(side)
                    .and_then(|s| s.get("totalPoints"))
                    .and_then(|p| p.as_f64())
            };
            let home_team_id = side_team("home");
            let away_team_id = side_team("away");
            let winner_team_id = match m.get("winner").and_then(|w| w.as_str()) {
                Some("HOME") => home_team_id,
                Some("AWAY") => away_team_id,
                _ => None,
            };
            let is_playoff = m
                .get("playoffTierType")
                .and_then(|t| t.as_str())
                .map(|t| t != "NONE");

            SourceMatchup {
                home_team_id,
                away_team_id,
                home_score: side_score("home"),
                away_score: side_score("away"),
                winner_team_id,
                is_playoff,
            }
        })
        .collect()
}

pub fn parse_free_agents(v: &Value) -> Vec<SourcePlayer> {
    v.get("players")
        .and_then(|p| p.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| entry.get("player"))
                .map(parse_player_info)
                .collect()
        })
        .unwrap_or_default()
}

/// ESPN `defaultPositionId` → position code.
pub fn position_code(id: i64) -> Option<&'static str> {
    match id {
        1 => Some("QB"),
        2 => Some("RB"),
        3 => Some("WR"),
        4 => Some("TE"),
        5 => Some("K"),
        16 => Some("D/ST"),
        _ => None,
    }
}

/// ESPN `lineupSlotId` → roster slot label.
pub fn lineup_slot_label(id: i64) -> Option<&'static str> {
    match id {
        0 | 1 => Some("QB"),
        2 => Some("RB"),
        4 => Some("WR"),
        6 => Some("TE"),
        // RB/WR, WR/TE and the other combo slots start like FLEX.
        3 | 5 | 24 | 25 => Some("FLEX"),
        7 => Some("SUPERFLEX"),
        16 => Some("DEF"),
        17 => Some("K"),
        20 => Some("BN"),
        21 => Some("IR"),
        23 => Some("FLEX"),
        _ => None,
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|s| s.as_str()).map(str::to_string)
}
