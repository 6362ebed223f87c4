//! Built-in sample league.
//!
//! Loaded when the live ETL run fails and `SEED_ON_FAILURE` is set, so the
//! API has something to serve during development. The sample goes through
//! the same normalize/persist path as a live league.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::EtlError;
use crate::etl::{run_etl, EtlReport};
use crate::source::{
    MemorySource, SourceLeague, SourceMatchup, SourceOwner, SourcePlayer, SourceScoring,
    SourceSettings, SourceTeam,
};
use crate::types::Platform;

pub const SAMPLE_LEAGUE_ID: i64 = 1;
pub const SAMPLE_YEAR: i32 = 2024;
const SAMPLE_WEEKS: u32 = 3;

/// Owner, team name, wins, losses, ties, points for, points against.
const TEAMS: &[(&str, &str, u32, u32, u32, f64, f64)] = &[
    ("John Smith", "The Smith Squad", 10, 4, 0, 2150.5, 1950.2),
    ("Sarah Johnson", "Johnson's Jets", 9, 5, 0, 2089.3, 1980.1),
    ("Mike Davis", "Davis Dynasty", 8, 6, 0, 2006.1, 2010.5),
    ("Lisa Wilson", "Wilson Warriors", 8, 6, 0, 1995.8, 1990.3),
    ("Tom Brown", "Brown's Brigade", 7, 7, 0, 1952.4, 2020.7),
    ("Amy Garcia", "Garcia's Giants", 7, 7, 0, 1948.2, 2055.9),
    ("David Miller", "Miller's Men", 6, 8, 0, 1890.6, 2100.3),
    ("Jennifer Taylor", "Taylor's Titans", 6, 8, 0, 1875.1, 2125.8),
    ("Robert Anderson", "Anderson's Army", 5, 9, 0, 1820.4, 2180.2),
    ("Maria Martinez", "Martinez's Mavens", 5, 9, 0, 1805.7, 2195.6),
    ("James Thompson", "Thompson's Team", 4, 10, 0, 1750.8, 2250.4),
    ("Patricia White", "White's Warriors", 3, 11, 0, 1695.2, 2305.9),
];

/// Starting slots filled per team, in draft order.
const LINEUP: &[(&str, usize)] = &[("QB", 1), ("RB", 2), ("WR", 2), ("TE", 1), ("K", 1), ("DEF", 1)];

const PLAYERS: &[(&str, &str, &str)] = &[
    ("Patrick Mahomes", "QB", "KC"),
    ("Josh Allen", "QB", "BUF"),
    ("Lamar Jackson", "QB", "BAL"),
    ("Jalen Hurts", "QB", "PHI"),
    ("Justin Herbert", "QB", "LAC"),
    ("Tua Tagovailoa", "QB", "MIA"),
    ("Dak Prescott", "QB", "DAL"),
    ("Kirk Cousins", "QB", "MIN"),
    ("Geno Smith", "QB", "SEA"),
    ("Derek Carr", "QB", "NO"),
    ("Daniel Jones", "QB", "NYG"),
    ("Russell Wilson", "QB", "DEN"),
    ("Aaron Rodgers", "QB", "NYJ"),
    ("Trevor Lawrence", "QB", "JAX"),
    ("Kyler Murray", "QB", "ARI"),
    ("Christian McCaffrey", "RB", "SF"),
    ("Saquon Barkley", "RB", "PHI"),
    ("Derrick Henry", "RB", "BAL"),
    ("Nick Chubb", "RB", "CLE"),
    ("Austin Ekeler", "RB", "WAS"),
    ("Alvin Kamara", "RB", "NO"),
    ("Joe Mixon", "RB", "HOU"),
    ("Rachaad White", "RB", "TB"),
    ("Breece Hall", "RB", "NYJ"),
    ("Travis Etienne", "RB", "JAX"),
    ("Kenneth Walker", "RB", "SEA"),
    ("Tony Pollard", "RB", "TEN"),
    ("D'Andre Swift", "RB", "CHI"),
    ("Najee Harris", "RB", "PIT"),
    ("Javonte Williams", "RB", "DEN"),
    ("James Cook", "RB", "BUF"),
    ("Rhamondre Stevenson", "RB", "NE"),
    ("Josh Jacobs", "RB", "GB"),
    ("Isiah Pacheco", "RB", "KC"),
    ("Bijan Robinson", "RB", "ATL"),
    ("De'Von Achane", "RB", "MIA"),
    ("Kyren Williams", "RB", "LAR"),
    ("David Montgomery", "RB", "DET"),
    ("Jahmyr Gibbs", "RB", "DET"),
    ("Alexander Mattison", "RB", "LV"),
    ("Tyreek Hill", "WR", "MIA"),
    ("CeeDee Lamb", "WR", "DAL"),
    ("Amon-Ra St. Brown", "WR", "DET"),
    ("Stefon Diggs", "WR", "HOU"),
    ("Davante Adams", "WR", "LV"),
    ("AJ Brown", "WR", "PHI"),
    ("Cooper Kupp", "WR", "LAR"),
    ("Mike Evans", "WR", "TB"),
    ("DK Metcalf", "WR", "SEA"),
    ("Deebo Samuel", "WR", "SF"),
    ("Ja'Marr Chase", "WR", "CIN"),
    ("Puka Nacua", "WR", "LAR"),
    ("Keenan Allen", "WR", "CHI"),
    ("DeVonta Smith", "WR", "PHI"),
    ("Chris Olave", "WR", "NO"),
    ("Garrett Wilson", "WR", "NYJ"),
    ("Amari Cooper", "WR", "CLE"),
    ("Calvin Ridley", "WR", "TEN"),
    ("Terry McLaurin", "WR", "WAS"),
    ("DJ Moore", "WR", "CHI"),
    ("Tee Higgins", "WR", "CIN"),
    ("Jaylen Waddle", "WR", "MIA"),
    ("Michael Pittman", "WR", "IND"),
    ("Brandon Aiyuk", "WR", "SF"),
    ("Diontae Johnson", "WR", "PIT"),
    ("Tyler Lockett", "WR", "SEA"),
    ("Travis Kelce", "TE", "KC"),
    ("Sam LaPorta", "TE", "DET"),
    ("T.J. Hockenson", "TE", "MIN"),
    ("George Kittle", "TE", "SF"),
    ("Mark Andrews", "TE", "BAL"),
    ("Kyle Pitts", "TE", "ATL"),
    ("Evan Engram", "TE", "JAX"),
    ("Dallas Goedert", "TE", "PHI"),
    ("David Njoku", "TE", "CLE"),
    ("Jake Ferguson", "TE", "DAL"),
    ("Cole Kmet", "TE", "CHI"),
    ("Pat Freiermuth", "TE", "PIT"),
    ("Tyler Higbee", "TE", "LAR"),
    ("Dalton Schultz", "TE", "HOU"),
    ("Justin Tucker", "K", "BAL"),
    ("Harrison Butker", "K", "KC"),
    ("Evan McPherson", "K", "CIN"),
    ("Younghoe Koo", "K", "ATL"),
    ("Tyler Bass", "K", "BUF"),
    ("Daniel Carlson", "K", "LV"),
    ("Jake Moody", "K", "SF"),
    ("Brandon McManus", "K", "WAS"),
    ("Chris Boswell", "K", "PIT"),
    ("Cameron Dicker", "K", "LAC"),
    ("Matt Gay", "K", "IND"),
    ("Greg Zuerlein", "K", "NYJ"),
    ("Jason Sanders", "K", "MIA"),
    ("San Francisco 49ers", "DEF", "SF"),
    ("Dallas Cowboys", "DEF", "DAL"),
    ("Baltimore Ravens", "DEF", "BAL"),
    ("Buffalo Bills", "DEF", "BUF"),
    ("Philadelphia Eagles", "DEF", "PHI"),
    ("Pittsburgh Steelers", "DEF", "PIT"),
    ("Cleveland Browns", "DEF", "CLE"),
    ("Miami Dolphins", "DEF", "MIA"),
    ("Kansas City Chiefs", "DEF", "KC"),
    ("New York Jets", "DEF", "NYJ"),
    ("Denver Broncos", "DEF", "DEN"),
    ("New Orleans Saints", "DEF", "NO"),
    ("Seattle Seahawks", "DEF", "SEA"),
];

/// ESPN pro team id for a team code, matching the `nfl_teams` seed.
fn pro_team_id(code: &str) -> Option<i64> {
    let id = match code {
        "ATL" => 1,
        "BUF" => 2,
        "CHI" => 3,
        "CIN" => 4,
        "CLE" => 5,
        "DAL" => 6,
        "DEN" => 7,
        "DET" => 8,
        "GB" => 9,
        "TEN" => 10,
        "IND" => 11,
        "KC" => 12,
        "LV" => 13,
        "LAR" => 14,
        "MIA" => 15,
        "MIN" => 16,
        "NE" => 17,
        "NO" => 18,
        "NYG" => 19,
        "NYJ" => 20,
        "PHI" => 21,
        "ARI" => 22,
        "PIT" => 23,
        "LAC" => 24,
        "SF" => 25,
        "SEA" => 26,
        "TB" => 27,
        "WAS" => 28,
        "CAR" => 29,
        "JAX" => 30,
        "BAL" => 33,
        "HOU" => 34,
        _ => return None,
    };
    Some(id)
}

fn sample_player(index: usize) -> SourcePlayer {
    let (name, position, team) = PLAYERS[index];
    SourcePlayer {
        player_id: Some(1000 + index as i64),
        name: Some(name.to_string()),
        position: Some(position.to_string()),
        pro_team_id: pro_team_id(team),
        active: Some(true),
        injured: Some(false),
        ..SourcePlayer::default()
    }
}

/// Deals each position round-robin: team `t` takes the next `count`
/// players of that position. Returns per-team rosters and the leftovers.
fn deal_rosters(team_count: usize) -> (Vec<Vec<SourcePlayer>>, Vec<SourcePlayer>) {
    let mut rosters = vec![Vec::new(); team_count];
    let mut dealt = vec![false; PLAYERS.len()];

    for &(position, count) in LINEUP {
        let pool: Vec<usize> = (0..PLAYERS.len())
            .filter(|&i| PLAYERS[i].1 == position)
            .collect();
        for (t, roster) in rosters.iter_mut().enumerate() {
            for slot in 0..count {
                let Some(&i) = pool.get(t * count + slot) else {
                    continue;
                };
                dealt[i] = true;
                roster.push(SourcePlayer {
                    lineup_slot: Some(position.to_string()),
                    starter: Some(true),
                    acquisition_type: Some("Draft".to_string()),
                    ..sample_player(i)
                });
            }
        }
    }

    let free_agents = (0..PLAYERS.len())
        .filter(|&i| !dealt[i])
        .map(sample_player)
        .collect();
    (rosters, free_agents)
}

/// Circle-method pairings for `week` (1-based) over teams `0..n`, `n` even.
fn pairings(n: usize, week: u32) -> Vec<(usize, usize)> {
    let rotation = (week as usize - 1) % (n - 1);
    // Seat 0 stays; the rest rotate.
    let seat = |s: usize| -> usize {
        if s == 0 {
            0
        } else {
            (s - 1 + rotation) % (n - 1) + 1
        }
    };
    (0..n / 2).map(|s| (seat(s), seat(n - 1 - s))).collect()
}

/// Average weekly score over the season, nudged per week so results vary.
fn weekly_score(points_for: f64, games: u32, week: u32, team: usize) -> f64 {
    let avg = points_for / f64::from(games.max(1));
    let swing = ((team as u32 * 7 + week * 13) % 21) as f64 - 10.0;
    ((avg + swing) * 10.0).round() / 10.0
}

pub fn sample_league() -> SourceLeague {
    let (rosters, _) = deal_rosters(TEAMS.len());
    let teams = TEAMS
        .iter()
        .zip(rosters)
        .enumerate()
        .map(|(i, (&(owner, name, w, l, t, pf, pa), roster))| SourceTeam {
            team_id: Some(i as i64 + 1),
            team_name: Some(name.to_string()),
            owners: vec![SourceOwner::Name(owner.to_string())],
            wins: Some(w),
            losses: Some(l),
            ties: Some(t),
            points_for: Some(pf),
            points_against: Some(pa),
            roster,
        })
        .collect();

    SourceLeague {
        league_id: Some(SAMPLE_LEAGUE_ID),
        year: Some(SAMPLE_YEAR),
        settings: Some(SourceSettings {
            name: Some("Sample Fantasy League".to_string()),
            playoff_team_count: Some(6),
            scoring: Some(SourceScoring { reception: Some(1.0) }),
        }),
        teams,
        current_week: Some(SAMPLE_WEEKS),
    }
}

pub fn sample_source() -> MemorySource {
    let (_, free_agents) = deal_rosters(TEAMS.len());
    let mut source =
        MemorySource::new(Platform::Espn, sample_league()).with_free_agents(free_agents);

    for week in 1..=SAMPLE_WEEKS {
        let matchups = pairings(TEAMS.len(), week)
            .into_iter()
            .map(|(home, away)| {
                let games = TEAMS[home].2 + TEAMS[home].3 + TEAMS[home].4;
                let away_games = TEAMS[away].2 + TEAMS[away].3 + TEAMS[away].4;
                SourceMatchup {
                    home_team_id: Some(home as i64 + 1),
                    away_team_id: Some(away as i64 + 1),
                    home_score: Some(weekly_score(TEAMS[home].5, games, week, home)),
                    away_score: Some(weekly_score(TEAMS[away].5, away_games, week, away)),
                    winner_team_id: None,
                    is_playoff: Some(false),
                }
            })
            .collect();
        source = source.with_week(week, matchups);
    }
    source
}

/// Replaces the stored snapshot with the sample league.
pub async fn load_sample_data(pool: &SqlitePool) -> Result<EtlReport, EtlError> {
    info!("Loading sample league data");
    run_etl(&sample_source(), SAMPLE_LEAGUE_ID, SAMPLE_YEAR, pool).await
}
