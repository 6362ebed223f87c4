use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::source::model::{SourceLeague, SourceMatchup, SourcePlayer};
use crate::source::LeagueSource;
use crate::types::Platform;

/// League source backed by an in-memory graph. Serves the built-in sample
/// league and test fixtures.
#[derive(Debug, Clone)]
pub struct MemorySource {
    platform: Platform,
    league: Option<SourceLeague>,
    scoreboards: HashMap<u32, Vec<SourceMatchup>>,
    free_agents: Option<Vec<SourcePlayer>>,
    failing_weeks: HashSet<u32>,
}

impl MemorySource {
    pub fn new(platform: Platform, league: SourceLeague) -> Self {
        Self {
            platform,
            league: Some(league),
            scoreboards: HashMap::new(),
            free_agents: None,
            failing_weeks: HashSet::new(),
        }
    }

    /// A source whose league lookup always fails.
    pub fn unreachable(platform: Platform) -> Self {
        Self {
            platform,
            league: None,
            scoreboards: HashMap::new(),
            free_agents: None,
            failing_weeks: HashSet::new(),
        }
    }

    pub fn with_week(mut self, week: u32, matchups: Vec<SourceMatchup>) -> Self {
        self.scoreboards.insert(week, matchups);
        self
    }

    pub fn with_free_agents(mut self, players: Vec<SourcePlayer>) -> Self {
        self.free_agents = Some(players);
        self
    }

    /// Scoreboard calls for `week` fail.
    pub fn with_failing_week(mut self, week: u32) -> Self {
        self.failing_weeks.insert(week);
        self
    }
}

#[async_trait]
impl LeagueSource for MemorySource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_league(&self, league_id: i64, year: i32) -> Result<SourceLeague, SourceError> {
        self.league
            .clone()
            .ok_or(SourceError::LeagueNotFound { league_id, year })
    }

    async fn scoreboard(
        &self,
        _league: &SourceLeague,
        week: u32,
    ) -> Result<Vec<SourceMatchup>, SourceError> {
        if self.failing_weeks.contains(&week) {
            return Err(SourceError::Malformed(format!("scoreboard for week {week} unavailable")));
        }
        Ok(self.scoreboards.get(&week).cloned().unwrap_or_default())
    }

    async fn free_agents(&self, _league: &SourceLeague) -> Result<Vec<SourcePlayer>, SourceError> {
        self.free_agents
            .clone()
            .ok_or(SourceError::Unsupported("free agents"))
    }
}
