pub mod espn;
pub mod memory;
pub mod model;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::Platform;

pub use espn::EspnClient;
pub use memory::MemorySource;
pub use model::{
    InjuryStatus, OwnerRecord, SourceLeague, SourceMatchup, SourceOwner, SourcePlayer,
    SourceScoring, SourceSettings, SourceTeam,
};

/// A fantasy platform the ETL can pull a league from.
#[async_trait]
pub trait LeagueSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch_league(&self, league_id: i64, year: i32) -> Result<SourceLeague, SourceError>;

    /// Matchups of one week. `league` is the graph returned by `fetch_league`.
    async fn scoreboard(
        &self,
        league: &SourceLeague,
        week: u32,
    ) -> Result<Vec<SourceMatchup>, SourceError>;

    /// Unrostered players. Sources without a free-agent listing keep the default.
    async fn free_agents(&self, _league: &SourceLeague) -> Result<Vec<SourcePlayer>, SourceError> {
        Err(SourceError::Unsupported("free agents"))
    }
}
