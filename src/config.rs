use crate::error::{AppError, Result};

pub const ESPN_API_URL: &str = "https://lm-api-reads.fantasy.espn.com/apis/v3/games/ffl";

pub const DEFAULT_LEAGUE_ID: i64 = 24481082;
pub const DEFAULT_SEASON_YEAR: i32 = 2024;

/// Last week of the regular season; scoreboard walk stops here when the
/// source does not report a current week.
pub const REGULAR_SEASON_WEEKS: u32 = 17;

/// Highest week a fantasy matchup may carry (regular season + playoffs).
pub const MAX_WEEK: u32 = 21;

/// Roster slot used when an entry's declared slot has no row.
pub const BENCH_SLOT: &str = "BN";

/// Roster slot for a starter whose lineup slot has no label.
pub const FLEX_SLOT: &str = "FLEX";

/// ESPN lineup slot ids that mean "not starting".
pub const BENCH_LINEUP_SLOT_ID: i64 = 20;
pub const IR_LINEUP_SLOT_ID: i64 = 21;

pub const UNKNOWN_OWNER: &str = "Unknown Owner";

/// When the startup ETL runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtlOnStartup {
    /// Only when `fantasy_teams` is empty.
    Empty,
    Always,
    Never,
}

impl std::str::FromStr for EtlOnStartup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(EtlOnStartup::Empty),
            "always" => Ok(EtlOnStartup::Always),
            "never" => Ok(EtlOnStartup::Never),
            other => Err(AppError::Config(format!(
                "ETL_ON_STARTUP must be one of empty|always|never, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub league_id: i64,
    pub season_year: i32,
    pub espn_api_url: String,
    /// Private league cookies (ESPN_S2 / ESPN_SWID).
    pub espn_s2: Option<String>,
    pub espn_swid: Option<String>,
    pub db_path: String,
    pub api_port: u16,
    pub log_level: String,
    pub etl_on_startup: EtlOnStartup,
    /// Load the built-in sample league when the ETL run fails.
    pub seed_on_failure: bool,
    /// Max free agents requested from the source per run.
    pub free_agent_limit: u32,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            league_id: std::env::var("ESPN_LEAGUE_ID")
                .unwrap_or_else(|_| DEFAULT_LEAGUE_ID.to_string())
                .parse::<i64>()
                .map_err(|_| AppError::Config("ESPN_LEAGUE_ID must be an integer".to_string()))?,
            season_year: std::env::var("ESPN_YEAR")
                .unwrap_or_else(|_| DEFAULT_SEASON_YEAR.to_string())
                .parse::<i32>()
                .map_err(|_| AppError::Config("ESPN_YEAR must be an integer".to_string()))?,
            espn_api_url: std::env::var("ESPN_API_URL")
                .unwrap_or_else(|_| ESPN_API_URL.to_string()),
            espn_s2: non_empty_var("ESPN_S2"),
            espn_swid: non_empty_var("ESPN_SWID"),
            db_path: std::env::var("SQLITE_DB_PATH")
                .unwrap_or_else(|_| "data/fantasy_football.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            etl_on_startup: std::env::var("ETL_ON_STARTUP")
                .unwrap_or_else(|_| "empty".to_string())
                .parse()?,
            seed_on_failure: parse_bool(
                "SEED_ON_FAILURE",
                &std::env::var("SEED_ON_FAILURE").unwrap_or_default(),
            )?,
            free_agent_limit: std::env::var("FREE_AGENT_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse::<u32>()
                .unwrap_or(50),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .unwrap_or(30),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(AppError::Config(format!("{key} must be a boolean, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etl_mode_parses_case_insensitively() {
        assert_eq!("Always".parse::<EtlOnStartup>().unwrap(), EtlOnStartup::Always);
        assert_eq!(" never ".parse::<EtlOnStartup>().unwrap(), EtlOnStartup::Never);
        assert!("sometimes".parse::<EtlOnStartup>().is_err());
    }

    #[test]
    fn bool_flags() {
        assert!(!parse_bool("X", "").unwrap());
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
