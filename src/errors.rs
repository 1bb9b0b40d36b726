use thiserror::Error;

/// Failure extracting a matchup from a stream display name
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Display name has no ":" description part at all (e.g. "USA NFL Sunday 708")
    #[error("no description in stream name: {0}")]
    NoDescription(String),

    /// Description present but no two known team names were found
    #[error("no team matchup recognized in: {0}")]
    NoMatchup(String),

    /// Matchup found but the time token is missing or malformed
    #[error("no game time token in: {0}")]
    NoTimeToken(String),
}

/// Failure resolving a parsed matchup against the schedule table
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("no schedule row in the current window for {team1} / {team2}")]
    NoGameInWindow { team1: String, team2: String },

    #[error("unknown team name: {0}")]
    UnknownTeam(String),

    #[error("schedule table is empty for season {0}")]
    EmptySchedule(i32),
}

/// Upstream API failure for a single request inside a batched fetch
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    #[error("request for {id} timed out after {seconds}s")]
    Timeout { id: String, seconds: u64 },

    #[error("request for {id} failed after {attempts} attempts: {reason}")]
    Exhausted {
        id: String,
        attempts: u32,
        reason: String,
    },

    #[error("server returned {status} for {id}")]
    Status { id: String, status: u16 },
}

/// Configuration problems surfaced at client construction time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("missing [{0}] section in config")]
    MissingSection(String),

    #[error("unknown IPTV provider: {0}")]
    UnknownProvider(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
