use std::str::FromStr;

use crate::error::{AppError, Result};

pub const MLB_API_URL: &str = "https://statsapi.mlb.com/api/v1";

/// MLB regular league play in the Stats API.
pub const MLB_SPORT_ID: u32 = 1;

/// Upstream request timeout (seconds) when HTTP_TIMEOUT_SECS is not set.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Days of history pulled on every refresh, ending today.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Upper bound on LOOKBACK_DAYS, ten seasons.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Fixed parameters of the hard-coded trend rules.
pub mod trend_params {
    use chrono::Weekday;

    /// Home team streak needed before a Sunday home game qualifies.
    pub const HOME_LOSS_STREAK: u32 = 2;
    pub const HOME_STREAK_WEEKDAY: Weekday = Weekday::Sun;

    /// Away-only losing streak needed before a Tuesday road game qualifies.
    pub const AWAY_LOSS_STREAK: u32 = 3;
    pub const AWAY_STREAK_WEEKDAY: Weekday = Weekday::Tue;

    /// Runs scored in a game that stand in for a "2+ home run" game.
    /// The schedule feed carries no per-game home run counts.
    pub const POWER_PROXY_MIN_RUNS: i64 = 5;
    pub const POWER_PROXY_SIGNAL: u32 = 2;
    pub const POWER_SIGNAL_THRESHOLD: u32 = 2;

    /// Combined runs a game must exceed for the over to hit.
    pub const OVER_LINE: i64 = 8;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mlb_api_url: String,
    pub sport_id: u32,
    /// Size of the schedule window ending today (LOOKBACK_DAYS)
    pub lookback_days: i64,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    pub http_timeout_secs: u64,
    /// Run one refresh cycle before the API starts serving (REFRESH_ON_START)
    pub refresh_on_start: bool,
    /// Background refresh period in seconds, 0 = manual only (REFRESH_INTERVAL_SECS)
    pub refresh_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookback_days: i64 = parse_var(&lookup, "LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?;
        if !(0..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(AppError::Config(format!(
                "LOOKBACK_DAYS must be between 0 and {MAX_LOOKBACK_DAYS}, got {lookback_days}"
            )));
        }

        Ok(Self {
            mlb_api_url: lookup("MLB_API_URL")
                .unwrap_or_else(|| MLB_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            sport_id: parse_var(&lookup, "SPORT_ID", MLB_SPORT_ID)?,
            lookback_days,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db_path: lookup("DB_PATH").unwrap_or_else(|| "mlb_trends.db".to_string()),
            api_port: parse_var(&lookup, "API_PORT", 3000)?,
            http_timeout_secs: parse_var(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            refresh_on_start: parse_var(&lookup, "REFRESH_ON_START", true)?,
            refresh_interval_secs: parse_var(&lookup, "REFRESH_INTERVAL_SECS", 0)?,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw:?}"))),
    }
}
