//! Database row types matching `migrations/0001_init.sql`.
//! Used by sqlx for typed queries.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::types::{Game, TrendResult};

/// Calendar date format used in `games.game_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRow {
    pub game_pk: i64,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl GameRow {
    /// Fails on a `game_date` that is not `YYYY-MM-DD`.
    pub fn into_game(self) -> Result<Game> {
        let date = NaiveDate::parse_from_str(&self.game_date, DATE_FORMAT).map_err(|source| {
            AppError::DateParse {
                game_pk: self.game_pk,
                value: self.game_date.clone(),
                source,
            }
        })?;
        Ok(Game {
            game_pk: self.game_pk,
            date,
            home_team: self.home_team,
            away_team: self.away_team,
            home_score: self.home_score,
            away_score: self.away_score,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRow {
    pub description: String,
    pub bet_category: String,
    pub win_pct: f64,
    pub sample_size: i64,
    pub game_pk: Option<i64>,
    pub win: Option<bool>,
}

impl From<TrendRow> for TrendResult {
    fn from(row: TrendRow) -> Self {
        TrendResult {
            description: row.description,
            bet_category: row.bet_category,
            win_pct: row.win_pct,
            sample_size: row.sample_size,
            game_pk: row.game_pk,
            win: row.win,
        }
    }
}
