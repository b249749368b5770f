use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub game_pk: i64,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    /// None until the game is final.
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl Game {
    /// Both scores, or None when the game has not been played yet.
    pub fn final_score(&self) -> Option<(i64, i64)> {
        Some((self.home_score?, self.away_score?))
    }
}

/// A game with a known final score. Only these feed the trend rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedGame {
    pub game_pk: i64,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i64,
    pub away_score: i64,
}

impl CompletedGame {
    pub fn from_game(game: &Game) -> Option<Self> {
        let (home_score, away_score) = game.final_score()?;
        Some(Self {
            game_pk: game.game_pk,
            date: game.date,
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            home_score,
            away_score,
        })
    }

    pub fn total_runs(&self) -> i64 {
        self.home_score + self.away_score
    }
}

// ---------------------------------------------------------------------------
// Bet categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetCategory {
    /// Which team wins outright.
    #[serde(rename = "ML")]
    Moneyline,
    /// Whether combined runs exceed a line.
    #[serde(rename = "Over/Under")]
    OverUnder,
}

impl BetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetCategory::Moneyline => "ML",
            BetCategory::OverUnder => "Over/Under",
        }
    }
}

impl std::fmt::Display for BetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trend results
// ---------------------------------------------------------------------------

/// One qualifying game for a rule and whether the predicted side came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendMatch {
    pub game_pk: i64,
    pub win: bool,
}

/// Outcome of scanning the full history with a single rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    pub description: &'static str,
    pub bet_category: BetCategory,
    pub matches: Vec<TrendMatch>,
}

impl TrendReport {
    pub fn sample_size(&self) -> usize {
        self.matches.len()
    }

    pub fn wins(&self) -> usize {
        self.matches.iter().filter(|m| m.win).count()
    }

    /// 100 × wins / sample size. None for an empty report.
    pub fn win_pct(&self) -> Option<f64> {
        if self.matches.is_empty() {
            return None;
        }
        Some(100.0 * self.wins() as f64 / self.matches.len() as f64)
    }

    /// Aggregate row followed by one row per match. Empty reports produce no rows.
    pub fn to_rows(&self) -> Vec<TrendResult> {
        let Some(win_pct) = self.win_pct() else {
            return Vec::new();
        };
        let sample_size = self.sample_size() as i64;

        let row = |game_pk: Option<i64>, win: Option<bool>| TrendResult {
            description: self.description.to_string(),
            bet_category: self.bet_category.to_string(),
            win_pct,
            sample_size,
            game_pk,
            win,
        };

        let mut rows = Vec::with_capacity(self.matches.len() + 1);
        rows.push(row(None, None));
        rows.extend(self.matches.iter().map(|m| row(Some(m.game_pk), Some(m.win))));
        rows
    }
}

/// A persisted trend row: an aggregate when `game_pk` is None, otherwise tied to one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub description: String,
    pub bet_category: String,
    pub win_pct: f64,
    pub sample_size: i64,
    pub game_pk: Option<i64>,
    pub win: Option<bool>,
}

impl TrendResult {
    #[cfg(test)]
    pub fn is_aggregate(&self) -> bool {
        self.game_pk.is_none()
    }
}
