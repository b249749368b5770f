use tracing::{debug, info};

use crate::db::models::GameRow;
use crate::db::{GameStore, TrendStore};
use crate::error::Result;
use crate::trends::rules::TrendRule;
use crate::types::{CompletedGame, Game, TrendReport, TrendResult};

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct EvaluationSummary {
    pub games_scanned: usize,
    pub completed_games: usize,
    /// Rules that produced at least one match.
    pub rules_matched: usize,
    pub rows_written: usize,
}

/// Run every rule over `games`. Incomplete games are dropped; the rest are sorted by
/// date then `game_pk` so the result does not depend on input order.
pub fn evaluate(games: &[Game]) -> Vec<TrendReport> {
    let mut completed: Vec<CompletedGame> = games.iter().filter_map(CompletedGame::from_game).collect();
    completed.sort_by(|a, b| a.date.cmp(&b.date).then(a.game_pk.cmp(&b.game_pk)));

    TrendRule::ALL.iter().map(|rule| rule.scan(&completed)).collect()
}

/// Flatten reports into trend rows, rule by rule.
pub fn report_rows(reports: &[TrendReport]) -> Vec<TrendResult> {
    reports.iter().flat_map(TrendReport::to_rows).collect()
}

/// Reads the game history, evaluates every rule and replaces the trend table.
pub struct TrendEvaluator {
    games: GameStore,
    trends: TrendStore,
}

impl TrendEvaluator {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            games: GameStore::new(pool.clone()),
            trends: TrendStore::new(pool),
        }
    }

    /// A malformed date anywhere in the history aborts the run before anything is
    /// written, leaving the previous trend rows in place.
    pub async fn run(&self) -> Result<EvaluationSummary> {
        let rows = self.games.all_rows_ordered().await?;
        let games_scanned = rows.len();
        let games = rows
            .into_iter()
            .map(GameRow::into_game)
            .collect::<Result<Vec<Game>>>()?;

        let reports = evaluate(&games);
        for report in &reports {
            debug!(
                rule = report.description,
                sample_size = report.sample_size(),
                wins = report.wins(),
                "rule scanned",
            );
        }

        let trend_rows = report_rows(&reports);
        let rows_written = self.trends.replace_all(&trend_rows).await?;

        let summary = EvaluationSummary {
            games_scanned,
            completed_games: games.iter().filter(|g| g.final_score().is_some()).count(),
            rules_matched: reports.iter().filter(|r| !r.matches.is_empty()).count(),
            rows_written,
        };
        info!(
            event = "TRENDS_EVALUATED",
            games = summary.games_scanned,
            completed = summary.completed_games,
            rules_matched = summary.rules_matched,
            rows = summary.rows_written,
            "Trend evaluation complete: {} rows from {} completed games",
            summary.rows_written,
            summary.completed_games,
        );
        Ok(summary)
    }
}
