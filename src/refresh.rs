use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{Days, NaiveDate};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::config::Config;
use crate::db::GameStore;
use crate::error::{AppError, Result};
use crate::fetcher::{FetchStats, ScheduleFetcher};
use crate::trends::{EvaluationSummary, TrendEvaluator};

#[derive(Debug, Clone, serde::Serialize)]
pub struct RefreshSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub fetch: FetchStats,
    pub games_upserted: usize,
    pub evaluation: EvaluationSummary,
}

/// One refresh cycle: fetch the recent schedule window, upsert it, then regenerate trends.
/// Cycles never overlap; a trigger while one is running is rejected.
pub struct Refresher {
    cfg: Config,
    fetcher: ScheduleFetcher,
    games: GameStore,
    evaluator: TrendEvaluator,
    health: Arc<HealthState>,
}

impl Refresher {
    pub fn new(cfg: Config, pool: sqlx::SqlitePool, health: Arc<HealthState>) -> Result<Self> {
        let fetcher = ScheduleFetcher::new(&cfg)?;
        Ok(Self {
            cfg,
            fetcher,
            games: GameStore::new(pool.clone()),
            evaluator: TrendEvaluator::new(pool),
            health,
        })
    }

    /// Run one cycle for the window ending today (local time).
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        self.refresh_for(chrono::Local::now().date_naive()).await
    }

    pub async fn refresh_for(&self, today: NaiveDate) -> Result<RefreshSummary> {
        let Some(_guard) = self.health.try_begin_refresh() else {
            return Err(AppError::RefreshInProgress);
        };

        let result = self.run_cycle(today).await;
        match &result {
            Ok(summary) => {
                self.health.record_success(now_secs());
                info!(
                    event = "REFRESH",
                    games = summary.games_upserted,
                    trend_rows = summary.evaluation.rows_written,
                    "Refresh complete: {} games upserted, {} trend rows",
                    summary.games_upserted,
                    summary.evaluation.rows_written,
                );
            }
            Err(e) => {
                self.health.record_failure(now_secs(), e.to_string());
                error!(event = "REFRESH_FAILED", "Refresh failed: {e}");
            }
        }
        result
    }

    async fn run_cycle(&self, today: NaiveDate) -> Result<RefreshSummary> {
        let start_date = window_start(today, self.cfg.lookback_days)?;
        let (games, fetch) = self.fetcher.fetch_window(start_date, today).await?;
        let games_upserted = self.games.upsert_games(&games).await?;
        let evaluation = self.evaluator.run().await?;

        Ok(RefreshSummary {
            start_date,
            end_date: today,
            fetch,
            games_upserted,
            evaluation,
        })
    }

    /// Periodic refresh loop. Returns immediately when REFRESH_INTERVAL_SECS is 0.
    /// A failed cycle is logged and the next one runs on schedule.
    pub async fn run(self: Arc<Self>) {
        if self.cfg.refresh_interval_secs == 0 {
            return;
        }

        let mut ticker = refresh_ticker(self.cfg.refresh_interval_secs);
        ticker.tick().await; // skip immediate first tick, startup refresh is separate

        loop {
            ticker.tick().await;
            // other failures are already logged and recorded in health
            if let Err(AppError::RefreshInProgress) = self.refresh().await {
                warn!("Scheduled refresh skipped: another refresh is running");
            }
        }
    }
}

/// A cycle longer than the period pushes the next tick back instead of bursting.
fn refresh_ticker(period_secs: u64) -> Interval {
    let mut ticker = interval(Duration::from_secs(period_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// First day of the `lookback_days` window ending on `today`.
fn window_start(today: NaiveDate, lookback_days: i64) -> Result<NaiveDate> {
    u64::try_from(lookback_days)
        .ok()
        .and_then(|days| today.checked_sub_days(Days::new(days)))
        .ok_or_else(|| {
            AppError::Config(format!("lookback of {lookback_days} days from {today} is out of range"))
        })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
