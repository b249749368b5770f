use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::health::HealthState;
use crate::db::models::DATE_FORMAT;
use crate::db::{queries, GameStore};
use crate::error::AppError;
use crate::refresh::{RefreshSummary, Refresher};
use crate::types::{Game, TrendResult};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub refresher: Arc<Refresher>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/games/today", get(get_games))
        .route("/games/today/trends", get(get_games_with_trends))
        .route("/trends", get(get_trends))
        .route("/refresh", post(post_refresh))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
pub struct DateQuery {
    /// `YYYY-MM-DD`; defaults to today in local time.
    pub date: Option<String>,
}

impl DateQuery {
    fn resolve(&self) -> Result<NaiveDate, AppError> {
        match self.date.as_deref() {
            None => Ok(chrono::Local::now().date_naive()),
            Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| AppError::BadRequest(format!("date must be YYYY-MM-DD, got {raw:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub refresh_in_flight: bool,
    pub last_success_at: Option<u64>,
    pub last_failure_at: Option<u64>,
    pub last_error: Option<String>,
    pub total_games: i64,
}

#[derive(Serialize)]
pub struct GameTrendsResponse {
    #[serde(flatten)]
    pub game: Game,
    pub trends: Vec<TrendResult>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>, AppError> {
    let total_games = GameStore::new(state.pool.clone()).count().await?;
    Ok(Json(HealthResponse {
        refresh_in_flight: state.health.refresh_in_flight(),
        last_success_at: state.health.last_success_at(),
        last_failure_at: state.health.last_failure_at(),
        last_error: state.health.last_error(),
        total_games,
    }))
}

async fn get_games(
    State(state): State<ApiState>,
    Query(params): Query<DateQuery>,
) -> Result<Json<Vec<Game>>, AppError> {
    let date = params.resolve()?;
    Ok(Json(queries::list_games_on(&state.pool, date).await?))
}

async fn get_games_with_trends(
    State(state): State<ApiState>,
    Query(params): Query<DateQuery>,
) -> Result<Json<Vec<GameTrendsResponse>>, AppError> {
    let date = params.resolve()?;
    let games = queries::list_games_on(&state.pool, date).await?;
    let mut trends = queries::trends_for_games(&state.pool, &games).await?;

    let body = games
        .into_iter()
        .map(|game| GameTrendsResponse {
            trends: trends.remove(&game.game_pk).unwrap_or_default(),
            game,
        })
        .collect();
    Ok(Json(body))
}

async fn get_trends(State(state): State<ApiState>) -> Result<Json<Vec<TrendResult>>, AppError> {
    Ok(Json(queries::all_aggregate_trends(&state.pool).await?))
}

async fn post_refresh(State(state): State<ApiState>) -> Result<Json<RefreshSummary>, AppError> {
    Ok(Json(state.refresher.refresh().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{test_pool, TrendStore};

    async fn state() -> ApiState {
        let cfg = Config {
            mlb_api_url: "http://127.0.0.1:9/api/v1".to_string(),
            sport_id: 1,
            lookback_days: 7,
            log_level: "info".to_string(),
            db_path: ":memory:".to_string(),
            api_port: 0,
            http_timeout_secs: 2,
            refresh_on_start: false,
            refresh_interval_secs: 0,
        };
        let pool = test_pool().await;
        let health = Arc::new(HealthState::new());
        let refresher = Arc::new(Refresher::new(cfg, pool.clone(), Arc::clone(&health)).unwrap());
        ApiState { pool, refresher, health }
    }

    fn game(game_pk: i64, date: &str) -> Game {
        Game {
            game_pk,
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            home_team: "Seattle Mariners".to_string(),
            away_team: "Oakland Athletics".to_string(),
            home_score: None,
            away_score: None,
        }
    }

    fn trend(game_pk: Option<i64>) -> TrendResult {
        TrendResult {
            description: "Favorites after a shutout loss".to_string(),
            bet_category: "ML".to_string(),
            win_pct: 62.5,
            sample_size: 8,
            game_pk,
            win: game_pk.map(|_| true),
        }
    }

    #[tokio::test]
    async fn games_with_trends_for_requested_date() {
        let state = state().await;
        GameStore::new(state.pool.clone())
            .upsert_games(&[game(1, "2024-06-16"), game(2, "2024-06-16"), game(3, "2024-06-17")])
            .await
            .unwrap();
        TrendStore::new(state.pool.clone())
            .replace_all(&[trend(None), trend(Some(1))])
            .await
            .unwrap();

        let query = DateQuery { date: Some("2024-06-16".to_string()) };
        let Json(body) = get_games_with_trends(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].game.game_pk, 1);
        assert_eq!(body[0].trends.len(), 1);
        assert!(body[1].trends.is_empty());

        let Json(aggregates) = get_trends(State(state)).await.unwrap();
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].sample_size, 8);
    }

    #[tokio::test]
    async fn bad_date_is_a_bad_request() {
        let state = state().await;
        let query = DateQuery { date: Some("16-06-2024".to_string()) };
        let err = get_games(State(state), Query(query)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn health_reports_store_size() {
        let state = state().await;
        GameStore::new(state.pool.clone())
            .upsert_games(&[game(1, "2024-06-16")])
            .await
            .unwrap();
        let Json(health) = get_health(State(state)).await.unwrap();
        assert_eq!(health.total_games, 1);
        assert!(!health.refresh_in_flight);
        assert_eq!(health.last_success_at, None);
    }
}
