//! Read-only projections served to the API and dashboard.
//!
//! `trends_for_games` returns per-game rows only. Global aggregates are a separate
//! projection (`all_aggregate_trends`) so a game never shows a trend it did not match.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::db::{GameStore, TrendStore};
use crate::error::Result;
use crate::types::{Game, TrendResult};

pub async fn list_games_on(pool: &sqlx::SqlitePool, date: NaiveDate) -> Result<Vec<Game>> {
    GameStore::new(pool.clone()).games_on(date).await
}

/// Map every requested game to the trends it matched. Games with no match map to an
/// empty list.
pub async fn trends_for_games(
    pool: &sqlx::SqlitePool,
    games: &[Game],
) -> Result<BTreeMap<i64, Vec<TrendResult>>> {
    let store = TrendStore::new(pool.clone());
    let mut map = BTreeMap::new();
    for game in games {
        map.insert(game.game_pk, store.for_game(game.game_pk).await?);
    }
    Ok(map)
}

pub async fn all_aggregate_trends(pool: &sqlx::SqlitePool) -> Result<Vec<TrendResult>> {
    TrendStore::new(pool.clone()).aggregates().await
}
