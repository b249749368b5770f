use chrono::NaiveDate;

use crate::db::models::{GameRow, DATE_FORMAT};
use crate::error::Result;
use crate::types::Game;

/// The `games` table. One row per `game_pk`; writes are upserts.
#[derive(Clone)]
pub struct GameStore {
    pool: sqlx::SqlitePool,
}

impl GameStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite every game in one transaction. Returns the number of rows written.
    /// Odds/line columns are left NULL.
    pub async fn upsert_games(&self, games: &[Game]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for game in games {
            let game_date = game.date.format(DATE_FORMAT).to_string();
            sqlx::query(
                r#"
                INSERT INTO games (game_pk, game_date, home_team, away_team, home_score, away_score)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(game_pk) DO UPDATE SET
                    game_date = excluded.game_date,
                    home_team = excluded.home_team,
                    away_team = excluded.away_team,
                    home_score = excluded.home_score,
                    away_score = excluded.away_score
                "#,
            )
            .bind(game.game_pk)
            .bind(game_date)
            .bind(&game.home_team)
            .bind(&game.away_team)
            .bind(game.home_score)
            .bind(game.away_score)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(games.len())
    }

    /// Every stored game as raw rows, date ascending then `game_pk` ascending.
    /// Dates are not parsed here so callers decide how to treat a malformed one.
    pub async fn all_rows_ordered(&self) -> Result<Vec<GameRow>> {
        let rows = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT game_pk, game_date, home_team, away_team, home_score, away_score
            FROM games
            ORDER BY game_date ASC, game_pk ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn games_on(&self, date: NaiveDate) -> Result<Vec<Game>> {
        let rows = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT game_pk, game_date, home_team, away_team, home_score, away_score
            FROM games
            WHERE game_date = ?
            ORDER BY game_pk ASC
            "#,
        )
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GameRow::into_game).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
