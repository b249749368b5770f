use crate::db::models::TrendRow;
use crate::error::Result;
use crate::types::TrendResult;

/// The `trends` table. Fully regenerated on every evaluation.
#[derive(Clone)]
pub struct TrendStore {
    pool: sqlx::SqlitePool,
}

impl TrendStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Delete every trend row and insert `rows` in one transaction, so readers see either
    /// the previous trend set or the new one.
    pub async fn replace_all(&self, rows: &[TrendResult]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM trends").execute(&mut *tx).await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO trends (description, bet_category, win_pct, sample_size, game_pk, win)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.description)
            .bind(&row.bet_category)
            .bind(row.win_pct)
            .bind(row.sample_size)
            .bind(row.game_pk)
            .bind(row.win)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows.len())
    }

    /// Rows with no game reference, in insertion order.
    pub async fn aggregates(&self) -> Result<Vec<TrendResult>> {
        let rows = sqlx::query_as::<_, TrendRow>(
            r#"
            SELECT description, bet_category, win_pct, sample_size, game_pk, win
            FROM trends
            WHERE game_pk IS NULL
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TrendResult::from).collect())
    }

    /// Per-game rows for one game, in insertion order.
    pub async fn for_game(&self, game_pk: i64) -> Result<Vec<TrendResult>> {
        let rows = sqlx::query_as::<_, TrendRow>(
            r#"
            SELECT description, bet_category, win_pct, sample_size, game_pk, win
            FROM trends
            WHERE game_pk = ?
            ORDER BY id ASC
            "#,
        )
        .bind(game_pk)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TrendResult::from).collect())
    }

    /// Every row, aggregates and per-game, in insertion order.
    #[cfg(test)]
    pub async fn all(&self) -> Result<Vec<TrendResult>> {
        let rows = sqlx::query_as::<_, TrendRow>(
            r#"
            SELECT description, bet_category, win_pct, sample_size, game_pk, win
            FROM trends
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TrendResult::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn trend(description: &str, game_pk: Option<i64>, win: Option<bool>) -> TrendResult {
        TrendResult {
            description: description.to_string(),
            bet_category: "ML".to_string(),
            win_pct: 50.0,
            sample_size: 2,
            game_pk,
            win,
        }
    }

    #[tokio::test]
    async fn replace_all_discards_previous_rows() {
        let store = TrendStore::new(test_pool().await);

        store
            .replace_all(&[
                trend("old", None, None),
                trend("old", Some(1), Some(true)),
                trend("old", Some(2), Some(false)),
            ])
            .await
            .unwrap();
        store.replace_all(&[trend("new", None, None)]).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description, "new");
    }

    #[tokio::test]
    async fn aggregates_and_per_game_are_split_by_game_reference() {
        let store = TrendStore::new(test_pool().await);
        store
            .replace_all(&[
                trend("a", None, None),
                trend("a", Some(7), Some(true)),
                trend("b", None, None),
                trend("b", Some(7), Some(false)),
                trend("b", Some(8), Some(true)),
            ])
            .await
            .unwrap();

        let aggregates = store.aggregates().await.unwrap();
        let names: Vec<&str> = aggregates.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(aggregates.iter().all(|t| t.is_aggregate() && t.win.is_none()));

        let for_seven = store.for_game(7).await.unwrap();
        assert_eq!(for_seven.len(), 2);
        assert_eq!(for_seven[0].win, Some(true));
        assert_eq!(for_seven[1].win, Some(false));

        assert!(store.for_game(99).await.unwrap().is_empty());
    }
}
