use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::db::DbResult;

/// Date format SQLite's `DATE()` produces, used as the "today" bucket key.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub struct ScoreRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ScoreRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a score and returns its id; the timestamp is assigned by the store.
    #[instrument(skip(self))]
    pub async fn record(&self, score: i64) -> DbResult<i64> {
        let result = sqlx::query("INSERT INTO game_scores (score) VALUES (?)")
            .bind(score)
            .execute(self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    #[instrument(skip(self))]
    pub async fn count_all(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT count(*) FROM game_scores")
            .fetch_one(self.pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn count_on(&self, day: NaiveDate) -> DbResult<i64> {
        Ok(
            sqlx::query_scalar("SELECT count(*) FROM game_scores WHERE DATE(timestamp) = ?")
                .bind(day_key(day))
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Highest score recorded on `day`, or `0` if nothing was recorded that day.
    #[instrument(skip(self))]
    pub async fn high_score_on(&self, day: NaiveDate) -> DbResult<i64> {
        let high: Option<i64> =
            sqlx::query_scalar("SELECT MAX(score) FROM game_scores WHERE DATE(timestamp) = ?")
                .bind(day_key(day))
                .fetch_one(self.pool)
                .await?;

        Ok(high.unwrap_or(0))
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}
