use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use tracing::instrument;

use crate::db::{DbError, DbResult};

/// How long a connection waits on a locked database before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Negative values are in KiB, so this is roughly 64MB of page cache per connection.
pub const CACHE_SIZE_KIB: &str = "-64000";

const CREATE_SCORES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS game_scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        score INTEGER,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_DATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_game_date ON game_scores(timestamp)";

const CREATE_SCORE_DATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_game_score_date ON game_scores(score, timestamp)";

/// Connection options shared by every pooled connection.
///
/// Pragmas are per-connection in SQLite (apart from `journal_mode`, which sticks to the file),
/// so they live here rather than being executed once against the pool.
pub fn connect_options(path: &str) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .pragma("cache_size", CACHE_SIZE_KIB)
}

#[instrument(skip(pool))]
pub async fn create_tables(pool: &SqlitePool) -> DbResult<()> {
    for statement in [
        CREATE_SCORES_TABLE,
        CREATE_DATE_INDEX,
        CREATE_SCORE_DATE_INDEX,
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(DbError::Schema)?;
    }

    tracing::debug!("game_scores schema in place");
    Ok(())
}
