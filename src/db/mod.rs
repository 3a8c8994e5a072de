use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use thiserror::Error;
use tracing::instrument;

pub mod models;
pub mod repositories;
pub mod schema;

pub mod prelude {
    pub use crate::db::DbError;
    pub use crate::db::models::GameStats;
    pub use crate::db::repositories::score::ScoreRepository;
}

/// Upper bound on pooled connections; SQLite serializes writers regardless, this only bounds
/// concurrent readers.
pub const MAX_CONNECTIONS: u32 = 8;

/// Opens (creating if needed) the score store at `path`, applies the connection pragmas and
/// makes sure the schema exists.
///
/// Any error here means the store is unusable and the caller should not start serving.
#[instrument]
pub async fn open(path: &str) -> DbResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(schema::connect_options(path))
        .await
        .map_err(DbError::Connect)?;

    schema::create_tables(&pool).await?;
    tracing::info!(path, "score store ready");

    Ok(pool)
}

pub type DbResult<T> = core::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unable to open score store: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("unable to create schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),
}
