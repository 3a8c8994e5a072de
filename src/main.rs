use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use crate::api::server::{AppState, ServerError};
use crate::db::DbError;
use crate::util::env::{Env, EnvErr};

mod api;
mod db;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error("configuration error: {0}")]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> ExitCode {
    util::tracing::register();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal error, shutting down");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let env = Env::new()?;
    tracing::info!(
        port = env.port,
        mount = %env.mount,
        database = %env.database_path,
        index = %env.index_path,
        "starting score tracker"
    );

    let db_pool = db::open(&env.database_path).await?;
    let state = Arc::new(AppState::new(db_pool, env.index_path.clone()));

    api::server::start_server(&env, state).await?;
    Ok(())
}
