use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use http::StatusCode;
use http::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::instrument;

use crate::api::server::{AppState, RouteError};
use crate::db::prelude::{DbError, GameStats, ScoreRepository};

/// `POST {mount}/score/{score}`
#[instrument(skip(state))]
pub async fn record_score(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<&'static str, RouteError> {
    let score = raw
        .parse::<i64>()
        .map_err(|_| RouteError::InvalidScore(raw))?;

    match ScoreRepository::new(&state.db_pool).record(score).await {
        Ok(id) => {
            tracing::debug!(id, score, "score recorded");
            Ok("OK")
        }
        Err(e) => {
            tracing::error!(handler = "record_score", error = %e, "failed to insert score");
            Err(RouteError::RecordFailed(e))
        }
    }
}

/// `GET {mount}/stats`
#[instrument(skip(state))]
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Response, RouteError> {
    let today = Utc::now().date_naive();
    let stats = collect_stats(&ScoreRepository::new(&state.db_pool), today).await;

    json_response(StatusCode::OK, &stats).inspect_err(|e| {
        tracing::error!(handler = "stats", error = %e, "failed to send JSON");
    })
}

/// Runs the three stats queries one after the other. A failing query is logged and leaves its
/// field at zero; the others still run.
pub async fn collect_stats(repo: &ScoreRepository<'_>, day: NaiveDate) -> GameStats {
    let mut stats = GameStats::default();

    match repo.count_all().await {
        Ok(count) => stats.games_played_all_time = count,
        Err(e) => log_query_failure("games_played_all_time", &e),
    }

    match repo.count_on(day).await {
        Ok(count) => stats.games_played_today = count,
        Err(e) => log_query_failure("games_played_today", &e),
    }

    match repo.high_score_on(day).await {
        Ok(high) => stats.high_score = high,
        Err(e) => log_query_failure("high_score", &e),
    }

    stats
}

fn log_query_failure(field: &'static str, err: &DbError) {
    tracing::error!(handler = "stats", field, error = %err, "stats query failed");
}

/// Serializes `value` as a newline-terminated JSON body.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, RouteError> {
    let mut body = serde_json::to_vec(value)?;
    body.push(b'\n');

    Ok((status, [(CONTENT_TYPE, "application/json")], body).into_response())
}
