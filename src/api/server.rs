use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::MatchedPath;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, get_service, post};
use http::header::LOCATION;
use http::{Method, Request, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::{record_score, stats};
use crate::api::idle::IdleTimeout;
use crate::api::middleware::request_log::log_request;
use crate::db::DbError;
use crate::util::env::Env;

/// Shared by every handler; the pool is the only handle to the store.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub index_path: String,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, index_path: impl Into<String>) -> Self {
        Self {
            db_pool,
            index_path: index_path.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Keep-alive connections with no traffic for this long are closed.
    pub idle: Duration,
    /// Applies to the request head and, separately, to the request body.
    pub read: Duration,
    /// Time allowed for a handler to produce its response.
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(60),
            read: Duration::from_secs(10),
            write: Duration::from_secs(30),
        }
    }
}

/// Builds the application router with every route placed under `mount`.
///
/// `mount` is expected to be normalized already (empty, or a leading `/` without a trailing one).
/// Any GET under `{mount}/` that no other route claims serves the index document.
pub fn router(state: Arc<AppState>, mount: &str, timeouts: Timeouts) -> Router {
    let index = ServeFile::new(&state.index_path);

    let mut routes = Router::new()
        .route(&format!("{mount}/"), get_service(index.clone()))
        .route(
            &format!("{mount}/score/{{score}}"),
            get_service(index.clone()).post(record_score),
        )
        .route(&format!("{mount}/stats"), get(stats));

    // bare mount without the trailing slash
    if !mount.is_empty() {
        let target = format!("{mount}/");
        routes = routes.route(
            mount,
            get(move || {
                let target = target.clone();
                async move { (StatusCode::MOVED_PERMANENTLY, [(LOCATION, target)]) }
            }),
        );
    }

    let prefix = format!("{mount}/");
    let routes = routes.fallback(move |request: Request<Body>| {
        let index = index.clone();
        let prefix = prefix.clone();
        async move { serve_unclaimed(index, &prefix, request).await }
    });

    routes
        .layer(RequestBodyTimeoutLayer::new(timeouts.read))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeouts.write,
        ))
        .layer(from_fn(log_request))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .with_state(state)
}

/// Requests no route claimed: GETs under the mount get the index document, other methods there
/// are not allowed, and anything outside the mount does not exist.
async fn serve_unclaimed(index: ServeFile, prefix: &str, request: Request<Body>) -> Response {
    if !request.uri().path().starts_with(prefix) {
        return StatusCode::NOT_FOUND.into_response();
    }

    if request.method() != Method::GET && request.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match index.oneshot(request).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

/// Binds the configured port on all interfaces and serves until the process is stopped.
#[instrument(skip_all, fields(port = env.port, mount = %env.mount))]
pub async fn start_server(env: &Env, state: Arc<AppState>) -> ServerResult<()> {
    let app = router(state, &env.mount, Timeouts::default());

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), env.port);
    let listener = TcpListener::bind(socket_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: socket_addr,
            source,
        })?;

    tracing::info!(
        server_url = &format!("http://127.0.0.1:{}{}/", env.port, env.mount),
        "server ready"
    );

    serve(listener, app, Timeouts::default()).await;
    Ok(())
}

/// Accept loop: one task per connection.
pub async fn serve(listener: TcpListener, app: Router, timeouts: Timeouts) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                // usually fd exhaustion; back off instead of spinning on it
                tracing::warn!(error = %e, "failed to accept connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let app = app.clone();
        tokio::spawn(serve_connection(stream, peer, app, timeouts));
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, app: Router, timeouts: Timeouts) {
    let io = TokioIo::new(IdleTimeout::new(stream, timeouts.idle));
    let service =
        hyper::service::service_fn(move |request: Request<Incoming>| app.clone().oneshot(request));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read)
        .keep_alive(true);

    if let Err(e) = builder.serve_connection(io, service).await {
        tracing::debug!(%peer, error = %e, "connection closed");
    }
}

pub type ServerResult<T> = core::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unable to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid score '{0}'")]
    InvalidScore(String),

    #[error("failed to record score: {0}")]
    RecordFailed(#[source] DbError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RouteError::InvalidScore(_) => (StatusCode::BAD_REQUEST, "Invalid score"),
            RouteError::RecordFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to record score")
            }
            RouteError::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };

        (status, message).into_response()
    }
}
