use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::header::REFERER;

/// Logs method, URI and referer of every inbound request before handing it on untouched.
pub async fn log_request(request: Request, next: Next) -> Response {
    let referer = request
        .headers()
        .get(REFERER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();

    tracing::info!(
        method = %request.method(),
        uri = %request.uri(),
        referer = ?referer,
        "request"
    );

    next.run(request).await
}
