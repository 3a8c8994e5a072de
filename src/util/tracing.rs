use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_FILTER: &str = "score_tracker=debug,tower_http=debug,axum=info,sqlx=warn,info";

/// Installs the global subscriber: an `EnvFilter` taken from `RUST_LOG` (falling back to
/// [`DEFAULT_FILTER`]) in front of a console formatter.
pub fn register() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();
}
