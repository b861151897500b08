//! # xidauth-api — Decision API
//!
//! HTTP surface over [`xidauth_verify::AuthService`] for callers that want
//! the full decision (state, expiry, extra data) instead of the bridge's
//! single bit.
//!
//! ## API Surface
//!
//! | Path                 | Module              | Purpose                 |
//! |----------------------|---------------------|-------------------------|
//! | `/v1/verify`         | [`routes::auth`]    | Verify a password       |
//! | `/v1/isuser`         | [`routes::auth`]    | Probe a user            |
//! | `/health/liveness`   | this module         | Process is running      |
//! | `/health/readiness`  | this module         | Servers are configured  |
//! | `/metrics`           | this module         | Prometheus scrape       |
//!
//! `/metrics` is mounted only when the service carries [`AuthMetrics`].
//!
//! [`AuthMetrics`]: xidauth_verify::AuthMetrics

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth::router())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http());

    let mut probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if state.service.metrics().is_some() {
        probes = probes.route("/metrics", get(prometheus_metrics));
    }

    Router::new().merge(probes).merge(api).with_state(state)
}

/// GET /metrics: Prometheus text exposition of the decision counters.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let Some(metrics) = state.service.metrics() else {
        return (StatusCode::NOT_FOUND, "metrics disabled".to_string()).into_response();
    };
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe. Always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 until at least one server is configured.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.service.servers().next().is_none() {
        return (StatusCode::SERVICE_UNAVAILABLE, "no servers configured").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
