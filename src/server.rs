use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Run control ─────────────────────────────────────────
        .route("/api/runs/start", post(handlers::runs::start_run))
        .route("/api/runs/stop", post(handlers::runs::stop_run))
        .route("/api/runs/status", get(handlers::runs::run_status))
        // ── Stored statistics ───────────────────────────────────
        .route("/api/runs", get(handlers::results::list_runs))
        .route(
            "/api/runs/:id/statistic",
            get(handlers::results::load_statistic),
        )
        // ── Live statistic ──────────────────────────────────────
        .route("/api/statistic", get(stream::get_statistic))
        .route("/api/statistic/csv", get(stream::statistic_csv))
        .route("/api/statistic/stream", get(stream::statistic_stream))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
