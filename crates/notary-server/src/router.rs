use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all notary endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/v1/archives",
            get(handler::list_handler).post(handler::submit_handler),
        )
        .route("/v1/archives/:identifier", get(handler::lookup_handler))
        .route("/v1/archives/:identifier/verify", post(handler::verify_handler))
        .route("/v1/archives/:identifier/history", get(handler::history_handler))
        .route("/v1/archives/:identifier/content", get(handler::content_handler))
        .route("/v1/stats", get(handler::stats_handler))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
