use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Depot endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/:owner/:repo/info/lfs/objects/:oid",
            get(handler::get_object),
        )
        .route(
            "/:owner/:repo/info/lfs/objects/:oid/:filename",
            get(handler::get_object),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
