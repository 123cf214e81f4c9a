pub mod flows;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_device;
pub use state::AppState;

/// The API routes, without CORS or Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no device id required)
    let public_routes = Router::new()
        .route("/languages", get(rest::list_languages_handler))
        .route("/translations/{code}", get(rest::get_translations_handler));

    // Device-scoped routes
    let flow_routes = Router::new()
        .route("/flows", post(flows::create_flow_handler))
        .route("/flows/{flow_id}", get(flows::get_flow_handler))
        .route("/flows/{flow_id}/actions", post(flows::flow_action_handler))
        .layer(axum_middleware::from_fn(require_device));

    Router::new()
        .merge(public_routes)
        .merge(flow_routes)
        .with_state(state)
}
