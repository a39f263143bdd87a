//! Axum router configuration with middleware.
//!
//! REST routes are under `/api/v1/`; the bus socket is `/ws`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/bundles", get(handlers::bundle::list_bundles))
        .route("/bundles/{name}", get(handlers::bundle::get_bundle))
        .route(
            "/bundles/{name}/messages/{message}",
            post(handlers::message::send_message),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus the number of attached panels.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "peers": state.hub.peer_count(),
        "bundles": state.bundles.len(),
    }))
}
