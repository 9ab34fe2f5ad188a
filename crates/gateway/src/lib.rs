// Tuukaa auth gateway HTTP surface
// Decision: The route guard wraps the whole router, auth endpoints included
// Decision: Allowed requests with no handler get a JSON 404; page rendering happens upstream

pub mod auth;
pub mod telemetry;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use auth::{AuthState, GatewayConfig};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

/// Build the full application router
pub fn app(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes(state.clone()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, auth::route_guard))
        .layer(TraceLayer::new_for_http())
}
