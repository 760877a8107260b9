// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{health, render},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Mounts the render routes and the health probe.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (config and sanitizer).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let render_routes = Router::new()
        .route("/sanitize", post(render::sanitize))
        .route("/messages", post(render::render_messages))
        .route("/policy", get(render::get_policy));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/render", render_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
