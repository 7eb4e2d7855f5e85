//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // School intake
        .route("/schools", post(handlers::register_school))
        .route("/schools", get(handlers::list_schools))
        .route("/schools/{school_id}", get(handlers::get_school))
        // Tour intake
        .route("/tours", post(handlers::register_tour))
        .route("/tours", get(handlers::list_tours))
        .route("/tours/{code}", get(handlers::get_tour))
        .route("/tours/{code}/guide", put(handlers::assign_guide))
        // Slot management
        .route("/slots", post(handlers::create_slot))
        .route("/slots", get(handlers::list_slots))
        .route("/slots/{day}/{index}", get(handlers::get_slot))
        .route("/slots/{day}/{index}", delete(handlers::delete_slot))
        .route("/slots/{day}/{index}/occupancy", get(handlers::get_occupancy))
        // Admission workflow
        .route("/slots/{day}/{index}/requests", post(handlers::request_admission))
        .route("/slots/{day}/{index}/requests/{code}", delete(handlers::remove_tour))
        .route("/slots/{day}/{index}/replace", post(handlers::replace_tour))
        // Admission events
        .route("/events", get(handlers::stream_events))
        .route("/events/log", get(handlers::get_event_log));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Registration payloads are small; anything larger is a client bug.
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
