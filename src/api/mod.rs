//! HTTP API module
//!
//! A thin HTTP shell over the in-process bridge: every endpoint either sends
//! a protocol command or reads the rendered view.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/resume", post(resume_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/timer/skip-break", post(skip_break_handler))
        .route("/timer/skip-cycle", post(skip_cycle_handler))
        .route("/timer/sync", post(sync_handler))
        .route("/timer/focus-duration", post(focus_duration_handler))
        .route("/timer/cycle-count", post(cycle_count_handler))
        .route("/command", post(command_handler))
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
