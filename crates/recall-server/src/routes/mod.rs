//! Route definitions for the REST API.

mod health;
mod resources;
mod review;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Review sessions
        .route("/review/queue", post(review::generate_queue))
        .route("/review/status", post(review::update_status))
        // Resource authoring
        .route("/resources/:kind", post(resources::create_resource))
        .route("/resources/:kind/:id", get(resources::get_resource))
        .with_state(state)
}

pub use health::*;
pub use resources::*;
pub use review::*;
