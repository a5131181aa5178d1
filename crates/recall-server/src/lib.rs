//! recall-server - REST API server for recall.
//!
//! Exposes the review scheduler over HTTP. Every review route acts for the
//! user named in the `X-User-Id` header.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use recall_core::RecallConfig;
//! use recall_server::{create_server, AppState};
//! use recall_stores::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::new(Arc::new(MemoryStore::new()), RecallConfig::default()).unwrap();
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::RequestUser;
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// Create the server with bearer-key authentication.
pub fn create_server_with_auth(state: AppState, api_key: impl Into<String>) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn_with_state(
            middleware::ApiKey(api_key.into()),
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
