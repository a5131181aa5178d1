//! Middleware for the REST API server.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use recall_core::error::RecallError;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::ApiError;

/// Create CORS middleware.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

/// Expected bearer key for [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

/// API key authentication middleware.
///
/// Accepts `Authorization: Bearer <key>` or `Token <key>`. An empty key
/// disables the check.
pub async fn auth_middleware(
    State(ApiKey(expected_key)): State<ApiKey>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !expected_key.is_empty() {
        let auth_header = request
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());

        let token = auth_header.and_then(|header| {
            header
                .strip_prefix("Bearer ")
                .or_else(|| header.strip_prefix("Token "))
        });

        if token != Some(expected_key.as_str()) {
            return Err(RecallError::invalid_api_key().into());
        }
    }

    Ok(next.run(request).await)
}
