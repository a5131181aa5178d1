//! Review queue and scoring endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::RequestUser;
use crate::state::AppState;
use recall_core::types::{ResourceKind, ReviewSession};

/// Request body for building a review queue.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRequest {
    /// Weight budget. Falls back to the configured session limit.
    pub limit: Option<u32>,
    /// Include resources that are not yet due.
    #[serde(default)]
    pub force_review: bool,
}

/// Build a review session for the calling user.
/// POST /review/queue
pub async fn generate_queue(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Json(request): Json<QueueRequest>,
) -> ApiResult<Json<ReviewSession>> {
    let limit = request
        .limit
        .unwrap_or(state.config().default_session_limit);

    let session = state
        .scheduler_for(&user.id)
        .generate_combined_review_queue(limit, request.force_review)
        .await?;

    Ok(Json(session))
}

/// Request body for recording a review.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub id: String,
    pub score: u32,
    pub total: u32,
    pub resource_type: ResourceKind,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
}

/// Record a review and reschedule the resource.
/// POST /review/status
pub async fn update_status(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let success = state
        .scheduler_for(&user.id)
        .update_resource_review_status(
            &request.id,
            request.score,
            request.total,
            request.resource_type,
        )
        .await?;

    Ok(Json(StatusResponse { success }))
}
