//! Resource authoring endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::extract::RequestUser;
use crate::state::AppState;
use recall_core::error::RecallError;
use recall_core::normalize::normalize;
use recall_core::types::{format_timestamp, Query, ResourceKind, ReviewableResource, Row};

/// Request body for creating a resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    pub title: Option<String>,
    /// Object, or a string holding JSON.
    pub content: Value,
    pub deck_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateResourceResponse {
    pub id: String,
    pub kind: ResourceKind,
}

fn parse_kind(kind: &str) -> Result<ResourceKind, RecallError> {
    kind.parse().map_err(|_| RecallError::unknown_kind(kind))
}

/// Create a never-reviewed resource owned by the calling user.
/// POST /resources/:kind
pub async fn create_resource(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(kind): Path<String>,
    Json(request): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<CreateResourceResponse>)> {
    let kind = parse_kind(&kind)?;

    let content = match request.content {
        Value::String(raw) => serde_json::from_str::<Value>(&raw)
            .map_err(|e| RecallError::parse(format!("content is not valid JSON: {}", e)))?,
        other => other,
    };

    let id = uuid::Uuid::new_v4().to_string();
    let mut row = Row::new();
    row.insert("id".into(), Value::from(id.as_str()));
    row.insert("user_id".into(), Value::from(user.id));
    row.insert("title".into(), request.title.map_or(Value::Null, Value::from));
    row.insert("content".into(), content);
    row.insert("deck_id".into(), request.deck_id.map_or(Value::Null, Value::from));
    row.insert("created_at".into(), Value::from(format_timestamp(Utc::now())));
    row.insert("last_reviewed_at".into(), Value::Null);
    row.insert("next_review_at".into(), Value::Null);
    row.insert("review_count".into(), Value::from(0));

    if normalize(kind, &row).is_none() {
        return Err(ApiError::validation(format!(
            "Content is not a valid {} resource",
            kind
        )));
    }

    state.store().insert(kind.table(), row).await?;
    tracing::debug!(kind = %kind, resource_id = %id, "Created resource");

    Ok((StatusCode::CREATED, Json(CreateResourceResponse { id, kind })))
}

/// Fetch one of the calling user's resources with its review schedule.
/// GET /resources/:kind/:id
pub async fn get_resource(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<ReviewableResource>> {
    let kind = parse_kind(&kind)?;

    let query = Query::table(kind.table())
        .eq("id", id.as_str())
        .eq("user_id", user.id.as_str())
        .limit(1);
    let rows = state.store().select(&query).await?;

    rows.first()
        .and_then(|row| normalize(kind, row))
        .map(Json)
        .ok_or_else(|| RecallError::not_found(id).into())
}
