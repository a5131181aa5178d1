//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use recall_core::traits::CurrentUser;

use crate::error::ApiError;

/// Header carrying the signed-in user's id.
pub const USER_HEADER: &str = "x-user-id";

/// The user a request acts for, taken from the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct RequestUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;

        Ok(RequestUser(CurrentUser { id: id.to_string() }))
    }
}
