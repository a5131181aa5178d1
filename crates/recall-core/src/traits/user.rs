//! Current-user resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RecallError, RecallResult};

/// The authenticated user every query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
}

/// Resolves the user on whose behalf an operation runs.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn current_user(&self) -> RecallResult<CurrentUser>;
}

/// Resolver for a user already known to the caller (e.g. from a request header).
#[derive(Debug, Clone)]
pub struct StaticUser {
    id: Option<String>,
}

impl StaticUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// A resolver that always fails; used when no session is present.
    pub fn anonymous() -> Self {
        Self { id: None }
    }
}

#[async_trait]
impl UserResolver for StaticUser {
    async fn current_user(&self) -> RecallResult<CurrentUser> {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(CurrentUser { id: id.to_string() }),
            _ => Err(RecallError::authentication("no signed-in user")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_user() {
        let user = StaticUser::new("u-1").current_user().await.unwrap();
        assert_eq!(user.id, "u-1");
    }

    #[tokio::test]
    async fn test_anonymous_fails() {
        let err = StaticUser::anonymous().current_user().await.unwrap_err();
        assert!(matches!(err, RecallError::Authentication { .. }));
        assert!(StaticUser::new("  ").current_user().await.is_err());
    }
}
