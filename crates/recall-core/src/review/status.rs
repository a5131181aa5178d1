//! Post-review rescheduling.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{RecallError, RecallResult};
use crate::normalize::review_state;
use crate::scheduling::{IntervalInput, IntervalStrategy};
use crate::traits::{ResourceStore, UserResolver};
use crate::types::{format_timestamp, validate_score, Query, ResourceKind, ReviewMetadata, Update};

const SCHEDULE_COLUMNS: &str = "id,created_at,last_reviewed_at,next_review_at,review_count";

/// Recomputes and persists a resource's schedule after a review.
pub struct StatusUpdater {
    store: Arc<dyn ResourceStore>,
    users: Arc<dyn UserResolver>,
    strategy: Arc<dyn IntervalStrategy>,
}

impl StatusUpdater {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        users: Arc<dyn UserResolver>,
        strategy: Arc<dyn IntervalStrategy>,
    ) -> Self {
        Self {
            store,
            users,
            strategy,
        }
    }

    pub fn strategy(&self) -> &dyn IntervalStrategy {
        self.strategy.as_ref()
    }

    /// Record a review of `id` scored `score / total`.
    ///
    /// Returns `Ok(false)` when the resource does not exist for the current
    /// user. Storage failures propagate unchanged.
    pub async fn update(
        &self,
        id: &str,
        score: u32,
        total: u32,
        kind: ResourceKind,
    ) -> RecallResult<bool> {
        self.update_at(id, score, total, kind, Utc::now()).await
    }

    /// [`update`](Self::update) with an explicit clock.
    pub async fn update_at(
        &self,
        id: &str,
        score: u32,
        total: u32,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> RecallResult<bool> {
        validate_score(score, total)?;
        if id.trim().is_empty() {
            return Err(RecallError::validation("resource id must not be empty"));
        }
        let user = self.users.current_user().await?;

        let query = Query::table(kind.table())
            .select(SCHEDULE_COLUMNS)
            .eq("id", id)
            .eq("user_id", user.id.as_str())
            .limit(1);
        let rows = self.store.select(&query).await?;
        let Some(row) = rows.first() else {
            tracing::warn!(kind = %kind, resource_id = %id, "Reviewed resource not found");
            return Ok(false);
        };

        let prior = review_state(row);
        let next = self.next_schedule(&prior, score, total, now);

        let update = Update::table(kind.table())
            .set("last_reviewed_at", next.last_reviewed_at.map(format_timestamp))
            .set("next_review_at", next.next_review_at.map(format_timestamp))
            .set("review_count", next.review_count)
            .eq("id", id)
            .eq("user_id", user.id.as_str());

        let changed = self.store.update(&update).await.map_err(|e| {
            tracing::warn!(kind = %kind, resource_id = %id, "Status update failed: {}", e);
            e
        })?;

        if changed == 0 {
            tracing::warn!(kind = %kind, resource_id = %id, "Status update matched no rows");
            return Ok(false);
        }

        tracing::info!(
            kind = %kind,
            resource_id = %id,
            score,
            total,
            review_count = next.review_count,
            policy = self.strategy.name(),
            "Rescheduled resource"
        );
        Ok(true)
    }

    /// Schedule that follows `prior` after a review scored `score / total` at `now`.
    pub fn next_schedule(
        &self,
        prior: &ReviewMetadata,
        score: u32,
        total: u32,
        now: DateTime<Utc>,
    ) -> ReviewMetadata {
        let input = IntervalInput::new(score, total, prior.review_count, prior.current_interval());
        let interval = self.strategy.next_interval(&input);
        ReviewMetadata {
            last_reviewed_at: Some(now),
            next_review_at: Some(now + interval),
            review_count: prior.review_count.saturating_add(1),
        }
    }
}
