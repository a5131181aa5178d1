//! Review scheduler facade.

use chrono::Utc;
use std::sync::Arc;

use super::queue::QueueBuilder;
use super::status::StatusUpdater;
use crate::config::RecallConfig;
use crate::error::{RecallError, RecallResult};
use crate::scheduling::IntervalStrategy;
use crate::traits::{ResourceStore, UserResolver};
use crate::types::{validate_score, CompletedReview, ResourceKind, ReviewSession};

/// Entry point for the page layer: builds sessions and records reviews.
pub struct ReviewScheduler {
    store: Arc<dyn ResourceStore>,
    users: Arc<dyn UserResolver>,
    strategy: Arc<dyn IntervalStrategy>,
    config: RecallConfig,
    queue: QueueBuilder,
    status: StatusUpdater,
}

impl ReviewScheduler {
    /// Create a scheduler using the interval policy named in `config`.
    pub fn new(
        store: Arc<dyn ResourceStore>,
        users: Arc<dyn UserResolver>,
        config: RecallConfig,
    ) -> RecallResult<Self> {
        config.validate()?;
        let strategy = config.interval.build();
        Ok(Self::assemble(store, users, strategy, config))
    }

    /// Replace the interval strategy.
    pub fn with_strategy(self, strategy: Arc<dyn IntervalStrategy>) -> Self {
        Self::assemble(self.store, self.users, strategy, self.config)
    }

    /// A scheduler sharing this one's store and policy, acting for another user.
    pub fn with_user_resolver(&self, users: Arc<dyn UserResolver>) -> Self {
        Self::assemble(
            self.store.clone(),
            users,
            self.strategy.clone(),
            self.config.clone(),
        )
    }

    fn assemble(
        store: Arc<dyn ResourceStore>,
        users: Arc<dyn UserResolver>,
        strategy: Arc<dyn IntervalStrategy>,
        config: RecallConfig,
    ) -> Self {
        let queue = QueueBuilder::new(store.clone(), users.clone(), config.weights)
            .with_candidate_cap(config.max_candidates_per_kind);
        let status = StatusUpdater::new(store.clone(), users.clone(), strategy.clone());
        Self {
            store,
            users,
            strategy,
            config,
            queue,
            status,
        }
    }

    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    pub fn queue(&self) -> &QueueBuilder {
        &self.queue
    }

    pub fn status(&self) -> &StatusUpdater {
        &self.status
    }

    /// Build a session of at most `limit` weight units.
    pub async fn generate_combined_review_queue(
        &self,
        limit: u32,
        force_review: bool,
    ) -> RecallResult<ReviewSession> {
        self.queue.build(limit, force_review).await
    }

    /// Record a review and reschedule the resource.
    pub async fn update_resource_review_status(
        &self,
        id: &str,
        score: u32,
        total: u32,
        resource_type: ResourceKind,
    ) -> RecallResult<bool> {
        self.status.update(id, score, total, resource_type).await
    }

    /// Score the resource at the session cursor, persist its new schedule and
    /// advance.
    ///
    /// The session only moves once the update has been issued; a storage error
    /// leaves it untouched so the same item can be retried. A resource that
    /// has vanished from storage is still logged as completed.
    pub async fn complete_current(
        &self,
        session: &mut ReviewSession,
        score: u32,
        total: u32,
    ) -> RecallResult<CompletedReview> {
        validate_score(score, total)?;
        let (id, kind) = match (session.current(), session.current_kind()) {
            (Some(resource), Some(kind)) => (resource.id.clone(), kind),
            _ => return Err(RecallError::validation("review session is already complete")),
        };

        let now = Utc::now();
        let persisted = self.status.update_at(&id, score, total, kind, now).await?;
        if !persisted {
            tracing::warn!(
                session_id = %session.session_id,
                resource_id = %id,
                "Completed resource was not rescheduled"
            );
        }
        session.record(score, total, now)
    }
}
