//! Server state management.

use std::sync::Arc;

use recall_core::config::RecallConfig;
use recall_core::error::RecallResult;
use recall_core::traits::{ResourceStore, StaticUser};
use recall_core::ReviewScheduler;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    scheduler: Arc<ReviewScheduler>,
}

impl AppState {
    /// Create state over an already-built store.
    ///
    /// The scheduler held here has no user; handlers rebind it to the
    /// request's user before every operation.
    pub fn new(store: Arc<dyn ResourceStore>, config: RecallConfig) -> RecallResult<Self> {
        let scheduler = ReviewScheduler::new(store, Arc::new(StaticUser::anonymous()), config)?;
        Ok(Self {
            scheduler: Arc::new(scheduler),
        })
    }

    /// Scheduler acting for `user_id`.
    pub fn scheduler_for(&self, user_id: &str) -> ReviewScheduler {
        self.scheduler
            .with_user_resolver(Arc::new(StaticUser::new(user_id)))
    }

    pub fn config(&self) -> &RecallConfig {
        self.scheduler.config()
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        self.scheduler.store()
    }
}
