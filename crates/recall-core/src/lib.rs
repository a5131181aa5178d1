//! recall-core - Core library for recall.
//!
//! This crate provides the resource types, normalizers, storage traits and
//! the spaced-repetition review queue for the recall study scheduler.
//!
//! # Example
//!
//! ```ignore
//! use recall_core::{RecallConfig, ReviewScheduler, StaticUser};
//! use recall_core::store::MemoryStore;
//!
//! let scheduler = ReviewScheduler::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticUser::new("user-1")),
//!     RecallConfig::default(),
//! )?;
//!
//! // Build a session of up to 10 weight units
//! let mut session = scheduler.generate_combined_review_queue(10, false).await?;
//!
//! // Score the first item and move on
//! scheduler.complete_current(&mut session, 1, 1).await?;
//! ```

pub mod config;
pub mod error;
pub mod normalize;
pub mod review;
pub mod scheduling;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::RecallConfig;
pub use error::{ErrorCode, RecallError, RecallResult};
pub use normalize::normalize;
pub use review::{QueueBuilder, ReviewScheduler, StatusUpdater};
pub use scheduling::{IntervalConfig, IntervalPolicy, IntervalStrategy};
pub use traits::{CurrentUser, ResourceStore, StaticUser, StoreConfig, StoreProvider, UserResolver};
pub use types::{
    CompletedReview, Filter, Query, ResourceContent, ResourceKind, ReviewMetadata,
    ReviewSession, ReviewWeights, ReviewableResource, Row, Update,
};
