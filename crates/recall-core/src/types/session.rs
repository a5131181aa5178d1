//! Review session state.
//!
//! A session is built on demand, lives only in the caller's memory, and is
//! discarded once finished or abandoned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::{ResourceKind, ReviewableResource};
use super::weight::ReviewWeights;
use crate::error::{RecallError, RecallResult};

/// One finished item in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedReview {
    pub resource_id: String,
    pub resource_type: ResourceKind,
    pub score: u32,
    pub total: u32,
    pub completed_at: DateTime<Utc>,
}

/// An ordered, bounded batch of resources presented in one sitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSession {
    /// Unique per session.
    pub session_id: String,
    /// When the session was built.
    pub created_at: DateTime<Utc>,
    /// Resources in urgency order.
    pub resources: Vec<ReviewableResource>,
    /// Kind tags, parallel to `resources`.
    pub resource_types: Vec<ResourceKind>,
    /// Cursor into `resources`.
    pub current_index: usize,
    /// Completion log, in completion order.
    pub completed: Vec<CompletedReview>,
    /// Whether due dates were ignored when building.
    pub is_force_review: bool,
}

impl ReviewSession {
    /// Create a session over already-ordered resources.
    pub fn new(
        resources: Vec<ReviewableResource>,
        is_force_review: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let resource_types = resources.iter().map(|r| r.kind()).collect();
        Self {
            session_id: Uuid::new_v4().to_string(),
            created_at,
            resources,
            resource_types,
            current_index: 0,
            completed: Vec::new(),
            is_force_review,
        }
    }

    /// Resource at the cursor, if any remain.
    pub fn current(&self) -> Option<&ReviewableResource> {
        self.resources.get(self.current_index)
    }

    /// Kind at the cursor, if any remain.
    pub fn current_kind(&self) -> Option<ResourceKind> {
        self.resource_types.get(self.current_index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.resources.len()
    }

    /// Number of resources not yet scored.
    pub fn remaining(&self) -> usize {
        self.resources.len().saturating_sub(self.current_index)
    }

    /// Budget consumed by the selected resources.
    pub fn total_weight(&self, weights: &ReviewWeights) -> u32 {
        self.resource_types.iter().map(|k| weights.weight(*k)).sum()
    }

    /// Log a score for the resource at the cursor and advance.
    pub fn record(
        &mut self,
        score: u32,
        total: u32,
        completed_at: DateTime<Utc>,
    ) -> RecallResult<CompletedReview> {
        validate_score(score, total)?;
        let (resource_id, resource_type) = match self.current() {
            Some(resource) => (resource.id.clone(), resource.kind()),
            None => return Err(RecallError::validation("review session is already complete")),
        };

        let entry = CompletedReview {
            resource_id,
            resource_type,
            score,
            total,
            completed_at,
        };
        self.completed.push(entry.clone());
        self.current_index += 1;
        Ok(entry)
    }
}

/// `total` must be positive and `score` must not exceed it.
pub fn validate_score(score: u32, total: u32) -> RecallResult<()> {
    if total == 0 || score > total {
        return Err(RecallError::invalid_score(score, total));
    }
    Ok(())
}
