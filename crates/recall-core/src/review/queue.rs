//! Combined review queue construction.
//!
//! Fetches due resources of every kind concurrently, normalizes them, orders
//! them by urgency and greedily fills a weight budget.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::RecallResult;
use crate::normalize::normalize;
use crate::traits::{ResourceStore, UserResolver};
use crate::types::{
    format_timestamp, Filter, Query, ResourceKind, ReviewSession, ReviewWeights,
    ReviewableResource,
};

/// Builds bounded, urgency-ordered review sessions.
pub struct QueueBuilder {
    store: Arc<dyn ResourceStore>,
    users: Arc<dyn UserResolver>,
    weights: ReviewWeights,
    max_candidates_per_kind: Option<usize>,
}

impl QueueBuilder {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        users: Arc<dyn UserResolver>,
        weights: ReviewWeights,
    ) -> Self {
        Self {
            store,
            users,
            weights,
            max_candidates_per_kind: None,
        }
    }

    /// Cap the rows fetched per kind.
    pub fn with_candidate_cap(mut self, cap: Option<usize>) -> Self {
        self.max_candidates_per_kind = cap;
        self
    }

    pub fn weights(&self) -> &ReviewWeights {
        &self.weights
    }

    /// Build a session whose total weight does not exceed `limit`.
    ///
    /// With `force_review` every resource of the current user is eligible;
    /// otherwise only due ones are. An empty session is a valid result.
    pub async fn build(&self, limit: u32, force_review: bool) -> RecallResult<ReviewSession> {
        self.build_at(limit, force_review, Utc::now()).await
    }

    /// [`build`](Self::build) with an explicit clock.
    pub async fn build_at(
        &self,
        limit: u32,
        force_review: bool,
        now: DateTime<Utc>,
    ) -> RecallResult<ReviewSession> {
        let user = self.users.current_user().await?;

        let fetches = ResourceKind::ALL
            .iter()
            .map(|&kind| self.fetch_kind(kind, &user.id, force_review, now));
        let batches = futures::future::try_join_all(fetches).await?;

        let candidates: Vec<ReviewableResource> = batches.into_iter().flatten().collect();
        let pool_size = candidates.len();
        let selected = select_within_budget(candidates, &self.weights, limit);

        let session = ReviewSession::new(selected, force_review, now);
        tracing::info!(
            session_id = %session.session_id,
            candidates = pool_size,
            selected = session.resources.len(),
            weight = session.total_weight(&self.weights),
            limit,
            force_review,
            "Built review session"
        );
        Ok(session)
    }

    /// Query for one kind's candidates.
    pub fn candidate_query(
        &self,
        kind: ResourceKind,
        user_id: &str,
        force_review: bool,
        now: DateTime<Utc>,
    ) -> Query {
        let mut query = Query::table(kind.table()).select("*").eq("user_id", user_id);
        if !force_review {
            query = query.or(vec![
                Filter::is_null("next_review_at"),
                Filter::lte("next_review_at", format_timestamp(now)),
            ]);
        }
        // Never-reviewed rows are the most urgent, so a cap must keep them.
        query = query
            .order_nulls_first("next_review_at", true)
            .order("created_at", true);
        if let Some(cap) = self.max_candidates_per_kind {
            query = query.limit(cap);
        }
        query
    }

    async fn fetch_kind(
        &self,
        kind: ResourceKind,
        user_id: &str,
        force_review: bool,
        now: DateTime<Utc>,
    ) -> RecallResult<Vec<ReviewableResource>> {
        let query = self.candidate_query(kind, user_id, force_review, now);
        let rows = self.store.select(&query).await.map_err(|e| {
            tracing::warn!(kind = %kind, "Candidate query failed: {}", e);
            e
        })?;

        let fetched = rows.len();
        let resources: Vec<ReviewableResource> = rows
            .iter()
            .filter_map(|row| normalize(kind, row))
            .filter(|r| force_review || r.is_due(now))
            .collect();

        if resources.len() < fetched {
            tracing::warn!(
                kind = %kind,
                dropped = fetched - resources.len(),
                "Skipped malformed or not-yet-due rows"
            );
        }
        tracing::debug!(kind = %kind, fetched, usable = resources.len(), "Fetched candidates");
        Ok(resources)
    }
}

/// Urgency order: never-scheduled first, then earliest due date, then
/// oldest creation. Kind and id break any remaining ties.
pub fn compare_urgency(a: &ReviewableResource, b: &ReviewableResource) -> Ordering {
    // `None < Some(_)`, so unscheduled resources lead.
    a.review
        .next_review_at
        .cmp(&b.review.next_review_at)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.kind().cmp(&b.kind()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order candidates by urgency and keep each one whose weight still fits.
///
/// A candidate too heavy for the remaining budget is skipped, not split, and
/// lighter ones behind it may still be taken.
pub fn select_within_budget(
    mut candidates: Vec<ReviewableResource>,
    weights: &ReviewWeights,
    limit: u32,
) -> Vec<ReviewableResource> {
    candidates.sort_by(compare_urgency);

    let mut used = 0u32;
    let mut selected = Vec::new();
    for resource in candidates {
        let remaining = limit - used;
        if remaining == 0 {
            break;
        }
        let weight = weights.weight(resource.kind());
        if weight <= remaining {
            used += weight;
            selected.push(resource);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::traits::StaticUser;
    use crate::types::{
        ConceptMapContent, FlashcardContent, ResourceContent, ReviewMetadata, Row,
    };
    use chrono::Duration;
    use serde_json::json;

    fn resource(id: &str, content: ResourceContent, next: Option<DateTime<Utc>>, created: DateTime<Utc>) -> ReviewableResource {
        ReviewableResource {
            id: id.to_string(),
            title: id.to_string(),
            created_at: created,
            review: ReviewMetadata {
                last_reviewed_at: None,
                next_review_at: next,
                review_count: 0,
            },
            deck_id: None,
            content,
        }
    }

    fn card(id: &str, next: Option<DateTime<Utc>>, created: DateTime<Utc>) -> ReviewableResource {
        resource(
            id,
            ResourceContent::Flashcard(FlashcardContent {
                front: id.to_string(),
                back: String::new(),
                hint: None,
            }),
            next,
            created,
        )
    }

    fn map(id: &str, next: Option<DateTime<Utc>>, created: DateTime<Utc>) -> ReviewableResource {
        resource(
            id,
            ResourceContent::ConceptMap(ConceptMapContent {
                nodes: Vec::new(),
                edges: Vec::new(),
                versions: Vec::new(),
            }),
            next,
            created,
        )
    }

    fn ids(resources: &[ReviewableResource]) -> Vec<&str> {
        resources.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_urgency_order() {
        let now = Utc::now();
        let created = now - Duration::days(30);
        let picked = select_within_budget(
            vec![
                card("yesterday", Some(now - Duration::days(1)), created),
                card("last-week", Some(now - Duration::days(7)), created),
                card("new-late", None, created + Duration::days(1)),
                card("new-early", None, created),
            ],
            &ReviewWeights::default(),
            10,
        );
        assert_eq!(ids(&picked), vec!["new-early", "new-late", "last-week", "yesterday"]);
    }

    #[test]
    fn test_budget_skips_heavy_items() {
        let now = Utc::now();
        let created = now - Duration::days(30);
        let picked = select_within_budget(
            vec![
                card("a", None, created),
                map("m", Some(now - Duration::days(3)), created),
                card("b", Some(now - Duration::days(2)), created),
            ],
            &ReviewWeights::default(),
            2,
        );
        // The map no longer fits after "a"; "b" still does.
        assert_eq!(ids(&picked), vec!["a", "b"]);
    }

    #[test]
    fn test_zero_limit_selects_nothing() {
        let now = Utc::now();
        let picked = select_within_budget(vec![card("a", None, now)], &ReviewWeights::default(), 0);
        assert!(picked.is_empty());
    }

    #[test]
    fn test_custom_weights() {
        let now = Utc::now();
        let weights = ReviewWeights::default().with_weight(ResourceKind::ConceptMap, 1);
        let picked = select_within_budget(
            vec![map("m1", None, now), map("m2", None, now)],
            &weights,
            2,
        );
        assert_eq!(picked.len(), 2);
    }

    fn stored(id: &str, user: &str, next: Option<&str>, content: serde_json::Value) -> Row {
        json!({
            "id": id,
            "user_id": user,
            "title": id,
            "created_at": "2026-01-01T00:00:00.000Z",
            "next_review_at": next,
            "review_count": 0,
            "content": content,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_scopes_to_user_and_due_items() {
        let store = Arc::new(MemoryStore::new());
        let front = json!({"front": "q"});
        store.insert("flashcards", stored("due", "u1", Some("2026-02-01T00:00:00.000Z"), front.clone())).await.unwrap();
        store.insert("flashcards", stored("future", "u1", Some("2026-09-01T00:00:00.000Z"), front.clone())).await.unwrap();
        store.insert("flashcards", stored("other-user", "u2", None, front.clone())).await.unwrap();
        store.insert("flashcards", stored("broken", "u1", None, json!({"back": "no front"}))).await.unwrap();

        let builder = QueueBuilder::new(store, Arc::new(StaticUser::new("u1")), ReviewWeights::default());
        let now = DateTime::parse_from_rfc3339("2026-03-01T00:00:00Z").unwrap().with_timezone(&Utc);

        let session = builder.build_at(10, false, now).await.unwrap();
        assert_eq!(ids(&session.resources), vec!["due"]);
        assert!(!session.is_force_review);

        let forced = builder.build_at(10, true, now).await.unwrap();
        assert_eq!(ids(&forced.resources), vec!["due", "future"]);
        assert!(forced.is_force_review);
    }

    #[tokio::test]
    async fn test_build_requires_user() {
        let builder = QueueBuilder::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticUser::anonymous()),
            ReviewWeights::default(),
        );
        assert!(builder.build(5, false).await.is_err());
    }

    #[test]
    fn test_candidate_query_shape() {
        let builder = QueueBuilder::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticUser::new("u1")),
            ReviewWeights::default(),
        )
        .with_candidate_cap(Some(50));
        let now = Utc::now();

        let due = builder.candidate_query(ResourceKind::Storyboard, "u1", false, now);
        assert_eq!(due.table, "storyboards");
        assert_eq!(due.filters.len(), 2);
        assert_eq!(due.limit, Some(50));
        assert!(due.order[0].nulls_first);
        assert_eq!(due.order[0].field, "next_review_at");
        assert_eq!(due.order[1].field, "created_at");

        let forced = builder.candidate_query(ResourceKind::Storyboard, "u1", true, now);
        assert_eq!(forced.filters, vec![Filter::eq("user_id", "u1")]);
    }
}
