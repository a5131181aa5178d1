//! Integration tests for reviewing against an on-disk SQLite database.

#![cfg(feature = "sqlite")]

use chrono::{Duration, Utc};
use recall_core::types::{format_timestamp, parse_timestamp};
use recall_core::{
    IntervalPolicy, Query, RecallConfig, ResourceKind, ResourceStore, ReviewScheduler, Row,
    StaticUser,
};
use recall_stores::{SqliteStore, StoreConfig, StoreFactory, StoreProvider};
use serde_json::json;
use std::sync::Arc;

fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap()
}

async fn seed(store: &dyn ResourceStore) {
    let now = Utc::now();
    store
        .insert(
            "concept_maps",
            row(json!({
                "id": "map-1",
                "user_id": "u1",
                "title": "Photosynthesis",
                "content": {"nodes": [{"id": "n1", "label": "Light"}], "edges": []},
                "created_at": format_timestamp(now - Duration::days(5)),
                "review_count": 0
            })),
        )
        .await
        .unwrap();
    store
        .insert(
            "multiple_choice_questions",
            row(json!({
                "id": "mc-1",
                "user_id": "u1",
                "content": {"question": "Which organelle?", "options": ["Nucleus", "Chloroplast"], "correctOptionIndex": 1},
                "created_at": format_timestamp(now - Duration::days(20)),
                "last_reviewed_at": format_timestamp(now - Duration::days(8)),
                "next_review_at": format_timestamp(now - Duration::days(1)),
                "review_count": 1
            })),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_review_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = RecallConfig::builder()
        .store(StoreConfig {
            provider: StoreProvider::Sqlite,
            path: dir.path().join("recall.db"),
            ..StoreConfig::default()
        })
        .build()
        .unwrap();

    let store = StoreFactory::create(&config.store).unwrap();
    seed(store.as_ref()).await;

    let scheduler =
        ReviewScheduler::new(store.clone(), Arc::new(StaticUser::new("u1")), config).unwrap();
    let mut session = scheduler.generate_combined_review_queue(3, false).await.unwrap();

    let ids: Vec<&str> = session.resources.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["map-1", "mc-1"]);
    assert_eq!(session.resources[1].title, "Which organelle?");

    scheduler.complete_current(&mut session, 1, 1).await.unwrap();
    scheduler.complete_current(&mut session, 0, 1).await.unwrap();
    assert!(session.is_complete());

    // Reopen from disk and check what was written.
    let reopened = SqliteStore::new(dir.path().join("recall.db")).unwrap();
    let rows = reopened
        .select(&Query::table("multiple_choice_questions").eq("id", "mc-1"))
        .await
        .unwrap();
    let last = parse_timestamp(rows[0]["last_reviewed_at"].as_str().unwrap()).unwrap();
    let next = parse_timestamp(rows[0]["next_review_at"].as_str().unwrap()).unwrap();
    assert_eq!(next - last, Duration::days(1));
    assert_eq!(rows[0]["review_count"], json!(2));

    let again = scheduler.generate_combined_review_queue(3, false).await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_growth_policy_on_sqlite() {
    let store: Arc<dyn ResourceStore> = Arc::new(SqliteStore::in_memory().unwrap());
    seed(store.as_ref()).await;

    let config = RecallConfig::builder()
        .interval_policy(IntervalPolicy::Exponential)
        .build()
        .unwrap();
    let scheduler = ReviewScheduler::new(store.clone(), Arc::new(StaticUser::new("u1")), config).unwrap();

    // Prior interval was 7 days on a pass, so a second pass doubles it.
    assert!(scheduler
        .update_resource_review_status("mc-1", 1, 1, ResourceKind::MultipleChoice)
        .await
        .unwrap());

    let rows = store
        .select(&Query::table("multiple_choice_questions").select("last_reviewed_at,next_review_at"))
        .await
        .unwrap();
    let last = parse_timestamp(rows[0]["last_reviewed_at"].as_str().unwrap()).unwrap();
    let next = parse_timestamp(rows[0]["next_review_at"].as_str().unwrap()).unwrap();
    assert_eq!(next - last, Duration::days(14));
}
