//! Resource normalizers.
//!
//! Convert raw stored rows into typed [`ReviewableResource`]s. A structurally
//! invalid row yields `None` so callers can skip it without aborting a batch;
//! partially-missing nested fields fall back to empty defaults instead.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{
    parse_timestamp, ConceptMapContent, FlashcardContent, MultipleChoiceContent, ResourceContent,
    ResourceKind, ReviewMetadata, ReviewableResource, Row, StoryboardContent,
};

/// Normalize a row of the given kind.
pub fn normalize(kind: ResourceKind, row: &Row) -> Option<ReviewableResource> {
    match kind {
        ResourceKind::ConceptMap => process_concept_map_data(row),
        ResourceKind::Flashcard => process_flashcard_data(row),
        ResourceKind::MultipleChoice => process_multiple_choice_data(row),
        ResourceKind::Storyboard => process_storyboard_data(row),
    }
}

/// Normalize a `concept_maps` row. Requires `content.nodes`.
pub fn process_concept_map_data(row: &Row) -> Option<ReviewableResource> {
    build(ResourceKind::ConceptMap, row, |content| {
        let map: ConceptMapContent = decode(content)?;
        Some((ResourceContent::ConceptMap(map), "Untitled concept map".to_string()))
    })
}

/// Normalize a `flashcards` row. Requires `content.front`.
pub fn process_flashcard_data(row: &Row) -> Option<ReviewableResource> {
    build(ResourceKind::Flashcard, row, |content| {
        let card: FlashcardContent = decode(content)?;
        let fallback = card.front.clone();
        Some((ResourceContent::Flashcard(card), fallback))
    })
}

/// Normalize a `multiple_choice_questions` row. Requires `content.question`
/// and, when options are present, an in-range correct option.
pub fn process_multiple_choice_data(row: &Row) -> Option<ReviewableResource> {
    build(ResourceKind::MultipleChoice, row, |content| {
        let question: MultipleChoiceContent = decode(content)?;
        if !question.options.is_empty() && question.correct_option_index >= question.options.len() {
            return None;
        }
        let fallback = question.question.clone();
        Some((ResourceContent::MultipleChoice(question), fallback))
    })
}

/// Normalize a `storyboards` row. Scenes default to empty.
pub fn process_storyboard_data(row: &Row) -> Option<ReviewableResource> {
    build(ResourceKind::Storyboard, row, |content| {
        let board: StoryboardContent = decode(content)?;
        Some((ResourceContent::Storyboard(board), "Untitled storyboard".to_string()))
    })
}

fn build<F>(kind: ResourceKind, row: &Row, payload: F) -> Option<ReviewableResource>
where
    F: FnOnce(Value) -> Option<(ResourceContent, String)>,
{
    let Some(id) = row.get("id").and_then(id_string) else {
        tracing::debug!(kind = %kind, "Dropping row without id");
        return None;
    };

    let Some(created_at) = row.get("created_at").and_then(timestamp) else {
        tracing::debug!(kind = %kind, resource_id = %id, "Dropping row without valid created_at");
        return None;
    };

    let Some(content) = row.get("content").and_then(content_object) else {
        tracing::debug!(kind = %kind, resource_id = %id, "Dropping row with missing or malformed content");
        return None;
    };

    let content_title = content
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let Some((content, fallback_title)) = payload(content) else {
        tracing::debug!(kind = %kind, resource_id = %id, "Dropping row with invalid payload");
        return None;
    };

    let title = row
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or(content_title)
        .unwrap_or(fallback_title);

    Some(ReviewableResource {
        id,
        title,
        created_at,
        review: review_metadata(row, created_at),
        deck_id: row.get("deck_id").and_then(id_string),
        content,
    })
}

/// Read review columns and repair rows that break the metadata invariants.
fn review_metadata(row: &Row, created_at: DateTime<Utc>) -> ReviewMetadata {
    let last_reviewed_at = row.get("last_reviewed_at").and_then(timestamp);
    let mut next_review_at = row.get("next_review_at").and_then(timestamp);
    let mut review_count = row.get("review_count").map(count).unwrap_or(0);

    // A review timestamp means at least one review happened.
    if review_count == 0 && last_reviewed_at.is_some() {
        review_count = 1;
    }

    let anchor = last_reviewed_at.unwrap_or(created_at);
    if let Some(next) = next_review_at {
        if next < anchor {
            next_review_at = Some(anchor);
        }
    }

    ReviewMetadata {
        last_reviewed_at,
        next_review_at,
        review_count,
    }
}

/// Review columns of a row fetched without its content, with the same repair
/// applied as full normalization.
pub fn review_state(row: &Row) -> ReviewMetadata {
    let anchor = row
        .get("created_at")
        .and_then(timestamp)
        .or_else(|| row.get("last_reviewed_at").and_then(timestamp))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    review_metadata(row, anchor)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}

fn count(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    raw.unwrap_or(0).clamp(0, u32::MAX as i64) as u32
}

/// Content is stored either as a JSON object or as a string holding one.
/// Null members are dropped so serde defaults apply to them.
fn content_object(value: &Value) -> Option<Value> {
    let parsed = match value {
        Value::Object(_) => value.clone(),
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        _ => return None,
    };

    match parsed {
        Value::Object(mut map) => {
            map.retain(|_, v| !v.is_null());
            Some(Value::Object(map))
        }
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(content: Value) -> Option<T> {
    serde_json::from_value(content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flashcard_minimal() {
        let r = row(json!({
            "id": "fc-1",
            "title": "Capitals",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"front": "Capital of France?", "back": "Paris"}
        }));
        let resource = process_flashcard_data(&r).unwrap();
        assert_eq!(resource.kind(), ResourceKind::Flashcard);
        assert_eq!(resource.title, "Capitals");
        assert_eq!(resource.review, ReviewMetadata::default());
        match resource.content {
            ResourceContent::Flashcard(card) => assert_eq!(card.back, "Paris"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_flashcard_missing_front_is_invalid() {
        let r = row(json!({
            "id": "fc-1",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"back": "Paris"}
        }));
        assert!(process_flashcard_data(&r).is_none());
    }

    #[test]
    fn test_string_encoded_content_and_numeric_id() {
        let r = row(json!({
            "id": 42,
            "created_at": "2026-01-01 08:00:00",
            "content": "{\"question\": \"2+2?\", \"options\": [\"3\", \"4\"], \"correctOptionIndex\": 1}"
        }));
        let resource = process_multiple_choice_data(&r).unwrap();
        assert_eq!(resource.id, "42");
        assert_eq!(resource.title, "2+2?");
        match resource.content {
            ResourceContent::MultipleChoice(q) => {
                assert!(q.is_correct(1));
                assert_eq!(q.options.len(), 2);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_multiple_choice_defaults_and_bad_index() {
        let ok = row(json!({
            "id": "q",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"question": "Why?", "options": null}
        }));
        let resource = process_multiple_choice_data(&ok).unwrap();
        match resource.content {
            ResourceContent::MultipleChoice(q) => {
                assert!(q.options.is_empty());
                assert_eq!(q.correct_option_index, 0);
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        let bad = row(json!({
            "id": "q",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"question": "Why?", "options": ["a"], "correct_option_index": 3}
        }));
        assert!(process_multiple_choice_data(&bad).is_none());
    }

    #[test]
    fn test_concept_map_requires_nodes() {
        let ok = row(json!({
            "id": "cm",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"nodes": [{"id": "n1", "label": "Cell"}]}
        }));
        let resource = process_concept_map_data(&ok).unwrap();
        assert_eq!(resource.title, "Untitled concept map");
        match resource.content {
            ResourceContent::ConceptMap(map) => {
                assert_eq!(map.nodes.len(), 1);
                assert!(map.edges.is_empty());
                assert!(map.versions.is_empty());
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        let bad = row(json!({
            "id": "cm",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"edges": []}
        }));
        assert!(process_concept_map_data(&bad).is_none());
    }

    #[test]
    fn test_storyboard_defaults_scenes() {
        let r = row(json!({
            "id": "sb",
            "created_at": "2026-01-01T00:00:00Z",
            "content": {"title": "Photosynthesis"}
        }));
        let resource = process_storyboard_data(&r).unwrap();
        assert_eq!(resource.title, "Photosynthesis");
        assert_eq!(resource.content, ResourceContent::Storyboard(StoryboardContent::default()));

        let not_object = row(json!({"id": "sb", "created_at": "2026-01-01T00:00:00Z", "content": [1, 2]}));
        assert!(process_storyboard_data(&not_object).is_none());
    }

    #[test]
    fn test_missing_shared_columns_are_invalid() {
        let no_id = row(json!({"created_at": "2026-01-01T00:00:00Z", "content": {"front": "x"}}));
        let no_created = row(json!({"id": "a", "content": {"front": "x"}}));
        let no_content = row(json!({"id": "a", "created_at": "2026-01-01T00:00:00Z"}));
        let bad_json = row(json!({"id": "a", "created_at": "2026-01-01T00:00:00Z", "content": "{nope"}));
        for r in [no_id, no_created, no_content, bad_json] {
            assert!(process_flashcard_data(&r).is_none());
        }
    }

    #[test]
    fn test_invariant_repair() {
        let r = row(json!({
            "id": "fc",
            "created_at": "2026-01-10T00:00:00Z",
            "last_reviewed_at": "2026-01-12T00:00:00Z",
            "next_review_at": "2026-01-11T00:00:00Z",
            "review_count": -3,
            "content": {"front": "x"}
        }));
        let resource = process_flashcard_data(&r).unwrap();
        let review = &resource.review;
        assert_eq!(review.review_count, 1);
        assert_eq!(review.next_review_at, review.last_reviewed_at);

        let early = row(json!({
            "id": "fc",
            "created_at": "2026-01-10T00:00:00Z",
            "next_review_at": "2026-01-01T00:00:00Z",
            "content": {"front": "x"}
        }));
        let resource = process_flashcard_data(&early).unwrap();
        assert_eq!(resource.review.next_review_at, Some(resource.created_at));
        assert!(resource.review.last_reviewed_at.is_none());
    }

    #[test]
    fn test_valid_schedule_is_untouched() {
        let created = Utc::now() - Duration::days(10);
        let reviewed = created + Duration::days(2);
        let next = reviewed + Duration::days(7);
        let r = row(json!({
            "id": "fc",
            "created_at": crate::types::format_timestamp(created),
            "last_reviewed_at": crate::types::format_timestamp(reviewed),
            "next_review_at": crate::types::format_timestamp(next),
            "review_count": "4",
            "deck_id": 9,
            "content": {"front": "x"}
        }));
        let resource = normalize(ResourceKind::Flashcard, &r).unwrap();
        assert_eq!(resource.review.review_count, 4);
        assert_eq!(resource.review.current_interval(), Some(Duration::days(7)));
        assert_eq!(resource.deck_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_review_state_without_content() {
        let r = row(json!({
            "id": "mc",
            "created_at": "2026-01-10T00:00:00Z",
            "last_reviewed_at": "2026-01-12T00:00:00Z",
            "next_review_at": "2026-01-19T00:00:00Z",
            "review_count": 2
        }));
        assert!(process_multiple_choice_data(&r).is_none());
        let state = review_state(&r);
        assert_eq!(state.review_count, 2);
        assert_eq!(state.current_interval(), Some(Duration::days(7)));
        assert_eq!(review_state(&Row::new()), ReviewMetadata::default());
    }
}
