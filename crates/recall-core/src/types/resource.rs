//! Reviewable resource types.
//!
//! Four structurally different study resources share one review-metadata
//! shape. The kind-specific payload lives in [`ResourceContent`], a tagged
//! union the scheduler branches on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Resource kind discriminant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Node/edge concept map.
    ConceptMap,
    /// Front/back flashcard.
    Flashcard,
    /// Multiple-choice question.
    MultipleChoice,
    /// Ordered storyboard of scenes.
    Storyboard,
}

impl ResourceKind {
    /// All kinds, in a fixed order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::ConceptMap,
        ResourceKind::Flashcard,
        ResourceKind::MultipleChoice,
        ResourceKind::Storyboard,
    ];

    /// Storage table holding resources of this kind.
    pub fn table(self) -> &'static str {
        match self {
            ResourceKind::ConceptMap => "concept_maps",
            ResourceKind::Flashcard => "flashcards",
            ResourceKind::MultipleChoice => "multiple_choice_questions",
            ResourceKind::Storyboard => "storyboards",
        }
    }
}

/// Review bookkeeping shared by every resource kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetadata {
    /// When the last review completed. Absent for never-reviewed resources.
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// When the resource is next due. Absent means never scheduled.
    pub next_review_at: Option<DateTime<Utc>>,
    /// Number of completed reviews.
    pub review_count: u32,
}

impl ReviewMetadata {
    /// A resource is due when it was never scheduled or its date has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            None => true,
            Some(next) => next <= now,
        }
    }

    /// Interval the resource is currently scheduled on, if it has one.
    pub fn current_interval(&self) -> Option<Duration> {
        match (self.last_reviewed_at, self.next_review_at) {
            (Some(last), Some(next)) if next >= last => Some(next - last),
            _ => None,
        }
    }
}

/// A concept-map node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    pub position: Option<NodePosition>,
}

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// A directed, optionally labelled concept-map edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConceptEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

/// A saved snapshot of a concept map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConceptMapVersion {
    pub label: Option<String>,
    #[serde(alias = "created_at")]
    pub saved_at: Option<String>,
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<ConceptEdge>,
}

/// Concept-map payload. `nodes` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMapContent {
    pub nodes: Vec<ConceptNode>,
    #[serde(default)]
    pub edges: Vec<ConceptEdge>,
    #[serde(default)]
    pub versions: Vec<ConceptMapVersion>,
}

/// Flashcard payload. `front` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardContent {
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Multiple-choice payload. `question` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceContent {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "correct_option_index")]
    pub correct_option_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl MultipleChoiceContent {
    /// Whether `choice` is the correct option.
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_option_index
    }
}

/// A single storyboard scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(alias = "image_prompt")]
    pub image_prompt: Option<String>,
}

/// Storyboard payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryboardContent {
    pub scenes: Vec<Scene>,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "kebab-case")]
pub enum ResourceContent {
    ConceptMap(ConceptMapContent),
    Flashcard(FlashcardContent),
    MultipleChoice(MultipleChoiceContent),
    Storyboard(StoryboardContent),
}

impl ResourceContent {
    /// Kind tag of this payload.
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceContent::ConceptMap(_) => ResourceKind::ConceptMap,
            ResourceContent::Flashcard(_) => ResourceKind::Flashcard,
            ResourceContent::MultipleChoice(_) => ResourceKind::MultipleChoice,
            ResourceContent::Storyboard(_) => ResourceKind::Storyboard,
        }
    }
}

/// A normalized resource ready for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableResource {
    /// Identifier, unique within the resource kind.
    pub id: String,
    /// Display name.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Review bookkeeping.
    #[serde(flatten)]
    pub review: ReviewMetadata,
    /// Optional grouping key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<String>,
    /// Kind tag and payload.
    #[serde(flatten)]
    pub content: ResourceContent,
}

impl ReviewableResource {
    /// Kind tag of this resource.
    pub fn kind(&self) -> ResourceKind {
        self.content.kind()
    }

    /// Whether the resource is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.review.is_due(now)
    }
}
