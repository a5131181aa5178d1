//! Per-kind session budget costs.

use serde::{Deserialize, Serialize};

use super::resource::ResourceKind;
use crate::error::{RecallError, RecallResult};

/// Budget cost of each resource kind within a review session.
///
/// Concept maps and storyboards take longer to review than a single card or
/// question, so they consume more of the session limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewWeights {
    pub concept_map: u32,
    pub flashcard: u32,
    pub multiple_choice: u32,
    pub storyboard: u32,
}

impl Default for ReviewWeights {
    fn default() -> Self {
        Self {
            concept_map: 2,
            flashcard: 1,
            multiple_choice: 1,
            storyboard: 2,
        }
    }
}

impl ReviewWeights {
    /// Weight of a kind.
    pub fn weight(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::ConceptMap => self.concept_map,
            ResourceKind::Flashcard => self.flashcard,
            ResourceKind::MultipleChoice => self.multiple_choice,
            ResourceKind::Storyboard => self.storyboard,
        }
    }

    /// Same table with one kind's weight replaced.
    pub fn with_weight(mut self, kind: ResourceKind, weight: u32) -> Self {
        match kind {
            ResourceKind::ConceptMap => self.concept_map = weight,
            ResourceKind::Flashcard => self.flashcard = weight,
            ResourceKind::MultipleChoice => self.multiple_choice = weight,
            ResourceKind::Storyboard => self.storyboard = weight,
        }
        self
    }

    /// Every weight must be positive.
    pub fn validate(&self) -> RecallResult<()> {
        for kind in ResourceKind::ALL {
            if self.weight(kind) == 0 {
                return Err(RecallError::Configuration(format!(
                    "weight for {} must be positive",
                    kind
                )));
            }
        }
        Ok(())
    }
}
