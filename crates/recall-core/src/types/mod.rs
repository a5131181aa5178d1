//! Core types for recall.

mod query;
mod resource;
mod session;
mod time;
mod weight;

pub use query::*;
pub use resource::*;
pub use session::{validate_score, CompletedReview, ReviewSession};
pub use time::{format_timestamp, parse_timestamp};
pub use weight::ReviewWeights;
