//! Review queue construction, rescheduling and session progression.

mod queue;
mod scheduler;
mod status;

pub use queue::{compare_urgency, select_within_budget, QueueBuilder};
pub use scheduler::ReviewScheduler;
pub use status::StatusUpdater;
