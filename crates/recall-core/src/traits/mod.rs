//! Core traits for recall collaborators.

mod store;
mod user;

pub use store::*;
pub use user::*;
