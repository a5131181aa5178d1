//! recall-stores - Storage backends for recall.
//!
//! Every backend implements [`ResourceStore`] from `recall-core`.
//!
//! # Supported Backends
//!
//! - **Memory** (always available) - process-local, nothing persisted
//! - **SQLite** (feature: `sqlite`, default) - embedded single-file database
//! - **Supabase** (feature: `supabase`) - PostgREST over HTTP

mod factory;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "supabase")]
mod supabase;

// Public exports
pub use factory::StoreFactory;

#[cfg(feature = "sqlite")]
pub use sqlite::{build_select, build_update, SqlFilter, SqlTranslator, SqliteStore};

#[cfg(feature = "supabase")]
pub use supabase::{select_params, PostgrestTranslator, SupabaseStore};

// Re-export core types for convenience
pub use recall_core::store::MemoryStore;
pub use recall_core::traits::{ResourceStore, StoreConfig, StoreProvider};
