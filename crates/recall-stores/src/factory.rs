//! Factory for creating resource stores.

use std::sync::Arc;

use recall_core::error::{RecallError, RecallResult};
use recall_core::store::MemoryStore;
use recall_core::traits::{ResourceStore, StoreConfig, StoreProvider};

/// Factory for creating resource store providers.
pub struct StoreFactory;

impl StoreFactory {
    /// Create a resource store from the given configuration.
    pub fn create(config: &StoreConfig) -> RecallResult<Arc<dyn ResourceStore>> {
        let store: Arc<dyn ResourceStore> = match config.provider {
            StoreProvider::Memory => Arc::new(MemoryStore::new()),

            #[cfg(feature = "sqlite")]
            StoreProvider::Sqlite => Arc::new(crate::sqlite::SqliteStore::new(&config.path)?),

            #[cfg(feature = "supabase")]
            StoreProvider::Supabase => Arc::new(crate::supabase::SupabaseStore::from_config(config)?),

            #[allow(unreachable_patterns)]
            provider => {
                return Err(RecallError::UnsupportedProvider {
                    provider: format!("{:?}", provider),
                })
            }
        };

        tracing::info!(store = store.name(), "Created resource store");
        Ok(store)
    }

    /// Create a process-local store. Nothing is persisted.
    pub fn memory() -> Arc<dyn ResourceStore> {
        Arc::new(MemoryStore::new())
    }

    /// Create an in-memory SQLite store.
    #[cfg(feature = "sqlite")]
    pub fn sqlite_memory() -> RecallResult<Arc<dyn ResourceStore>> {
        Ok(Arc::new(crate::sqlite::SqliteStore::in_memory()?))
    }

    /// Create a Supabase store.
    #[cfg(feature = "supabase")]
    pub fn supabase(url: &str, api_key: &str) -> RecallResult<Arc<dyn ResourceStore>> {
        Ok(Arc::new(crate::supabase::SupabaseStore::new(url, api_key)?))
    }
}
