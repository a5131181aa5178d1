//! Resource store trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::RecallResult;
use crate::types::{Query, Row, Update};

/// Core ResourceStore trait - all storage backends implement this.
///
/// Backends are row-oriented: rows are JSON objects keyed by column name.
/// Every call is a single round trip; implementations must not retry, and an
/// update either applies all of its columns or none.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Run a select and return matching rows.
    async fn select(&self, query: &Query) -> RecallResult<Vec<Row>>;

    /// Insert one row.
    async fn insert(&self, table: &str, row: Row) -> RecallResult<()>;

    /// Apply a partial update. Returns the number of rows changed.
    async fn update(&self, update: &Update) -> RecallResult<u64>;

    /// Backend name, for logs and health output.
    fn name(&self) -> &str;
}

/// Storage provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreProvider {
    /// Process-local, non-persistent.
    Memory,
    /// SQLite file.
    #[default]
    Sqlite,
    /// Supabase / PostgREST over HTTP.
    Supabase,
}

impl std::str::FromStr for StoreProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in_memory" => Ok(StoreProvider::Memory),
            "sqlite" => Ok(StoreProvider::Sqlite),
            "supabase" | "postgrest" => Ok(StoreProvider::Supabase),
            other => Err(format!("unknown store provider '{}'", other)),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Provider type.
    pub provider: StoreProvider,
    /// Database file (sqlite).
    pub path: PathBuf,
    /// Base URL (supabase).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// API key (supabase).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let recall_dir = dirs::home_dir()
            .map(|h| h.join(".recall"))
            .unwrap_or_else(|| PathBuf::from(".recall"));

        Self {
            provider: StoreProvider::Sqlite,
            path: recall_dir.join("recall.db"),
            url: None,
            api_key: None,
        }
    }
}
