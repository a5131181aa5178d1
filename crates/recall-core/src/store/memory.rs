//! In-process resource store.
//!
//! Holds rows in memory and evaluates queries with [`Query::apply`]. Used by
//! tests and as the `memory` provider; nothing is persisted.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{RecallError, RecallResult};
use crate::traits::ResourceStore;
use crate::types::{Query, Row, Update};

/// Table name to rows.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table.
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Fetch one row by `id`, bypassing query scoping.
    pub async fn get(&self, table: &str, id: &str) -> Option<Row> {
        let query = Query::table(table).eq("id", id).limit(1);
        let tables = self.tables.read().await;
        tables
            .get(table)
            .and_then(|rows| query.apply(rows).into_iter().next())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn select(&self, query: &Query) -> RecallResult<Vec<Row>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&query.table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Row) -> RecallResult<()> {
        if !row.get("id").map(|v| !v.is_null()).unwrap_or(false) {
            return Err(RecallError::storage(format!(
                "insert into {} requires an id column",
                table
            )));
        }
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn update(&self, update: &Update) -> RecallResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&update.table) else {
            return Ok(0);
        };

        let mut changed = 0;
        for row in rows.iter_mut().filter(|row| update.targets(row)) {
            for (column, value) in &update.patch {
                row.insert(column.clone(), value.clone());
            }
            changed += 1;
        }
        Ok(changed)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
