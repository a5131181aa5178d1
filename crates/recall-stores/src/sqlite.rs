//! SQLite resource store.
//!
//! One table per resource kind. `content` is stored as JSON text and handed
//! back as a string; the normalizers decode it. Timestamps are canonical
//! RFC 3339 text, so range filters compare correctly as strings.
//!
//! # Example
//!
//! ```ignore
//! use recall_stores::SqliteStore;
//!
//! let store = SqliteStore::new("~/.recall/recall.db")?;
//! ```

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use recall_core::error::{ErrorCode, RecallError, RecallResult};
use recall_core::traits::ResourceStore;
use recall_core::types::{
    Filter, FilterOperator, FilterTranslator, Query, ResourceKind, Row, Update,
};

/// SQLite-backed resource store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn new<P: AsRef<Path>>(path: P) -> RecallResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref()).map_err(|e| RecallError::Storage {
            message: format!(
                "Failed to open SQLite database at {}: {}",
                path.as_ref().display(),
                e
            ),
            code: ErrorCode::StoConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> RecallResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| RecallError::Storage {
            message: format!("Failed to open in-memory SQLite database: {}", e),
            code: ErrorCode::StoConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> RecallResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> RecallResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RecallError::storage(format!("Failed to acquire lock: {}", e)))
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> RecallResult<()> {
        let conn = self.lock()?;
        for kind in ResourceKind::ALL {
            let table = kind.table();
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{table}" (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    title TEXT,
                    content TEXT NOT NULL,
                    deck_id TEXT,
                    created_at TEXT NOT NULL,
                    last_reviewed_at TEXT,
                    next_review_at TEXT,
                    review_count INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_{table}_user_due ON "{table}"(user_id, next_review_at);
                "#
            ))
            .map_err(|e| RecallError::storage_with_source(format!("Failed to create table {}", table), e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    async fn select(&self, query: &Query) -> RecallResult<Vec<Row>> {
        let (sql, params) = build_select(query)?;
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RecallError::storage_with_source(format!("Failed to prepare select on {}", query.table), e))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut out = Row::new();
                for (i, name) in names.iter().enumerate() {
                    out.insert(name.clone(), from_sql(row.get_ref(i)?));
                }
                Ok(out)
            })
            .map_err(|e| RecallError::storage_with_source(format!("Failed to query {}", query.table), e))?;

        let rows = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RecallError::storage_with_source(format!("Failed to read rows from {}", query.table), e))?;

        tracing::debug!(table = %query.table, rows = rows.len(), "SQLite select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> RecallResult<()> {
        if row.is_empty() {
            return Err(RecallError::validation("cannot insert an empty row"));
        }
        let columns = row
            .keys()
            .map(|c| ident(c))
            .collect::<RecallResult<Vec<_>>>()?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            ident(table)?,
            columns.join(", "),
            placeholders
        );
        let params: Vec<SqlValue> = row.values().map(to_sql).collect();

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| RecallError::storage_with_source(format!("Failed to insert into {}", table), e))?;
        Ok(())
    }

    async fn update(&self, update: &Update) -> RecallResult<u64> {
        let (sql, params) = build_update(update)?;
        let conn = self.lock()?;
        let changed = conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| RecallError::Storage {
                message: format!("Failed to update {}: {}", update.table, e),
                code: ErrorCode::StoUpdateFailed,
                source: Some(Box::new(e)),
            })?;
        Ok(changed as u64)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// A translated `WHERE` clause and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Translates filters into SQLite `WHERE` clauses.
pub struct SqlTranslator;

impl FilterTranslator for SqlTranslator {
    type Output = SqlFilter;
    type Error = RecallError;

    fn translate(&self, filter: &Filter) -> Result<SqlFilter, RecallError> {
        let mut params = Vec::new();
        let sql = clause(filter, &mut params)?;
        Ok(SqlFilter { sql, params })
    }
}

fn clause(filter: &Filter, params: &mut Vec<SqlValue>) -> RecallResult<String> {
    match filter {
        Filter::Condition(condition) => {
            let column = ident(&condition.field)?;
            Ok(match &condition.operator {
                FilterOperator::Eq(v) => bind(&column, "=", v, params),
                FilterOperator::Ne(v) => bind(&column, "<>", v, params),
                FilterOperator::Gt(v) => bind(&column, ">", v, params),
                FilterOperator::Gte(v) => bind(&column, ">=", v, params),
                FilterOperator::Lt(v) => bind(&column, "<", v, params),
                FilterOperator::Lte(v) => bind(&column, "<=", v, params),
                FilterOperator::In(values) if values.is_empty() => "0".to_string(),
                FilterOperator::In(values) => {
                    params.extend(values.iter().map(to_sql));
                    format!("{} IN ({})", column, vec!["?"; values.len()].join(", "))
                }
                FilterOperator::IsNull => format!("{} IS NULL", column),
                FilterOperator::IsNotNull => format!("{} IS NOT NULL", column),
            })
        }
        Filter::And(filters) => group(filters, " AND ", "1", params),
        Filter::Or(filters) => group(filters, " OR ", "0", params),
        Filter::Not(inner) => Ok(format!("NOT ({})", clause(inner, params)?)),
    }
}

fn bind(column: &str, op: &str, value: &Value, params: &mut Vec<SqlValue>) -> String {
    params.push(to_sql(value));
    format!("{} {} ?", column, op)
}

fn group(
    filters: &[Filter],
    joiner: &str,
    empty: &str,
    params: &mut Vec<SqlValue>,
) -> RecallResult<String> {
    if filters.is_empty() {
        return Ok(empty.to_string());
    }
    let parts = filters
        .iter()
        .map(|f| clause(f, params))
        .collect::<RecallResult<Vec<_>>>()?;
    Ok(format!("({})", parts.join(joiner)))
}

/// Render a select. Null placement is explicit on every sort key.
pub fn build_select(query: &Query) -> RecallResult<(String, Vec<SqlValue>)> {
    let columns = if query.selects_all() {
        "*".to_string()
    } else {
        query
            .columns
            .iter()
            .map(|c| ident(c))
            .collect::<RecallResult<Vec<_>>>()?
            .join(", ")
    };

    let mut sql = format!("SELECT {} FROM {}", columns, ident(&query.table)?);
    let mut params = Vec::new();

    if let Some(filter) = query.combined_filter() {
        let translated = SqlTranslator.translate(&filter)?;
        sql.push_str(" WHERE ");
        sql.push_str(&translated.sql);
        params = translated.params;
    }

    if !query.order.is_empty() {
        let keys = query
            .order
            .iter()
            .map(|o| {
                let direction = if o.ascending { "ASC" } else { "DESC" };
                let nulls = if o.nulls_first { "NULLS FIRST" } else { "NULLS LAST" };
                Ok(format!("{} {} {}", ident(&o.field)?, direction, nulls))
            })
            .collect::<RecallResult<Vec<_>>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok((sql, params))
}

/// Render an update as one statement. Unfiltered updates are rejected.
pub fn build_update(update: &Update) -> RecallResult<(String, Vec<SqlValue>)> {
    if update.patch.is_empty() {
        return Err(RecallError::validation("update sets no columns"));
    }
    let Some(filter) = update.combined_filter() else {
        return Err(RecallError::validation("update must be filtered"));
    };

    let assignments = update
        .patch
        .keys()
        .map(|c| Ok(format!("{} = ?", ident(c)?)))
        .collect::<RecallResult<Vec<_>>>()?;
    let mut params: Vec<SqlValue> = update.patch.values().map(to_sql).collect();

    let translated = SqlTranslator.translate(&filter)?;
    params.extend(translated.params);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        ident(&update.table)?,
        assignments.join(", "),
        translated.sql
    );
    Ok((sql, params))
}

/// Quote a table or column name. Only plain identifiers are accepted.
fn ident(name: &str) -> RecallResult<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(RecallError::validation(format!("invalid identifier '{}'", name)));
    }
    Ok(format!("\"{}\"", name))
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::normalize;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn card(id: &str, user: &str, next: Option<&str>) -> Row {
        row(json!({
            "id": id,
            "user_id": user,
            "title": format!("Card {}", id),
            "content": {"front": "Q", "back": "A"},
            "created_at": "2026-01-01T00:00:00.000Z",
            "next_review_at": next,
            "review_count": 0
        }))
    }

    fn create_test_store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_select_normalizes() {
        let store = create_test_store();
        store.insert("flashcards", card("c1", "u1", None)).await.unwrap();

        let rows = store
            .select(&Query::table("flashcards").eq("user_id", "u1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        // Content comes back as JSON text.
        assert!(rows[0]["content"].is_string());

        let resource = normalize(ResourceKind::Flashcard, &rows[0]).unwrap();
        assert_eq!(resource.id, "c1");
        assert_eq!(resource.title, "Card c1");
        assert!(resource.review.next_review_at.is_none());
    }

    #[tokio::test]
    async fn test_due_filter_order_and_limit() {
        let store = create_test_store();
        store.insert("flashcards", card("late", "u1", Some("2026-03-05T00:00:00.000Z"))).await.unwrap();
        store.insert("flashcards", card("early", "u1", Some("2026-02-01T00:00:00.000Z"))).await.unwrap();
        store.insert("flashcards", card("never", "u1", None)).await.unwrap();
        store.insert("flashcards", card("future", "u1", Some("2026-09-01T00:00:00.000Z"))).await.unwrap();
        store.insert("flashcards", card("theirs", "u2", None)).await.unwrap();

        let query = Query::table("flashcards")
            .select("id, next_review_at")
            .eq("user_id", "u1")
            .or(vec![
                Filter::is_null("next_review_at"),
                Filter::lte("next_review_at", "2026-03-10T00:00:00.000Z"),
            ])
            .order("next_review_at", true);

        let rows = store.select(&query).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["early", "late", "never"]);
        assert_eq!(rows[0].len(), 2);

        let limited = store.select(&query.clone().limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_nulls_first_survive_limit() {
        let store = create_test_store();
        store.insert("flashcards", card("overdue", "u1", Some("2026-02-01T00:00:00.000Z"))).await.unwrap();
        store.insert("flashcards", card("never", "u1", None)).await.unwrap();

        let query = Query::table("flashcards")
            .eq("user_id", "u1")
            .order_nulls_first("next_review_at", true)
            .limit(1);
        let (sql, _) = build_select(&query).unwrap();
        assert!(sql.contains("ORDER BY \"next_review_at\" ASC NULLS FIRST"));

        let rows = store.select(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "never");
    }

    #[tokio::test]
    async fn test_update_is_scoped() {
        let store = create_test_store();
        store.insert("flashcards", card("c1", "u1", None)).await.unwrap();

        let update = Update::table("flashcards")
            .set("review_count", 1)
            .set("next_review_at", "2026-01-08T00:00:00.000Z")
            .eq("id", "c1");

        let foreign = update.clone().eq("user_id", "u2");
        assert_eq!(store.update(&foreign).await.unwrap(), 0);

        let own = update.eq("user_id", "u1");
        assert_eq!(store.update(&own).await.unwrap(), 1);

        let rows = store
            .select(&Query::table("flashcards").eq("id", "c1"))
            .await
            .unwrap();
        assert_eq!(rows[0]["review_count"], json!(1));
        assert_eq!(rows[0]["next_review_at"], json!("2026-01-08T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_unfiltered_update_is_rejected() {
        let store = create_test_store();
        let err = store
            .update(&Update::table("flashcards").set("review_count", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_a_storage_error() {
        let store = create_test_store();
        store.insert("flashcards", card("c1", "u1", None)).await.unwrap();
        let err = store.insert("flashcards", card("c1", "u1", None)).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_translate_nested_filter() {
        let filter = Filter::and(vec![
            Filter::eq("user_id", "u1"),
            Filter::or(vec![Filter::is_null("next_review_at"), Filter::not(Filter::in_list("id", vec![json!("a"), json!(2)]))]),
        ]);
        let translated = SqlTranslator.translate(&filter).unwrap();
        assert_eq!(
            translated.sql,
            r#"("user_id" = ? AND ("next_review_at" IS NULL OR NOT ("id" IN (?, ?))))"#
        );
        assert_eq!(
            translated.params,
            vec![
                SqlValue::Text("u1".to_string()),
                SqlValue::Text("a".to_string()),
                SqlValue::Integer(2)
            ]
        );
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        assert!(build_select(&Query::table("flashcards; DROP TABLE x")).is_err());
        assert!(build_select(&Query::table("flashcards").eq("id\" OR 1=1", 1)).is_err());
        assert!(ident("_ok_1").is_ok());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recall.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            tokio_test::block_on(store.insert("storyboards", row(json!({
                "id": "s1",
                "user_id": "u1",
                "content": {"scenes": []},
                "created_at": "2026-01-01T00:00:00.000Z"
            }))))
            .unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        let rows = tokio_test::block_on(reopened.select(&Query::table("storyboards"))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["review_count"], json!(0));
    }
}
