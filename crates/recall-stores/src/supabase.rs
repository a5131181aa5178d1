//! Supabase resource store (PostgREST over HTTP).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::Value;

use recall_core::error::{ErrorCode, RecallError, RecallResult};
use recall_core::traits::{ResourceStore, StoreConfig};
use recall_core::types::{Filter, FilterCondition, FilterOperator, FilterTranslator, Query, Row, Update};

/// Supabase resource store.
pub struct SupabaseStore {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl SupabaseStore {
    /// Create a store for the project at `url`.
    pub fn new(url: &str, api_key: &str) -> RecallResult<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| RecallError::Configuration(format!("Invalid Supabase URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RecallError::Configuration(format!(
                "Supabase URL must be http(s), got '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            headers: headers(api_key)?,
        })
    }

    /// Create a store from configuration, falling back to `SUPABASE_URL` and
    /// `SUPABASE_SERVICE_ROLE_KEY`.
    pub fn from_config(config: &StoreConfig) -> RecallResult<Self> {
        let url = config
            .url
            .clone()
            .or_else(|| std::env::var("SUPABASE_URL").ok())
            .ok_or_else(|| RecallError::Configuration("Supabase URL required".to_string()))?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("SUPABASE_SERVICE_ROLE_KEY").ok())
            .ok_or_else(|| RecallError::Configuration("Supabase API key required".to_string()))?;

        Self::new(&url, &api_key)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}

fn headers(api_key: &str) -> RecallResult<HeaderMap> {
    let invalid = |_: InvalidHeaderValue| RecallError::Configuration("Supabase API key is not a valid header value".to_string());

    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(api_key).map_err(invalid)?);
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(invalid)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

async fn ensure_success(response: Response, action: &str, code: ErrorCode) -> RecallResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error = response.text().await.unwrap_or_default();
    Err(RecallError::Storage {
        message: format!("Failed to {} ({}): {}", action, status, error),
        code,
        source: None,
    })
}

#[async_trait]
impl ResourceStore for SupabaseStore {
    async fn select(&self, query: &Query) -> RecallResult<Vec<Row>> {
        let params = select_params(query)?;

        let response = self
            .client
            .get(self.rest_url(&query.table))
            .headers(self.headers.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| RecallError::storage_with_source(format!("Failed to query {}", query.table), e))?;
        let response = ensure_success(response, &format!("query {}", query.table), ErrorCode::StoQueryFailed).await?;

        let rows: Vec<Row> = response
            .json()
            .await
            .map_err(|e| RecallError::storage_with_source("Failed to parse response", e))?;

        tracing::debug!(table = %query.table, rows = rows.len(), "PostgREST select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> RecallResult<()> {
        let response = self
            .client
            .post(self.rest_url(table))
            .headers(self.headers.clone())
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| RecallError::storage_with_source(format!("Failed to insert into {}", table), e))?;
        ensure_success(response, &format!("insert into {}", table), ErrorCode::StoQueryFailed).await?;
        Ok(())
    }

    async fn update(&self, update: &Update) -> RecallResult<u64> {
        if update.filters.is_empty() {
            return Err(RecallError::validation("update must be filtered"));
        }
        let params = PostgrestTranslator.translate(&Filter::And(update.filters.clone()))?;

        // The updated rows come back so they can be counted.
        let response = self
            .client
            .patch(self.rest_url(&update.table))
            .headers(self.headers.clone())
            .header("Prefer", "return=representation")
            .query(&params)
            .json(&update.patch)
            .send()
            .await
            .map_err(|e| RecallError::Storage {
                message: format!("Failed to update {}: {}", update.table, e),
                code: ErrorCode::StoUpdateFailed,
                source: Some(Box::new(e)),
            })?;
        let response = ensure_success(response, &format!("update {}", update.table), ErrorCode::StoUpdateFailed).await?;

        let updated: Vec<Value> = response
            .json()
            .await
            .map_err(|e| RecallError::storage_with_source("Failed to parse response", e))?;
        Ok(updated.len() as u64)
    }

    fn name(&self) -> &str {
        "supabase"
    }
}

/// Query-string parameters for a select.
pub fn select_params(query: &Query) -> RecallResult<Vec<(String, String)>> {
    let mut params = vec![("select".to_string(), query.columns.join(","))];
    if query.selects_all() {
        params[0].1 = "*".to_string();
    }

    for filter in &query.filters {
        params.extend(PostgrestTranslator.translate(filter)?);
    }

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| {
                let direction = if o.ascending { "asc" } else { "desc" };
                let nulls = if o.nulls_first { "nullsfirst" } else { "nullslast" };
                format!("{}.{}.{}", o.field, direction, nulls)
            })
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    Ok(params)
}

/// Translates filters into PostgREST query parameters.
///
/// Repeated parameters are ANDed by PostgREST, so a top-level AND flattens
/// into several pairs. OR groups become `or=(...)` logic trees.
pub struct PostgrestTranslator;

impl FilterTranslator for PostgrestTranslator {
    type Output = Vec<(String, String)>;
    type Error = RecallError;

    fn translate(&self, filter: &Filter) -> Result<Self::Output, Self::Error> {
        match filter {
            Filter::Condition(c) => Ok(vec![(c.field.clone(), operator(c))]),
            Filter::And(filters) => {
                let mut params = Vec::new();
                for f in filters {
                    params.extend(self.translate(f)?);
                }
                Ok(params)
            }
            Filter::Or(filters) => Ok(vec![("or".to_string(), format!("({})", tree(filters)?))]),
            Filter::Not(inner) => match inner.as_ref() {
                Filter::Condition(c) => Ok(vec![(c.field.clone(), format!("not.{}", operator(c)))]),
                Filter::And(filters) => Ok(vec![("not.and".to_string(), format!("({})", tree(filters)?))]),
                Filter::Or(filters) => Ok(vec![("not.or".to_string(), format!("({})", tree(filters)?))]),
                Filter::Not(inner) => self.translate(inner),
            },
        }
    }
}

/// Members of a logic tree, comma separated.
fn tree(filters: &[Filter]) -> RecallResult<String> {
    if filters.is_empty() {
        return Err(RecallError::validation("empty filter group"));
    }
    Ok(filters
        .iter()
        .map(nested)
        .collect::<RecallResult<Vec<_>>>()?
        .join(","))
}

fn nested(filter: &Filter) -> RecallResult<String> {
    Ok(match filter {
        Filter::Condition(c) => format!("{}.{}", c.field, operator(c)),
        Filter::And(filters) => format!("and({})", tree(filters)?),
        Filter::Or(filters) => format!("or({})", tree(filters)?),
        Filter::Not(inner) => match inner.as_ref() {
            Filter::Condition(c) => format!("{}.not.{}", c.field, operator(c)),
            Filter::And(filters) => format!("not.and({})", tree(filters)?),
            Filter::Or(filters) => format!("not.or({})", tree(filters)?),
            Filter::Not(inner) => nested(inner)?,
        },
    })
}

fn operator(condition: &FilterCondition) -> String {
    match &condition.operator {
        FilterOperator::Eq(v) => format!("eq.{}", literal(v)),
        FilterOperator::Ne(v) => format!("neq.{}", literal(v)),
        FilterOperator::Gt(v) => format!("gt.{}", literal(v)),
        FilterOperator::Gte(v) => format!("gte.{}", literal(v)),
        FilterOperator::Lt(v) => format!("lt.{}", literal(v)),
        FilterOperator::Lte(v) => format!("lte.{}", literal(v)),
        FilterOperator::In(values) => format!(
            "in.({})",
            values.iter().map(literal).collect::<Vec<_>>().join(",")
        ),
        FilterOperator::IsNull => "is.null".to_string(),
        FilterOperator::IsNotNull => "not.is.null".to_string(),
    }
}

/// Render a value, quoting strings that contain PostgREST delimiters.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\') || c.is_whitespace()) {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                s.clone()
            }
        }
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_due_query_params() {
        let query = Query::table("flashcards")
            .eq("user_id", "u1")
            .or(vec![
                Filter::is_null("next_review_at"),
                Filter::lte("next_review_at", "2026-03-01T00:00:00.000Z"),
            ])
            .order("next_review_at", true)
            .limit(50);

        let params = select_params(&query).unwrap();
        assert_eq!(
            pairs(&params),
            vec![
                ("select", "*"),
                ("user_id", "eq.u1"),
                ("or", "(next_review_at.is.null,next_review_at.lte.2026-03-01T00:00:00.000Z)"),
                ("order", "next_review_at.asc.nullslast"),
                ("limit", "50"),
            ]
        );
    }

    #[test]
    fn test_nulls_first_order_param() {
        let query = Query::table("flashcards")
            .order_nulls_first("next_review_at", true)
            .order("created_at", true);

        let params = select_params(&query).unwrap();
        assert!(pairs(&params).contains(&(
            "order",
            "next_review_at.asc.nullsfirst,created_at.asc.nullslast"
        )));
    }

    #[test]
    fn test_projection_and_negation() {
        let query = Query::table("storyboards")
            .select("id, review_count")
            .filter(Filter::not(Filter::eq("id", "s1")))
            .filter(Filter::not(Filter::or(vec![
                Filter::gt("review_count", 3),
                Filter::in_list("deck_id", vec![json!("a b"), json!(7)]),
            ])));

        let params = select_params(&query).unwrap();
        assert_eq!(
            pairs(&params),
            vec![
                ("select", "id,review_count"),
                ("id", "not.eq.s1"),
                ("not.or", "(review_count.gt.3,deck_id.in.(\"a b\",7))"),
            ]
        );
    }

    #[test]
    fn test_nested_groups() {
        let filter = Filter::or(vec![
            Filter::and(vec![Filter::eq("a", 1), Filter::not(Filter::is_null("b"))]),
            Filter::eq("c", "x,y"),
        ]);
        let params = PostgrestTranslator.translate(&filter).unwrap();
        assert_eq!(pairs(&params), vec![("or", "(and(a.eq.1,b.not.is.null),c.eq.\"x,y\")")]);
    }

    #[test]
    fn test_empty_group_is_rejected() {
        assert!(PostgrestTranslator.translate(&Filter::or(Vec::new())).is_err());
    }

    #[test]
    fn test_new_validates_url_and_key() {
        assert!(SupabaseStore::new("not a url", "key").is_err());
        assert!(SupabaseStore::new("ftp://example.com", "key").is_err());
        assert!(SupabaseStore::new("https://example.supabase.co", "bad\nkey").is_err());

        let store = SupabaseStore::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(store.rest_url("flashcards"), "https://example.supabase.co/rest/v1/flashcards");
        assert_eq!(store.name(), "supabase");
    }

    #[tokio::test]
    async fn test_unfiltered_update_is_rejected() {
        let store = SupabaseStore::new("https://example.supabase.co", "key").unwrap();
        let err = store
            .update(&Update::table("flashcards").set("review_count", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Validation { .. }));
    }
}
