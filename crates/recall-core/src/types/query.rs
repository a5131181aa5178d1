//! Row-oriented query model for the storage layer.
//!
//! Mirrors the `select / eq / or / gt / order / limit` surface of the backing
//! datastore. Filters form a tree that backends either evaluate in-process
//! ([`Filter::matches`]) or translate into their own syntax via
//! [`FilterTranslator`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::time::parse_timestamp;

/// A stored row: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Filter operator for column comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to.
    Eq(Value),
    /// Not equal to.
    Ne(Value),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal to.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal to.
    Lte(Value),
    /// In list.
    In(Vec<Value>),
    /// Is null (or the column is missing).
    IsNull,
    /// Is not null.
    IsNotNull,
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Column to filter on.
    pub field: String,
    /// Operator to apply.
    pub operator: FilterOperator,
}

impl FilterCondition {
    fn new(field: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            field: field.into(),
            operator,
        }
    }

    /// Evaluate against a row. Comparisons against null are false.
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(&self.field).unwrap_or(&Value::Null);
        match &self.operator {
            FilterOperator::IsNull => value.is_null(),
            FilterOperator::IsNotNull => !value.is_null(),
            FilterOperator::Eq(expected) => !value.is_null() && values_equal(value, expected),
            FilterOperator::Ne(expected) => !value.is_null() && !values_equal(value, expected),
            FilterOperator::In(list) => {
                !value.is_null() && list.iter().any(|v| values_equal(value, v))
            }
            FilterOperator::Gt(bound) => compare_values(value, bound) == Some(Ordering::Greater),
            FilterOperator::Gte(bound) => matches!(
                compare_values(value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt(bound) => compare_values(value, bound) == Some(Ordering::Less),
            FilterOperator::Lte(bound) => matches!(
                compare_values(value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Composite filter with AND/OR/NOT logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Single condition.
    Condition(FilterCondition),
    /// AND of multiple filters.
    And(Vec<Filter>),
    /// OR of multiple filters.
    Or(Vec<Filter>),
    /// NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::Eq(value.into())))
    }

    /// Create an inequality filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::Ne(value.into())))
    }

    /// Create a greater than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::Gt(value.into())))
    }

    /// Create a greater than or equal filter.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::Gte(value.into())))
    }

    /// Create a less than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::Lt(value.into())))
    }

    /// Create a less than or equal filter.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::Lte(value.into())))
    }

    /// Create an in-list filter.
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::In(values)))
    }

    /// Create an is null filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::IsNull))
    }

    /// Create an is not null filter.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Filter::Condition(FilterCondition::new(field, FilterOperator::IsNotNull))
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Create a NOT filter.
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Evaluate against a row.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Condition(c) => c.matches(row),
            Filter::And(filters) => filters.iter().all(|f| f.matches(row)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
            Filter::Not(inner) => !inner.matches(row),
        }
    }
}

/// Trait for translating filters to backend-specific formats.
pub trait FilterTranslator {
    type Output;
    type Error;

    /// Translate a filter to the backend-specific format.
    fn translate(&self, filter: &Filter) -> Result<Self::Output, Self::Error>;
}

/// Sort key for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
    /// Nulls sort before every value when set, after every value otherwise.
    #[serde(default)]
    pub nulls_first: bool,
}

/// A select against one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub table: String,
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query selecting every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec!["*".to_string()],
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the returned columns (comma separated, `*` for all).
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::gt(field, value))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::gte(field, value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::lt(field, value))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::lte(field, value))
    }

    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.filter(Filter::is_null(field))
    }

    /// Add an OR group; it is ANDed with the other filters.
    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::or(filters))
    }

    /// Add an arbitrary filter; filters are ANDed.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sort by `field`. Nulls go last ascending and first descending.
    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            ascending,
            nulls_first: !ascending,
        });
        self
    }

    /// Sort by `field` with nulls ahead of every value.
    pub fn order_nulls_first(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            ascending,
            nulls_first: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// All filters combined into one, if there are any.
    pub fn combined_filter(&self) -> Option<Filter> {
        match self.filters.len() {
            0 => None,
            1 => Some(self.filters[0].clone()),
            _ => Some(Filter::And(self.filters.clone())),
        }
    }

    /// Whether every column is selected.
    pub fn selects_all(&self) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == "*")
    }

    /// Execute against rows held in memory.
    ///
    /// Null placement follows each key's `nulls_first`.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut matched: Vec<&Row> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .collect();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| {
                for key in &self.order {
                    let ord = order_values(a.get(&key.field), b.get(&key.field), key);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let limit = self.limit.unwrap_or(usize::MAX);
        matched
            .into_iter()
            .take(limit)
            .map(|row| self.project(row))
            .collect()
    }

    fn project(&self, row: &Row) -> Row {
        if self.selects_all() {
            return row.clone();
        }
        self.columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }
}

/// A partial update against one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub table: String,
    pub patch: Row,
    pub filters: Vec<Filter>,
}

impl Update {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            patch: Row::new(),
            filters: Vec::new(),
        }
    }

    /// Set one column.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.patch.insert(field.into(), value.into());
        self
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    /// All filters combined into one, if there are any.
    pub fn combined_filter(&self) -> Option<Filter> {
        match self.filters.len() {
            0 => None,
            1 => Some(self.filters[0].clone()),
            _ => Some(Filter::And(self.filters.clone())),
        }
    }

    /// Whether `row` is targeted by this update.
    pub fn targets(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::Number(y)) | (Value::Number(y), Value::String(x)) => {
            *x == y.to_string()
        }
        _ => a == b,
    }
}

/// Compare two non-null scalars. Strings that both parse as timestamps
/// compare chronologically.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn order_values(a: Option<&Value>, b: Option<&Value>, key: &OrderBy) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let null_rank = if key.nulls_first {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => null_rank,
        (Some(_), None) => null_rank.reverse(),
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
            if key.ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}
