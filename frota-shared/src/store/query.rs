/// Table query builder
///
/// A `Query` names a table and carries exact-match and substring filters,
/// ordering and an optional row window. The same query value is rendered to
/// REST query parameters by `RestStore` and evaluated row-by-row by
/// `InMemoryStore`, so both backends agree on filter semantics.
///
/// # Example
///
/// ```
/// use frota_shared::store::Query;
///
/// let query = Query::table("drivers")
///     .eq("company_id", 7)
///     .ilike("name", "%silva%")
///     .order("id", false)
///     .range(0, 10);
///
/// let params = query.to_params();
/// assert!(params.contains(&("company_id".to_string(), "eq.7".to_string())));
/// assert!(params.contains(&("name".to_string(), "ilike.*silva*".to_string())));
/// ```

use serde_json::Value;
use std::cmp::Ordering;

use super::Row;

/// A single row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value (`null` matches missing or null columns)
    Eq(String, Value),

    /// Case-insensitive pattern match, `%` is the wildcard
    ILike(String, String),

    /// Column equals any of the values
    In(String, Vec<Value>),

    /// Any of the nested filters matches
    Or(Vec<Filter>),
}

impl Filter {
    /// Evaluates the filter against a row
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq(column, expected) => {
                let actual = row.get(column).unwrap_or(&Value::Null);
                values_equal(actual, expected)
            }
            Filter::ILike(column, pattern) => match row.get(column) {
                Some(Value::String(text)) => like_match(text, pattern),
                Some(Value::Number(n)) => like_match(&n.to_string(), pattern),
                _ => false,
            },
            Filter::In(column, values) => {
                let actual = row.get(column).unwrap_or(&Value::Null);
                values.iter().any(|v| values_equal(actual, v))
            }
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    fn to_condition(&self) -> String {
        match self {
            Filter::Eq(column, Value::Null) => format!("{}.is.null", column),
            Filter::Eq(column, value) => format!("{}.eq.{}", column, render_value(value)),
            Filter::ILike(column, pattern) => {
                format!("{}.ilike.{}", column, pattern.replace('%', "*"))
            }
            Filter::In(column, values) => format!("{}.in.({})", column, render_list(values)),
            Filter::Or(filters) => format!(
                "or({})",
                filters
                    .iter()
                    .map(Filter::to_condition)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}

/// Query against a single table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Table name
    pub table: String,

    /// Filters, all of which must match
    pub filters: Vec<Filter>,

    /// Ordering column and direction (`true` = ascending)
    pub order: Option<(String, bool)>,

    /// Rows to skip
    pub offset: Option<u64>,

    /// Maximum rows to return
    pub limit: Option<u64>,
}

impl Query {
    /// Starts a query on `table` with no filters
    pub fn table(table: impl Into<String>) -> Self {
        Query {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
        }
    }

    /// Adds an exact-match filter
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    /// Adds a case-insensitive pattern filter (`%` wildcard)
    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike(column.into(), pattern.into()));
        self
    }

    /// Adds a membership filter
    pub fn in_list<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::In(
            column.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Adds a disjunction of filters
    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(filters));
        self
    }

    /// Sets the ordering
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some((column.into(), ascending));
        self
    }

    /// Sets the row window
    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Sets only the row limit
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Drops ordering and window, keeping table and filters
    pub fn filters_only(&self) -> Self {
        Query {
            table: self.table.clone(),
            filters: self.filters.clone(),
            order: None,
            offset: None,
            limit: None,
        }
    }

    /// Returns true when every filter matches the row
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Orders and windows an already filtered row set
    pub fn apply_window(&self, mut rows: Vec<Row>) -> Vec<Row> {
        if let Some((column, ascending)) = &self.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(column).unwrap_or(&Value::Null),
                    b.get(column).unwrap_or(&Value::Null),
                );
                if *ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let offset = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let iter = rows.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        }
    }

    /// Renders the query as REST query-string parameters
    ///
    /// Exact match becomes `col=eq.value`, pattern match `col=ilike.*x*`,
    /// membership `col=in.(a,b)` and disjunctions `or=(a.eq.1,b.eq.2)`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        for filter in &self.filters {
            match filter {
                Filter::Eq(column, Value::Null) => {
                    params.push((column.clone(), "is.null".to_string()));
                }
                Filter::Eq(column, value) => {
                    params.push((column.clone(), format!("eq.{}", render_value(value))));
                }
                Filter::ILike(column, pattern) => {
                    params.push((column.clone(), format!("ilike.{}", pattern.replace('%', "*"))));
                }
                Filter::In(column, values) => {
                    params.push((column.clone(), format!("in.({})", render_list(values))));
                }
                Filter::Or(filters) => {
                    let inner = filters
                        .iter()
                        .map(Filter::to_condition)
                        .collect::<Vec<_>>()
                        .join(",");
                    params.push(("or".to_string(), format!("({})", inner)));
                }
            }
        }

        if let Some((column, ascending)) = &self.order {
            let direction = if *ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", column, direction)));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Case-insensitive SQL `LIKE` match where `%` matches any run of characters
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();

    if parts.len() == 1 {
        return text == pattern;
    }

    let mut rest = text.as_str();
    let last = parts.len() - 1;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == last {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }

    true
}
