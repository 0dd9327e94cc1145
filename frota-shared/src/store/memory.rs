/// In-process table store
///
/// Mirrors the behaviour of the hosted store closely enough to exercise the
/// domain flows without a network:
///
/// - auto-increment `id` per table
/// - unique constraints on natural keys, reported as `StoreError::Conflict`
/// - case-insensitive `ilike` and `count` queries
/// - one-shot failure injection per table and operation
///
/// # Example
///
/// ```
/// use frota_shared::store::{InMemoryStore, Query, TableStore};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), frota_shared::store::StoreError> {
/// let store = InMemoryStore::with_default_schema();
/// let row = json!({"abbreviation": "SP", "name": "São Paulo"});
/// store.insert("states", row.as_object().cloned().unwrap()).await?;
///
/// let sp = store.maybe_single(&Query::table("states").eq("abbreviation", "SP")).await?;
/// assert!(sp.is_some());
/// # Ok(())
/// # }
/// ```

use super::{Query, Row, StoreError, StoreResult, TableStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

#[derive(Debug)]
struct InjectedFailure {
    table: String,
    op: StoreOp,
    error: StoreError,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    next_ids: HashMap<String, i64>,
    unique: HashMap<String, Vec<Vec<String>>>,
    failures: Vec<InjectedFailure>,
    calls: Vec<(String, StoreOp)>,
}

impl Inner {
    fn take_failure(&mut self, table: &str, op: StoreOp) -> Option<StoreError> {
        self.calls.push((table.to_string(), op));
        let pos = self
            .failures
            .iter()
            .position(|f| f.table == table && f.op == op)?;
        Some(self.failures.remove(pos).error)
    }

    fn check_unique(&self, table: &str, candidate: &Row, skip_id: Option<i64>) -> StoreResult<()> {
        let Some(constraints) = self.unique.get(table) else {
            return Ok(());
        };
        let rows = self.tables.get(table).map(Vec::as_slice).unwrap_or(&[]);

        for columns in constraints {
            let key: Vec<&Value> = columns
                .iter()
                .map(|c| candidate.get(c).unwrap_or(&Value::Null))
                .collect();
            // NULLs never collide, as in SQL
            if key.iter().any(|v| v.is_null()) {
                continue;
            }

            let clash = rows.iter().any(|row| {
                let same_row = skip_id.is_some() && row.get("id").and_then(Value::as_i64) == skip_id;
                !same_row
                    && columns
                        .iter()
                        .zip(&key)
                        .all(|(c, v)| row.get(c).unwrap_or(&Value::Null) == *v)
            });

            if clash {
                return Err(StoreError::Conflict {
                    table: table.to_string(),
                    message: format!(
                        "duplicate key value violates unique constraint ({})",
                        columns.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }
}

/// In-memory `TableStore`
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store without constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the natural-key constraints of the Frota schema
    pub fn with_default_schema() -> Self {
        Self::new()
            .with_unique("states", &["abbreviation"])
            .with_unique("cities", &["name", "state_id"])
            .with_unique("neighborhoods", &["name", "city_id"])
            .with_unique("streets", &["name", "postal_code", "neighborhood_id"])
            .with_unique("drivers", &["company_id", "document"])
            .with_unique("clients", &["company_id", "document"])
            .with_unique("vehicles", &["company_id", "plate"])
    }

    /// Registers a unique constraint over `columns` of `table`
    pub fn with_unique(self, table: &str, columns: &[&str]) -> Self {
        self.lock()
            .unique
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Makes the next `op` on `table` fail with `error`
    pub fn fail_next(&self, table: &str, op: StoreOp, error: StoreError) {
        self.lock().failures.push(InjectedFailure {
            table: table.to_string(),
            op,
            error,
        });
    }

    /// Returns a snapshot of all rows of a table
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of rows currently in a table
    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map(Vec::len).unwrap_or(0)
    }

    /// Number of calls of `op` made against `table`
    pub fn call_count(&self, table: &str, op: StoreOp) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(t, o)| t == table && *o == op)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(&query.table, StoreOp::Select) {
            return Err(err);
        }

        let rows: Vec<Row> = inner
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        Ok(query.apply_window(rows))
    }

    async fn count(&self, query: &Query) -> StoreResult<u64> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(&query.table, StoreOp::Count) {
            return Err(err);
        }

        Ok(inner
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, table: &str, mut row: Row) -> StoreResult<Row> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(table, StoreOp::Insert) {
            return Err(err);
        }

        inner.check_unique(table, &row, None)?;

        let id = match row.get("id").and_then(Value::as_i64) {
            Some(id) => id,
            None => {
                let next = inner.next_ids.get(table).copied().unwrap_or(0) + 1;
                row.insert("id".to_string(), Value::from(next));
                next
            }
        };
        let counter = inner.next_ids.entry(table.to_string()).or_insert(0);
        *counter = (*counter).max(id);

        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());

        Ok(row)
    }

    async fn update(&self, query: &Query, patch: Row) -> StoreResult<Vec<Row>> {
        if query.filters.is_empty() {
            return Err(StoreError::UnfilteredWrite(query.table.clone()));
        }

        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(&query.table, StoreOp::Update) {
            return Err(err);
        }

        let existing = inner.tables.get(&query.table).cloned().unwrap_or_default();
        let mut updated_rows = Vec::new();
        let mut next_rows = Vec::with_capacity(existing.len());

        for row in existing {
            if query.matches(&row) {
                let mut updated = row.clone();
                for (k, v) in &patch {
                    updated.insert(k.clone(), v.clone());
                }
                let id = updated.get("id").and_then(Value::as_i64);
                inner.check_unique(&query.table, &updated, id)?;
                updated_rows.push(updated.clone());
                next_rows.push(updated);
            } else {
                next_rows.push(row);
            }
        }

        inner.tables.insert(query.table.clone(), next_rows);
        Ok(updated_rows)
    }

    async fn delete(&self, query: &Query) -> StoreResult<u64> {
        if query.filters.is_empty() {
            return Err(StoreError::UnfilteredWrite(query.table.clone()));
        }

        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(&query.table, StoreOp::Delete) {
            return Err(err);
        }

        let Some(rows) = inner.tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert("cities", row(json!({"name": "A"}))).await.unwrap();
        let b = store.insert("cities", row(json!({"name": "B"}))).await.unwrap();
        assert_eq!(a["id"], 1);
        assert_eq!(b["id"], 2);
    }

    #[tokio::test]
    async fn test_unique_constraint_conflict() {
        let store = InMemoryStore::new().with_unique("cities", &["name", "state_id"]);
        store
            .insert("cities", row(json!({"name": "Campinas", "state_id": 1})))
            .await
            .unwrap();

        let err = store
            .insert("cities", row(json!({"name": "Campinas", "state_id": 1})))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // Same name, other state is fine
        store
            .insert("cities", row(json!({"name": "Campinas", "state_id": 2})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_checks_unique_excluding_self() {
        let store = InMemoryStore::new().with_unique("vehicles", &["plate"]);
        store.insert("vehicles", row(json!({"plate": "AAA1111"}))).await.unwrap();
        store.insert("vehicles", row(json!({"plate": "BBB2222"}))).await.unwrap();

        let same = store
            .update(
                &Query::table("vehicles").eq("id", 1),
                row(json!({"plate": "AAA1111", "model": "X"})),
            )
            .await
            .unwrap();
        assert_eq!(same.len(), 1);

        let err = store
            .update(&Query::table("vehicles").eq("id", 2), row(json!({"plate": "AAA1111"})))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_maybe_single() {
        let store = InMemoryStore::new();
        let q = Query::table("states").eq("abbreviation", "SP");
        assert!(store.maybe_single(&q).await.unwrap().is_none());

        store.insert("states", row(json!({"abbreviation": "SP"}))).await.unwrap();
        assert!(store.maybe_single(&q).await.unwrap().is_some());

        store.insert("states", row(json!({"abbreviation": "SP"}))).await.unwrap();
        assert!(matches!(
            store.maybe_single(&q).await,
            Err(StoreError::MultipleRows(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let store = InMemoryStore::new();
        store.fail_next("drivers", StoreOp::Insert, StoreError::Transport("down".into()));

        assert!(store.insert("drivers", row(json!({"name": "A"}))).await.is_err());
        assert!(store.insert("drivers", row(json!({"name": "A"}))).await.is_ok());
        assert_eq!(store.call_count("drivers", StoreOp::Insert), 2);
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let store = InMemoryStore::new();
        for name in ["Ana", "Bruno", "Ana Paula"] {
            store.insert("drivers", row(json!({"name": name}))).await.unwrap();
        }

        let q = Query::table("drivers").ilike("name", "%ana%");
        assert_eq!(store.count(&q).await.unwrap(), 2);
        assert_eq!(store.delete(&q).await.unwrap(), 2);
        assert_eq!(store.row_count("drivers"), 1);
    }

    #[tokio::test]
    async fn test_unfiltered_writes_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.delete(&Query::table("drivers")).await,
            Err(StoreError::UnfilteredWrite(_))
        ));
        assert!(matches!(
            store.update(&Query::table("drivers"), Row::new()).await,
            Err(StoreError::UnfilteredWrite(_))
        ));
    }
}
