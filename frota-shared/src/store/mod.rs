/// Table store abstraction
///
/// Every persistence operation in Frota is a direct call to a remote,
/// table-oriented CRUD API. This module defines the `TableStore` contract
/// and its two implementations:
///
/// - `rest`: the hosted REST backend (reqwest)
/// - `memory`: an in-process store with unique constraints and failure
///   injection, used in tests and local development
///
/// Rows travel as JSON objects; models convert with [`decode`] and [`encode`].
///
/// # Example
///
/// ```no_run
/// use frota_shared::store::{Query, TableStore, rest::{RestStore, StoreConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RestStore::new(StoreConfig::from_env()?)?;
/// let rows = store.select(&Query::table("states").order("abbreviation", true)).await?;
/// println!("{} states", rows.len());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod query;
pub mod rest;

pub use memory::{InMemoryStore, StoreOp};
pub use query::{Filter, Query};
pub use rest::{RestStore, StoreConfig};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// A table row as returned by the store
pub type Row = Map<String, Value>;

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Table store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violation
    #[error("Unique constraint violated on {table}: {message}")]
    Conflict { table: String, message: String },

    /// Expected row does not exist
    #[error("Row not found in {0}")]
    NotFound(String),

    /// A single-row query matched several rows
    #[error("Query on {0} returned more than one row")]
    MultipleRows(String),

    /// Update or delete without any filter
    #[error("Refusing unfiltered write on {0}")]
    UnfilteredWrite(String),

    /// Network-level failure
    #[error("Store transport error: {0}")]
    Transport(String),

    /// Non-success response from the store
    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Row could not be converted to or from a model
    #[error("Failed to decode row: {0}")]
    Decode(String),

    /// Invalid store configuration
    #[error("Store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// True when the error is a unique constraint violation
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// Table-oriented CRUD contract of the record store
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Returns all rows matching the query
    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>>;

    /// Returns at most one row
    ///
    /// "No rows" is `Ok(None)`, not an error. More than one match is
    /// `StoreError::MultipleRows`.
    async fn maybe_single(&self, query: &Query) -> StoreResult<Option<Row>> {
        let mut rows = self.select(&query.clone().limit(2)).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(StoreError::MultipleRows(query.table.clone())),
        }
    }

    /// Counts rows matching the query filters
    async fn count(&self, query: &Query) -> StoreResult<u64>;

    /// Inserts a row and returns it as stored (with its `id`)
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Applies `patch` to all matching rows and returns them
    async fn update(&self, query: &Query, patch: Row) -> StoreResult<Vec<Row>>;

    /// Deletes matching rows and returns how many were removed
    async fn delete(&self, query: &Query) -> StoreResult<u64>;

    /// Checks that the store is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Converts a row into a model
pub fn decode<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Converts a list of rows into models
pub fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

/// Converts a model or input struct into a row
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

/// Reads the numeric `id` column of a row
pub fn row_id(row: &Row) -> StoreResult<i64> {
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::Decode("row has no numeric id".to_string()))
}
