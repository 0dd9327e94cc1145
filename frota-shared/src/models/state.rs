/// State reference data
///
/// States are seeded reference rows. The application only reads them; the
/// address resolver never creates a state.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE states (
///     id BIGSERIAL PRIMARY KEY,
///     abbreviation CHAR(2) NOT NULL UNIQUE,
///     name VARCHAR(100) NOT NULL
/// );
/// ```

use crate::store::{decode, decode_all, Query, StoreResult, TableStore};
use serde::{Deserialize, Serialize};

/// Brazilian federative unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Row id
    pub id: i64,

    /// Two-letter abbreviation (e.g. "SP")
    pub abbreviation: String,

    /// Full name
    #[serde(default)]
    pub name: String,
}

impl State {
    pub const TABLE: &'static str = "states";

    /// Finds a state by its two-letter abbreviation (case-insensitive input)
    pub async fn find_by_abbreviation(
        store: &dyn TableStore,
        abbreviation: &str,
    ) -> StoreResult<Option<Self>> {
        let query = Query::table(Self::TABLE).eq("abbreviation", abbreviation.trim().to_uppercase());
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Finds a state by id
    pub async fn find_by_id(store: &dyn TableStore, id: i64) -> StoreResult<Option<Self>> {
        let query = Query::table(Self::TABLE).eq("id", id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Lists all states ordered by abbreviation
    pub async fn list(store: &dyn TableStore) -> StoreResult<Vec<Self>> {
        let rows = store
            .select(&Query::table(Self::TABLE).order("abbreviation", true))
            .await?;
        decode_all(rows)
    }
}
