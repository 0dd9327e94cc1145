/// City reference rows
///
/// Shared by all companies and deduplicated by `(name, state_id)`.

use crate::store::{decode, encode, Query, StoreResult, TableStore};
use serde::{Deserialize, Serialize};

/// City row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub state_id: i64,
}

/// Input for creating a city
#[derive(Debug, Clone, Serialize)]
pub struct CreateCity {
    pub name: String,
    pub state_id: i64,
}

impl City {
    pub const TABLE: &'static str = "cities";

    /// Finds a city by its natural key
    pub async fn find(store: &dyn TableStore, name: &str, state_id: i64) -> StoreResult<Option<Self>> {
        let query = Query::table(Self::TABLE)
            .eq("name", name)
            .eq("state_id", state_id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Creates a city
    pub async fn create(store: &dyn TableStore, data: CreateCity) -> StoreResult<Self> {
        let row = store.insert(Self::TABLE, encode(&data)?).await?;
        decode(row)
    }
}
