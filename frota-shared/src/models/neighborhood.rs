/// Neighborhood reference rows
///
/// Shared by all companies and deduplicated by `(name, city_id)`.

use crate::store::{decode, encode, Query, StoreResult, TableStore};
use serde::{Deserialize, Serialize};

/// Neighborhood row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub id: i64,
    pub name: String,
    pub city_id: i64,
}

/// Input for creating a neighborhood
#[derive(Debug, Clone, Serialize)]
pub struct CreateNeighborhood {
    pub name: String,
    pub city_id: i64,
}

impl Neighborhood {
    pub const TABLE: &'static str = "neighborhoods";

    /// Finds a neighborhood by its natural key
    pub async fn find(store: &dyn TableStore, name: &str, city_id: i64) -> StoreResult<Option<Self>> {
        let query = Query::table(Self::TABLE)
            .eq("name", name)
            .eq("city_id", city_id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Creates a neighborhood
    pub async fn create(store: &dyn TableStore, data: CreateNeighborhood) -> StoreResult<Self> {
        let row = store.insert(Self::TABLE, encode(&data)?).await?;
        decode(row)
    }
}
