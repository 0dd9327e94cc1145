/// Street reference rows
///
/// Shared by all companies and deduplicated by
/// `(name, postal_code, neighborhood_id)`. Address rows of drivers and
/// clients point at a street.

use crate::store::{decode, encode, Query, StoreResult, TableStore};
use serde::{Deserialize, Serialize};

/// Street row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Street {
    pub id: i64,
    pub name: String,

    /// CEP digits, empty when unknown
    #[serde(default)]
    pub postal_code: String,

    pub neighborhood_id: i64,
}

/// Input for creating a street
#[derive(Debug, Clone, Serialize)]
pub struct CreateStreet {
    pub name: String,
    pub postal_code: String,
    pub neighborhood_id: i64,
}

impl Street {
    pub const TABLE: &'static str = "streets";

    /// Finds a street by its natural key
    pub async fn find(
        store: &dyn TableStore,
        name: &str,
        postal_code: &str,
        neighborhood_id: i64,
    ) -> StoreResult<Option<Self>> {
        let query = Query::table(Self::TABLE)
            .eq("name", name)
            .eq("postal_code", postal_code)
            .eq("neighborhood_id", neighborhood_id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Finds a street by id
    pub async fn find_by_id(store: &dyn TableStore, id: i64) -> StoreResult<Option<Self>> {
        let query = Query::table(Self::TABLE).eq("id", id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Creates a street
    pub async fn create(store: &dyn TableStore, data: CreateStreet) -> StoreResult<Self> {
        let row = store.insert(Self::TABLE, encode(&data)?).await?;
        decode(row)
    }
}
