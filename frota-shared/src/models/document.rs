/// Uploaded document references
///
/// The file itself lives in object storage; the row keeps its public URL.
///
/// ```sql
/// CREATE TABLE driver_documents (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     driver_id BIGINT NOT NULL REFERENCES drivers(id),
///     kind VARCHAR(50) NOT NULL,
///     url TEXT NOT NULL,
///     content_type VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// -- vehicle_documents: same shape with vehicle_id
/// ```

use crate::store::{decode, Query, Row, StoreResult, TableStore};
use crate::tenant::TenantContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Entity a document is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentOwner {
    Driver,
    Vehicle,
}

impl DocumentOwner {
    pub fn table(&self) -> &'static str {
        match self {
            DocumentOwner::Driver => "driver_documents",
            DocumentOwner::Vehicle => "vehicle_documents",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            DocumentOwner::Driver => "driver_id",
            DocumentOwner::Vehicle => "vehicle_id",
        }
    }

    /// Path segment used in storage keys
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentOwner::Driver => "drivers",
            DocumentOwner::Vehicle => "vehicles",
        }
    }
}

/// Document row (driver or vehicle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub company_id: i64,

    /// Document type, e.g. "cnh", "crlv"
    pub kind: String,

    /// Public URL of the stored file
    pub url: String,

    pub content_type: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Records an uploaded document for a driver or vehicle
    pub async fn create(
        store: &dyn TableStore,
        ctx: &TenantContext,
        owner: DocumentOwner,
        owner_id: i64,
        kind: &str,
        url: &str,
        content_type: &str,
    ) -> StoreResult<Self> {
        let mut row = Row::new();
        row.insert(owner.owner_column().to_string(), Value::from(owner_id));
        row.insert("kind".to_string(), Value::from(kind));
        row.insert("url".to_string(), Value::from(url));
        row.insert("content_type".to_string(), Value::from(content_type));
        row.insert("created_at".to_string(), json!(Utc::now()));

        let row = store.insert(owner.table(), ctx.stamp(row)).await?;
        decode(row)
    }

    /// Deletes the documents of the given owners
    pub async fn delete_for_owners(
        store: &dyn TableStore,
        ctx: &TenantContext,
        owner: DocumentOwner,
        owner_ids: &[i64],
    ) -> StoreResult<u64> {
        let query = ctx.scope(
            Query::table(owner.table()).in_list(owner.owner_column(), owner_ids.iter().copied()),
        );
        store.delete(&query).await
    }
}
