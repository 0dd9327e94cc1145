/// Vehicle inspection checklists
///
/// ```sql
/// CREATE TABLE checklists (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     vehicle_id BIGINT NOT NULL REFERENCES vehicles(id),
///     driver_id BIGINT REFERENCES drivers(id),
///     items JSONB NOT NULL,
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::store::{decode, encode, StoreResult, TableStore};
use crate::tenant::TenantContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inspected item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Item name (e.g. "tires", "brake lights")
    pub item: String,

    /// Passed inspection
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Checklist row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: i64,
    pub company_id: i64,
    pub vehicle_id: i64,

    #[serde(default)]
    pub driver_id: Option<i64>,

    pub items: Vec<ChecklistItem>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChecklist {
    pub vehicle_id: i64,

    #[serde(default)]
    pub driver_id: Option<i64>,

    pub items: Vec<ChecklistItem>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Checklist {
    pub const TABLE: &'static str = "checklists";

    /// True when every item passed
    pub fn all_ok(&self) -> bool {
        self.items.iter().all(|i| i.ok)
    }

    /// Inserts a checklist for the company
    pub async fn create(
        store: &dyn TableStore,
        ctx: &TenantContext,
        data: CreateChecklist,
    ) -> StoreResult<Self> {
        let mut row = ctx.stamp(encode(&data)?);
        row.insert("created_at".to_string(), serde_json::json!(Utc::now()));
        let row = store.insert(Self::TABLE, row).await?;
        decode(row)
    }
}
