/// Vehicle model and table operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE vehicles (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     driver_id BIGINT REFERENCES drivers(id),
///     plate VARCHAR(7) NOT NULL,
///     model VARCHAR(100) NOT NULL,
///     brand VARCHAR(100),
///     year INTEGER,
///     color VARCHAR(50),
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT vehicles_company_plate_key UNIQUE (company_id, plate)
/// );
/// ```

use super::driver::default_active;
use crate::store::{decode, encode, Row, StoreResult, TableStore};
use crate::tenant::TenantContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Vehicle row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub company_id: i64,

    /// Assigned driver (always set for aggregate vehicles)
    #[serde(default)]
    pub driver_id: Option<i64>,

    /// Normalised plate (natural key within the company)
    pub plate: String,

    pub model: String,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVehicle {
    #[serde(default)]
    pub driver_id: Option<i64>,

    pub plate: String,
    pub model: String,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub color: Option<String>,
}

/// Input for updating a vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateVehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Vehicle {
    pub const TABLE: &'static str = "vehicles";

    /// Inserts a vehicle for the company
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` when the plate is already registered.
    pub async fn create(
        store: &dyn TableStore,
        ctx: &TenantContext,
        data: CreateVehicle,
    ) -> StoreResult<Self> {
        let mut row = ctx.stamp(encode(&data)?);
        row.insert("active".to_string(), Value::Bool(true));
        row.insert("created_at".to_string(), json!(Utc::now()));

        let row = store.insert(Self::TABLE, row).await?;
        decode(row)
    }

    /// Finds a vehicle of the company by id
    pub async fn find_by_id(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
    ) -> StoreResult<Option<Self>> {
        let query = ctx.query(Self::TABLE).eq("id", id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Updates a vehicle, `None` if it does not exist for the company
    pub async fn update(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
        data: UpdateVehicle,
    ) -> StoreResult<Option<Self>> {
        let patch = encode(&data)?;
        if patch.is_empty() {
            return Self::find_by_id(store, ctx, id).await;
        }

        let query = ctx.query(Self::TABLE).eq("id", id);
        let rows = store.update(&query, patch).await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Sets the soft-delete flag
    pub async fn set_active(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
        active: bool,
    ) -> StoreResult<bool> {
        let query = ctx.query(Self::TABLE).eq("id", id);
        let mut patch = Row::new();
        patch.insert("active".to_string(), Value::Bool(active));
        Ok(!store.update(&query, patch).await?.is_empty())
    }

    /// Deletes every vehicle assigned to `driver_ids`
    pub async fn delete_by_drivers(
        store: &dyn TableStore,
        ctx: &TenantContext,
        driver_ids: &[i64],
    ) -> StoreResult<u64> {
        let query = ctx
            .query(Self::TABLE)
            .in_list("driver_id", driver_ids.iter().copied());
        store.delete(&query).await
    }
}
