/// Driver model and table operations
///
/// Drivers ("motoristas") belong to a company. Aggregate drivers own the
/// vehicle they drive and are registered together with it (see
/// `services::registration`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE drivers (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     name VARCHAR(255) NOT NULL,
///     document CHAR(11) NOT NULL,
///     phone VARCHAR(20),
///     email VARCHAR(255),
///     license_number VARCHAR(20),
///     license_category VARCHAR(5),
///     license_expires_at DATE,
///     aggregate BOOLEAN NOT NULL DEFAULT FALSE,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT drivers_company_document_key UNIQUE (company_id, document)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use frota_shared::models::driver::{CreateDriver, Driver};
/// use frota_shared::store::InMemoryStore;
/// use frota_shared::tenant::TenantContext;
///
/// # async fn example() -> Result<(), frota_shared::store::StoreError> {
/// let store = InMemoryStore::with_default_schema();
/// let ctx = TenantContext::new(1);
///
/// let driver = Driver::create(&store, &ctx, CreateDriver {
///     name: "Maria Souza".to_string(),
///     document: "12345678901".to_string(),
///     ..Default::default()
/// }).await?;
/// println!("Created driver {}", driver.id);
/// # Ok(())
/// # }
/// ```

use crate::store::{decode, encode, StoreResult, TableStore};
use crate::tenant::TenantContext;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Driver row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Row id
    pub id: i64,

    /// Owning company
    pub company_id: i64,

    /// Full name
    pub name: String,

    /// CPF digits (natural key within the company)
    pub document: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Driving license (CNH) number
    #[serde(default)]
    pub license_number: Option<String>,

    /// Driving license category (A, B, C, D, E, AB...)
    #[serde(default)]
    pub license_category: Option<String>,

    #[serde(default)]
    pub license_expires_at: Option<NaiveDate>,

    /// Owns the vehicle they drive
    #[serde(default)]
    pub aggregate: bool,

    /// Soft-delete flag
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub(crate) fn default_active() -> bool {
    true
}

/// Input for creating a driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateDriver {
    pub name: String,
    pub document: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub license_number: Option<String>,

    #[serde(default)]
    pub license_category: Option<String>,

    #[serde(default)]
    pub license_expires_at: Option<NaiveDate>,

    #[serde(default)]
    pub aggregate: bool,
}

/// Input for updating a driver
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDriver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_expires_at: Option<NaiveDate>,
}

impl Driver {
    pub const TABLE: &'static str = "drivers";

    /// Inserts a driver for the company
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` when the document is already registered for
    /// the company.
    pub async fn create(
        store: &dyn TableStore,
        ctx: &TenantContext,
        data: CreateDriver,
    ) -> StoreResult<Self> {
        let mut row = ctx.stamp(encode(&data)?);
        row.insert("active".to_string(), Value::Bool(true));
        row.insert("created_at".to_string(), json!(Utc::now()));

        let row = store.insert(Self::TABLE, row).await?;
        decode(row)
    }

    /// Finds a driver of the company by id
    pub async fn find_by_id(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
    ) -> StoreResult<Option<Self>> {
        let query = ctx.query(Self::TABLE).eq("id", id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Updates a driver
    ///
    /// Returns `None` when the driver does not exist for the company.
    pub async fn update(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
        data: UpdateDriver,
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
    ///
    /// Returns true if a row was updated.
    pub async fn set_active(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
        active: bool,
    ) -> StoreResult<bool> {
        let query = ctx.query(Self::TABLE).eq("id", id);
        let mut patch = crate::store::Row::new();
        patch.insert("active".to_string(), Value::Bool(active));
        Ok(!store.update(&query, patch).await?.is_empty())
    }

    /// Deletes a driver row
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(store: &dyn TableStore, ctx: &TenantContext, id: i64) -> StoreResult<bool> {
        let query = ctx.query(Self::TABLE).eq("id", id);
        Ok(store.delete(&query).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn maria() -> CreateDriver {
        CreateDriver {
            name: "Maria Souza".to_string(),
            document: "12345678901".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_stamps_company_and_active() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(4);

        let driver = Driver::create(&store, &ctx, maria()).await.unwrap();
        assert_eq!(driver.company_id, 4);
        assert!(driver.active);
        assert!(driver.created_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_document_conflicts_within_company_only() {
        let store = InMemoryStore::with_default_schema();

        Driver::create(&store, &TenantContext::new(1), maria()).await.unwrap();
        let err = Driver::create(&store, &TenantContext::new(1), maria())
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        Driver::create(&store, &TenantContext::new(2), maria()).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_is_tenant_scoped() {
        let store = InMemoryStore::with_default_schema();
        let driver = Driver::create(&store, &TenantContext::new(1), maria()).await.unwrap();

        assert!(Driver::find_by_id(&store, &TenantContext::new(1), driver.id)
            .await
            .unwrap()
            .is_some());
        assert!(Driver::find_by_id(&store, &TenantContext::new(2), driver.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_and_set_active() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let driver = Driver::create(&store, &ctx, maria()).await.unwrap();

        let updated = Driver::update(
            &store,
            &ctx,
            driver.id,
            UpdateDriver {
                phone: Some("11999990000".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("11999990000"));
        assert_eq!(updated.name, "Maria Souza");

        assert!(Driver::set_active(&store, &ctx, driver.id, false).await.unwrap());
        let reloaded = Driver::find_by_id(&store, &ctx, driver.id).await.unwrap().unwrap();
        assert!(!reloaded.active);

        assert!(Driver::update(&store, &ctx, 999, UpdateDriver::default())
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_driver_serializes_only_set_fields() {
        let update = UpdateDriver {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        let row = encode(&update).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["name"], "Ana");
    }
}
