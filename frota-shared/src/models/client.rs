/// Client model and table operations
///
/// Clients are the companies or people a fleet operator serves. The
/// document is a CPF (11 digits) or CNPJ (14 digits) and is unique per
/// company.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE clients (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     name VARCHAR(255) NOT NULL,
///     document VARCHAR(14) NOT NULL,
///     phone VARCHAR(20),
///     email VARCHAR(255),
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT clients_company_document_key UNIQUE (company_id, document)
/// );
/// ```

use super::driver::default_active;
use crate::store::{decode, encode, Row, StoreResult, TableStore};
use crate::tenant::TenantContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Client row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub document: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub document: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Input for updating a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateClient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Client {
    pub const TABLE: &'static str = "clients";

    /// Inserts a client for the company
    pub async fn create(
        store: &dyn TableStore,
        ctx: &TenantContext,
        data: CreateClient,
    ) -> StoreResult<Self> {
        let mut row = ctx.stamp(encode(&data)?);
        row.insert("active".to_string(), Value::Bool(true));
        row.insert("created_at".to_string(), json!(Utc::now()));

        let row = store.insert(Self::TABLE, row).await?;
        decode(row)
    }

    /// Finds a client of the company by id
    pub async fn find_by_id(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
    ) -> StoreResult<Option<Self>> {
        let query = ctx.query(Self::TABLE).eq("id", id);
        store.maybe_single(&query).await?.map(decode).transpose()
    }

    /// Updates a client, `None` if it does not exist for the company
    pub async fn update(
        store: &dyn TableStore,
        ctx: &TenantContext,
        id: i64,
        data: UpdateClient,
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
}
