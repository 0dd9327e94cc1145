/// Odometer readings
///
/// ```sql
/// CREATE TABLE odometer_readings (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     vehicle_id BIGINT NOT NULL REFERENCES vehicles(id),
///     kilometers BIGINT NOT NULL CHECK (kilometers >= 0),
///     recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     notes TEXT
/// );
/// ```

use crate::store::{decode, encode, StoreResult, TableStore};
use crate::tenant::TenantContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Odometer reading row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdometerReading {
    pub id: i64,
    pub company_id: i64,
    pub vehicle_id: i64,
    pub kilometers: i64,
    pub recorded_at: DateTime<Utc>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for recording a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOdometerReading {
    pub vehicle_id: i64,
    pub kilometers: i64,
    pub recorded_at: DateTime<Utc>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl OdometerReading {
    pub const TABLE: &'static str = "odometer_readings";

    /// Inserts a reading for the company
    pub async fn create(
        store: &dyn TableStore,
        ctx: &TenantContext,
        data: CreateOdometerReading,
    ) -> StoreResult<Self> {
        let row = store.insert(Self::TABLE, ctx.stamp(encode(&data)?)).await?;
        decode(row)
    }
}
