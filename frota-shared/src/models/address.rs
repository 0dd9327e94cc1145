/// Owner address rows
///
/// Drivers and clients each have an address table pointing at a shared
/// street row:
///
/// ```sql
/// CREATE TABLE driver_addresses (
///     id BIGSERIAL PRIMARY KEY,
///     driver_id BIGINT NOT NULL REFERENCES drivers(id),
///     street_id BIGINT NOT NULL REFERENCES streets(id),
///     house_number VARCHAR(20),
///     complement VARCHAR(255),
///     active BOOLEAN NOT NULL DEFAULT TRUE
/// );
///
/// CREATE TABLE client_addresses (
///     id BIGSERIAL PRIMARY KEY,
///     client_id BIGINT NOT NULL REFERENCES clients(id),
///     street_id BIGINT NOT NULL REFERENCES streets(id),
///     house_number VARCHAR(20),
///     complement VARCHAR(255)
/// );
/// ```
///
/// Driver addresses are soft-activated: at most one is active per driver.
/// Client addresses carry no flag.

use crate::store::{decode, Query, Row, StoreResult, TableStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of entity owning an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Driver,
    Client,
}

impl OwnerKind {
    /// Address table of this owner kind
    pub fn table(&self) -> &'static str {
        match self {
            OwnerKind::Driver => "driver_addresses",
            OwnerKind::Client => "client_addresses",
        }
    }

    /// Column referencing the owner
    pub fn owner_column(&self) -> &'static str {
        match self {
            OwnerKind::Driver => "driver_id",
            OwnerKind::Client => "client_id",
        }
    }

    /// Whether address rows carry an `active` flag
    pub fn tracks_active(&self) -> bool {
        matches!(self, OwnerKind::Driver)
    }
}

/// Entity an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOwner {
    pub kind: OwnerKind,
    pub id: i64,
}

impl AddressOwner {
    pub fn driver(id: i64) -> Self {
        AddressOwner {
            kind: OwnerKind::Driver,
            id,
        }
    }

    pub fn client(id: i64) -> Self {
        AddressOwner {
            kind: OwnerKind::Client,
            id,
        }
    }

    fn query(&self) -> Query {
        Query::table(self.kind.table()).eq(self.kind.owner_column(), self.id)
    }
}

/// Address row of a driver or client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerAddress {
    pub id: i64,
    pub street_id: i64,

    #[serde(default)]
    pub house_number: Option<String>,

    #[serde(default)]
    pub complement: Option<String>,

    /// Present on driver addresses only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

fn address_row(
    owner: Option<&AddressOwner>,
    kind: OwnerKind,
    street_id: i64,
    house_number: Option<&str>,
    complement: Option<&str>,
) -> Row {
    let mut row = Row::new();
    if let Some(owner) = owner {
        row.insert(owner.kind.owner_column().to_string(), Value::from(owner.id));
    }
    row.insert("street_id".to_string(), Value::from(street_id));
    row.insert(
        "house_number".to_string(),
        house_number.map(Value::from).unwrap_or(Value::Null),
    );
    row.insert(
        "complement".to_string(),
        complement.map(Value::from).unwrap_or(Value::Null),
    );
    if kind.tracks_active() {
        row.insert("active".to_string(), Value::Bool(true));
    }
    row
}

impl OwnerAddress {
    /// Returns the owner's current address
    ///
    /// For drivers this is the most recent active row; for clients the most
    /// recent row.
    pub async fn current(store: &dyn TableStore, owner: &AddressOwner) -> StoreResult<Option<Self>> {
        let mut query = owner.query();
        if owner.kind.tracks_active() {
            query = query.eq("active", true);
        }
        let rows = store.select(&query.order("id", false).limit(1)).await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Inserts a new address row bound to the owner
    pub async fn insert(
        store: &dyn TableStore,
        owner: &AddressOwner,
        street_id: i64,
        house_number: Option<&str>,
        complement: Option<&str>,
    ) -> StoreResult<Self> {
        let row = address_row(Some(owner), owner.kind, street_id, house_number, complement);
        let row = store.insert(owner.kind.table(), row).await?;
        decode(row)
    }

    /// Rewrites an existing address row in place
    ///
    /// The row keeps its id; driver rows are re-marked active.
    pub async fn update(
        store: &dyn TableStore,
        owner: &AddressOwner,
        id: i64,
        street_id: i64,
        house_number: Option<&str>,
        complement: Option<&str>,
    ) -> StoreResult<Option<Self>> {
        let patch = address_row(None, owner.kind, street_id, house_number, complement);
        let rows = store.update(&owner.query().eq("id", id), patch).await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Deletes every address row of the given owners
    pub async fn delete_for_owners(
        store: &dyn TableStore,
        kind: OwnerKind,
        owner_ids: &[i64],
    ) -> StoreResult<u64> {
        let query = Query::table(kind.table()).in_list(kind.owner_column(), owner_ids.iter().copied());
        store.delete(&query).await
    }
}
