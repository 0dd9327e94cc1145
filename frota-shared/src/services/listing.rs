/// List views: search, pagination, soft and bulk delete
///
/// Lists are tenant scoped, newest first, and hide soft-deleted rows unless
/// asked otherwise. The total comes from a count-only query with the same
/// filters as the page query.
///
/// Bulk delete removes the parent rows first and then tries to remove their
/// dependents (addresses, documents, a driver's vehicles). A dependent
/// failure does not restore the parents; it is logged and returned as a
/// warning.

use super::RegistrationError;
use crate::models::address::{OwnerAddress, OwnerKind};
use crate::models::checklist::Checklist;
use crate::models::client::Client;
use crate::models::document::{Document, DocumentOwner};
use crate::models::driver::Driver;
use crate::models::odometer::OdometerReading;
use crate::models::vehicle::Vehicle;
use crate::store::{decode_all, row_id, Filter, Query, StoreResult, TableStore};
use crate::tenant::TenantContext;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

/// Highest page whose offset still fits a signed 64-bit store column
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PER_PAGE;

/// List request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Case-insensitive substring
    pub search: Option<String>,

    /// 1-based page number
    pub page: u64,

    pub per_page: u64,

    /// Show soft-deleted rows too
    pub include_inactive: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        ListParams {
            search: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            include_inactive: false,
        }
    }
}

impl ListParams {
    /// Page number clamped to `1..=MAX_PAGE`
    pub fn page(&self) -> u64 {
        self.page.clamp(1, MAX_PAGE)
    }

    /// Page size clamped to `1..=MAX_PER_PAGE`
    pub fn per_page(&self) -> u64 {
        match self.per_page {
            0 => DEFAULT_PER_PAGE,
            n => n.min(MAX_PER_PAGE),
        }
    }

    fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// `%term%` pattern with characters meaningful to the filter syntax removed
    fn pattern(&self) -> Option<String> {
        let term: String = self
            .search
            .as_deref()?
            .trim()
            .chars()
            .filter(|c| !matches!(*c, '%' | '*' | ',' | '(' | ')'))
            .collect();
        (!term.is_empty()).then(|| format!("%{}%", term))
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteOutcome {
    /// Parent rows removed
    pub deleted: u64,

    pub warnings: Vec<String>,
}

async fn fetch_page<T: DeserializeOwned>(
    store: &dyn TableStore,
    query: Query,
    params: &ListParams,
) -> Result<Page<T>, RegistrationError> {
    let total = store.count(&query).await?;
    let per_page = params.per_page();

    let rows = store
        .select(&query.order("id", false).range(params.offset(), per_page))
        .await?;

    Ok(Page {
        items: decode_all(rows)?,
        total,
        page: params.page(),
        per_page,
        total_pages: total.div_ceil(per_page),
    })
}

fn active_only(query: Query, params: &ListParams) -> Query {
    if params.include_inactive {
        query
    } else {
        query.eq("active", true)
    }
}

/// Drivers of the company, searched by name or document
pub async fn list_drivers(
    store: &dyn TableStore,
    ctx: &TenantContext,
    params: &ListParams,
) -> Result<Page<Driver>, RegistrationError> {
    let mut query = active_only(ctx.query(Driver::TABLE), params);
    if let Some(pattern) = params.pattern() {
        query = query.or(vec![
            Filter::ILike("name".into(), pattern.clone()),
            Filter::ILike("document".into(), pattern),
        ]);
    }
    fetch_page(store, query, params).await
}

/// Clients of the company, searched by name or document
pub async fn list_clients(
    store: &dyn TableStore,
    ctx: &TenantContext,
    params: &ListParams,
) -> Result<Page<Client>, RegistrationError> {
    let mut query = active_only(ctx.query(Client::TABLE), params);
    if let Some(pattern) = params.pattern() {
        query = query.or(vec![
            Filter::ILike("name".into(), pattern.clone()),
            Filter::ILike("document".into(), pattern),
        ]);
    }
    fetch_page(store, query, params).await
}

/// Vehicles of the company, searched by plate or model
pub async fn list_vehicles(
    store: &dyn TableStore,
    ctx: &TenantContext,
    params: &ListParams,
) -> Result<Page<Vehicle>, RegistrationError> {
    let mut query = active_only(ctx.query(Vehicle::TABLE), params);
    if let Some(pattern) = params.pattern() {
        query = query.or(vec![
            Filter::ILike("plate".into(), pattern.clone()),
            Filter::ILike("model".into(), pattern),
        ]);
    }
    fetch_page(store, query, params).await
}

/// Odometer readings of one vehicle
pub async fn list_odometer_readings(
    store: &dyn TableStore,
    ctx: &TenantContext,
    vehicle_id: i64,
    params: &ListParams,
) -> Result<Page<OdometerReading>, RegistrationError> {
    let query = ctx.query(OdometerReading::TABLE).eq("vehicle_id", vehicle_id);
    fetch_page(store, query, params).await
}

/// Checklists of the company, optionally for one vehicle
pub async fn list_checklists(
    store: &dyn TableStore,
    ctx: &TenantContext,
    vehicle_id: Option<i64>,
    params: &ListParams,
) -> Result<Page<Checklist>, RegistrationError> {
    let mut query = ctx.query(Checklist::TABLE);
    if let Some(id) = vehicle_id {
        query = query.eq("vehicle_id", id);
    }
    fetch_page(store, query, params).await
}

fn deactivated(entity: &'static str, id: i64, updated: bool) -> Result<(), RegistrationError> {
    if updated {
        info!(entity, id, "Deactivated");
        Ok(())
    } else {
        Err(RegistrationError::not_found(entity, id))
    }
}

/// Soft-deletes a driver
pub async fn deactivate_driver(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
) -> Result<(), RegistrationError> {
    let updated = Driver::set_active(store, ctx, id, false).await?;
    deactivated("driver", id, updated)
}

/// Soft-deletes a client
pub async fn deactivate_client(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
) -> Result<(), RegistrationError> {
    let updated = Client::set_active(store, ctx, id, false).await?;
    deactivated("client", id, updated)
}

/// Soft-deletes a vehicle
pub async fn deactivate_vehicle(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
) -> Result<(), RegistrationError> {
    let updated = Vehicle::set_active(store, ctx, id, false).await?;
    deactivated("vehicle", id, updated)
}

/// Deletes the requested rows of `table` that belong to the company,
/// returning the ids actually removed
async fn delete_owned(
    store: &dyn TableStore,
    ctx: &TenantContext,
    table: &str,
    ids: &[i64],
) -> Result<Vec<i64>, RegistrationError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = ctx.query(table).in_list("id", ids.iter().copied());
    let owned = store
        .select(&query)
        .await?
        .iter()
        .map(row_id)
        .collect::<StoreResult<Vec<_>>>()?;
    if owned.is_empty() {
        return Ok(owned);
    }

    store
        .delete(&ctx.query(table).in_list("id", owned.iter().copied()))
        .await?;
    Ok(owned)
}

fn cascade(warnings: &mut Vec<String>, dependent: &str, result: StoreResult<u64>) {
    if let Err(err) = result {
        warn!(dependent, error = %err, "Dependent rows not deleted");
        warnings.push(format!("Could not delete {}: {}", dependent, err));
    }
}

/// Deletes drivers with their addresses, documents and vehicles
pub async fn bulk_delete_drivers(
    store: &dyn TableStore,
    ctx: &TenantContext,
    ids: &[i64],
) -> Result<BulkDeleteOutcome, RegistrationError> {
    let deleted = delete_owned(store, ctx, Driver::TABLE, ids).await?;
    let mut outcome = BulkDeleteOutcome {
        deleted: deleted.len() as u64,
        warnings: Vec::new(),
    };
    if deleted.is_empty() {
        return Ok(outcome);
    }

    cascade(
        &mut outcome.warnings,
        "driver addresses",
        OwnerAddress::delete_for_owners(store, OwnerKind::Driver, &deleted).await,
    );
    cascade(
        &mut outcome.warnings,
        "driver documents",
        Document::delete_for_owners(store, ctx, DocumentOwner::Driver, &deleted).await,
    );
    cascade(
        &mut outcome.warnings,
        "vehicles",
        Vehicle::delete_by_drivers(store, ctx, &deleted).await,
    );

    info!(company_id = ctx.company_id, deleted = outcome.deleted, "Drivers deleted");
    Ok(outcome)
}

/// Deletes clients with their addresses
pub async fn bulk_delete_clients(
    store: &dyn TableStore,
    ctx: &TenantContext,
    ids: &[i64],
) -> Result<BulkDeleteOutcome, RegistrationError> {
    let deleted = delete_owned(store, ctx, Client::TABLE, ids).await?;
    let mut outcome = BulkDeleteOutcome {
        deleted: deleted.len() as u64,
        warnings: Vec::new(),
    };
    if deleted.is_empty() {
        return Ok(outcome);
    }

    cascade(
        &mut outcome.warnings,
        "client addresses",
        OwnerAddress::delete_for_owners(store, OwnerKind::Client, &deleted).await,
    );

    info!(company_id = ctx.company_id, deleted = outcome.deleted, "Clients deleted");
    Ok(outcome)
}

/// Deletes vehicles with their documents, readings and checklists
pub async fn bulk_delete_vehicles(
    store: &dyn TableStore,
    ctx: &TenantContext,
    ids: &[i64],
) -> Result<BulkDeleteOutcome, RegistrationError> {
    let deleted = delete_owned(store, ctx, Vehicle::TABLE, ids).await?;
    let mut outcome = BulkDeleteOutcome {
        deleted: deleted.len() as u64,
        warnings: Vec::new(),
    };
    if deleted.is_empty() {
        return Ok(outcome);
    }

    cascade(
        &mut outcome.warnings,
        "vehicle documents",
        Document::delete_for_owners(store, ctx, DocumentOwner::Vehicle, &deleted).await,
    );
    for table in [OdometerReading::TABLE, Checklist::TABLE] {
        let query = ctx.query(table).in_list("vehicle_id", deleted.iter().copied());
        cascade(&mut outcome.warnings, table, store.delete(&query).await);
    }

    info!(company_id = ctx.company_id, deleted = outcome.deleted, "Vehicles deleted");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::CreateDriver;
    use crate::models::vehicle::CreateVehicle;
    use crate::store::{InMemoryStore, StoreError, StoreOp};

    async fn seed_drivers(store: &InMemoryStore, ctx: &TenantContext, names: &[&str]) -> Vec<i64> {
        let mut ids = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let driver = Driver::create(
                store,
                ctx,
                CreateDriver {
                    name: name.to_string(),
                    document: format!("{:011}", i + 1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            ids.push(driver.id);
        }
        ids
    }

    #[test]
    fn test_params_clamping() {
        let params = ListParams {
            page: 0,
            per_page: 500,
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), MAX_PER_PAGE);
        assert_eq!(params.offset(), 0);

        let search = ListParams {
            search: Some(" 50% ".to_string()),
            ..Default::default()
        };
        assert_eq!(search.pattern().as_deref(), Some("%50%"));
    }

    #[tokio::test]
    async fn test_huge_page_is_empty() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        seed_drivers(&store, &ctx, &["Ana", "Bruno"]).await;

        let params = ListParams {
            page: u64::MAX,
            per_page: 10,
            ..Default::default()
        };
        assert_eq!(params.offset(), (MAX_PAGE - 1) * 10);

        let page = list_drivers(&store, &ctx, &params).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert_eq!(page.page, MAX_PAGE);
    }

    #[tokio::test]
    async fn test_pagination_and_search() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let names = ["Ana", "Bruno", "Carla", "Daniel", "Anderson"];
        seed_drivers(&store, &ctx, &names).await;
        seed_drivers(&store, &TenantContext::new(2), &["Ana Outra"]).await;

        let params = ListParams {
            per_page: 2,
            page: 2,
            ..Default::default()
        };
        let page = list_drivers(&store, &ctx, &params).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.items.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            vec!["Carla", "Bruno"]
        );

        let params = ListParams {
            search: Some("an".to_string()),
            ..Default::default()
        };
        let page = list_drivers(&store, &ctx, &params).await.unwrap();
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|d| d.company_id == 1));
    }

    #[tokio::test]
    async fn test_deactivated_rows_hidden() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let ids = seed_drivers(&store, &ctx, &["Ana", "Bruno"]).await;

        deactivate_driver(&store, &ctx, ids[0]).await.unwrap();

        let page = list_drivers(&store, &ctx, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);

        let all = ListParams {
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(list_drivers(&store, &ctx, &all).await.unwrap().total, 2);

        let err = deactivate_driver(&store, &TenantContext::new(9), ids[1])
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_bulk_delete_cascades_and_ignores_foreign_ids() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let ids = seed_drivers(&store, &ctx, &["Ana", "Bruno"]).await;
        let foreign = seed_drivers(&store, &TenantContext::new(2), &["Zé"]).await;

        Vehicle::create(
            &store,
            &ctx,
            CreateVehicle {
                driver_id: Some(ids[0]),
                plate: "AAA1A11".to_string(),
                model: "Daily".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        OwnerAddress::insert(&store, &crate::models::address::AddressOwner::driver(ids[0]), 1, None, None)
            .await
            .unwrap();

        let outcome = bulk_delete_drivers(&store, &ctx, &[ids[0], foreign[0]])
            .await
            .unwrap();

        assert_eq!(outcome.deleted, 1);
        assert!(outcome.warnings.is_empty());
        assert_eq!(store.row_count("drivers"), 2);
        assert_eq!(store.row_count("vehicles"), 0);
        assert_eq!(store.row_count("driver_addresses"), 0);
    }

    #[tokio::test]
    async fn test_bulk_delete_dependent_failure_is_warning() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let ids = seed_drivers(&store, &ctx, &["Ana"]).await;
        store.fail_next(
            "driver_addresses",
            StoreOp::Delete,
            StoreError::Transport("timeout".into()),
        );

        let outcome = bulk_delete_drivers(&store, &ctx, &ids).await.unwrap();

        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(store.row_count("drivers"), 0);
    }
}
