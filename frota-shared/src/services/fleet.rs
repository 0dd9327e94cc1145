/// Vehicle operation records: odometer readings and checklists

use super::{clean, RegistrationError};
use crate::models::checklist::{Checklist, ChecklistItem, CreateChecklist};
use crate::models::driver::Driver;
use crate::models::odometer::{CreateOdometerReading, OdometerReading};
use crate::models::vehicle::Vehicle;
use crate::store::TableStore;
use crate::tenant::TenantContext;
use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use tracing::info;

async fn ensure_vehicle(
    store: &dyn TableStore,
    ctx: &TenantContext,
    vehicle_id: i64,
) -> Result<Vehicle, RegistrationError> {
    Vehicle::find_by_id(store, ctx, vehicle_id)
        .await?
        .ok_or_else(|| RegistrationError::not_found("vehicle", vehicle_id))
}

/// Records an odometer reading for a vehicle of the company
///
/// `recorded_at` defaults to now.
pub async fn record_odometer(
    store: &dyn TableStore,
    ctx: &TenantContext,
    vehicle_id: i64,
    kilometers: i64,
    recorded_at: Option<DateTime<Utc>>,
    notes: Option<String>,
) -> Result<OdometerReading, RegistrationError> {
    if kilometers < 0 {
        return Err(ValidationError::Invalid {
            field: "kilometers",
            message: "must not be negative".to_string(),
        }
        .into());
    }
    ensure_vehicle(store, ctx, vehicle_id).await?;

    let reading = OdometerReading::create(
        store,
        ctx,
        CreateOdometerReading {
            vehicle_id,
            kilometers,
            recorded_at: recorded_at.unwrap_or_else(Utc::now),
            notes: clean(notes),
        },
    )
    .await?;

    info!(vehicle_id, kilometers, "Odometer reading recorded");
    Ok(reading)
}

/// Stores an inspection checklist
///
/// Needs at least one item; vehicle and driver must belong to the company.
pub async fn create_checklist(
    store: &dyn TableStore,
    ctx: &TenantContext,
    vehicle_id: i64,
    driver_id: Option<i64>,
    items: Vec<ChecklistItem>,
    notes: Option<String>,
) -> Result<Checklist, RegistrationError> {
    if items.is_empty() {
        return Err(ValidationError::Required { field: "items" }.into());
    }
    if let Some(blank) = items.iter().position(|i| i.item.trim().is_empty()) {
        return Err(ValidationError::Invalid {
            field: "items",
            message: format!("item {} has no name", blank + 1),
        }
        .into());
    }

    ensure_vehicle(store, ctx, vehicle_id).await?;
    if let Some(id) = driver_id {
        if Driver::find_by_id(store, ctx, id).await?.is_none() {
            return Err(RegistrationError::not_found("driver", id));
        }
    }

    let checklist = Checklist::create(
        store,
        ctx,
        CreateChecklist {
            vehicle_id,
            driver_id,
            items,
            notes: clean(notes),
        },
    )
    .await?;

    info!(
        vehicle_id,
        checklist_id = checklist.id,
        all_ok = checklist.all_ok(),
        "Checklist created"
    );
    Ok(checklist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::CreateVehicle;
    use crate::store::InMemoryStore;

    async fn with_vehicle(store: &InMemoryStore, ctx: &TenantContext) -> Vehicle {
        Vehicle::create(
            store,
            ctx,
            CreateVehicle {
                plate: "ABC1234".to_string(),
                model: "Strada".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_negative_kilometers_rejected() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let vehicle = with_vehicle(&store, &ctx).await;

        let err = record_odometer(&store, &ctx, vehicle.id, -1, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
        assert_eq!(store.row_count("odometer_readings"), 0);
    }

    #[tokio::test]
    async fn test_reading_for_other_company_vehicle() {
        let store = InMemoryStore::with_default_schema();
        let vehicle = with_vehicle(&store, &TenantContext::new(1)).await;

        let err = record_odometer(&store, &TenantContext::new(2), vehicle.id, 1000, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NotFound { entity: "vehicle", .. }));
    }

    #[tokio::test]
    async fn test_checklist_created() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        let vehicle = with_vehicle(&store, &ctx).await;

        let items = vec![
            ChecklistItem {
                item: "Pneus".to_string(),
                ok: true,
                note: None,
            },
            ChecklistItem {
                item: "Faróis".to_string(),
                ok: false,
                note: Some("Farol esquerdo queimado".to_string()),
            },
        ];
        let checklist = create_checklist(&store, &ctx, vehicle.id, None, items, Some(" ".into()))
            .await
            .unwrap();

        assert_eq!(checklist.items.len(), 2);
        assert!(!checklist.all_ok());
        assert_eq!(checklist.notes, None);
        assert_eq!(checklist.company_id, 1);
    }

    #[tokio::test]
    async fn test_empty_checklist_rejected() {
        let store = InMemoryStore::with_default_schema();
        let err = create_checklist(&store, &TenantContext::new(1), 1, None, vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation(ValidationError::Required { field: "items" })
        ));
    }
}
