/// Aggregate driver registration
///
/// An aggregate driver owns the vehicle they drive, so both are registered
/// from one form:
///
/// ```text
/// validate document + plate        (fail fast, no store call)
/// insert driver (aggregate)        conflict -> DuplicateDocument
/// insert vehicle(driver_id)        failure  -> delete driver, then
///                                              DuplicatePlate / Persistence
/// resolve + attach address         failure  -> warning only
/// ```
///
/// Driver and vehicle are kept consistent by compensation, not by a
/// transaction: the vehicle failure path deletes the driver row it just
/// inserted. The address step runs after the pair is committed and never
/// undoes it.

use super::{save_address_best_effort, AddressResult, RegistrationError};
use crate::address::AddressFields;
use crate::models::address::AddressOwner;
use crate::models::driver::{CreateDriver, Driver};
use crate::models::vehicle::{CreateVehicle, Vehicle};
use crate::saga::{CompensationError, Saga};
use crate::store::TableStore;
use crate::tenant::TenantContext;
use crate::validation::{require, validate_document, validate_plate};
use futures::FutureExt;
use serde::Serialize;
use tracing::info;

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationOutcome {
    pub driver: Driver,
    pub vehicle: Vehicle,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<i64>,

    /// Set when the address could not be saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_warning: Option<String>,
}

/// Registers an aggregate driver with their vehicle and address
///
/// # Errors
///
/// - `Validation` before any store call
/// - `DuplicateDocument` / `DuplicatePlate` on unique violations
/// - `Persistence` on any other store failure
///
/// An address failure is not an error: see `RegistrationOutcome::address_warning`.
pub async fn register_aggregate_driver(
    store: &dyn TableStore,
    ctx: &TenantContext,
    mut driver: CreateDriver,
    mut vehicle: CreateVehicle,
    address: &AddressFields,
) -> Result<RegistrationOutcome, RegistrationError> {
    driver.name = require("name", &driver.name)?;
    driver.document = validate_document(&driver.document)?;
    driver.aggregate = true;
    vehicle.plate = validate_plate(&vehicle.plate)?;
    vehicle.model = require("model", &vehicle.model)?;

    let tenant = *ctx;
    let document = driver.document.clone();
    let plate = vehicle.plate.clone();
    let mut saga = Saga::new("register_aggregate_driver");

    let driver = saga
        .step(
            "insert driver",
            async {
                Driver::create(store, &tenant, driver)
                    .await
                    .map_err(RegistrationError::document(&document))
            },
            |d: &Driver| {
                let id = d.id;
                async move {
                    Driver::delete(store, &tenant, id)
                        .await
                        .map(|_| ())
                        .map_err(CompensationError::from)
                }
                .boxed()
            },
        )
        .await?;

    vehicle.driver_id = Some(driver.id);
    let vehicle = saga
        .run("insert vehicle", async {
            Vehicle::create(store, &tenant, vehicle)
                .await
                .map_err(RegistrationError::plate(&plate))
        })
        .await?;

    saga.commit();
    info!(
        company_id = tenant.company_id,
        driver_id = driver.id,
        vehicle_id = vehicle.id,
        "Aggregate driver registered"
    );

    let (address_id, address_warning) =
        match save_address_best_effort(store, &AddressOwner::driver(driver.id), Some(address)).await {
            AddressResult::Skipped => (None, None),
            AddressResult::Saved(id) => (Some(id), None),
            AddressResult::Failed(warning) => (None, Some(warning)),
        };

    Ok(RegistrationOutcome {
        driver,
        vehicle,
        address_id,
        address_warning,
    })
}
