/// Vehicle form flows
///
/// Plates are normalised before writing (`abc-1d23` -> `ABC1D23`). An
/// assigned driver must belong to the same company.

use super::{clean, RegistrationError, Saved};
use crate::models::driver::Driver;
use crate::models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle};
use crate::store::TableStore;
use crate::tenant::TenantContext;
use crate::validation::{require, validate_plate, ValidationError};
use chrono::{Datelike, Utc};
use tracing::info;

/// Oldest accepted model year
const MIN_YEAR: i32 = 1900;

fn check_year(year: Option<i32>) -> Result<(), ValidationError> {
    let max = Utc::now().year() + 1;
    match year {
        Some(y) if !(MIN_YEAR..=max).contains(&y) => Err(ValidationError::Invalid {
            field: "year",
            message: format!("must be between {} and {}", MIN_YEAR, max),
        }),
        _ => Ok(()),
    }
}

async fn ensure_driver(
    store: &dyn TableStore,
    ctx: &TenantContext,
    driver_id: Option<i64>,
) -> Result<(), RegistrationError> {
    if let Some(id) = driver_id {
        if Driver::find_by_id(store, ctx, id).await?.is_none() {
            return Err(RegistrationError::not_found("driver", id));
        }
    }
    Ok(())
}

/// Creates a vehicle
pub async fn create_vehicle(
    store: &dyn TableStore,
    ctx: &TenantContext,
    mut data: CreateVehicle,
) -> Result<Saved<Vehicle>, RegistrationError> {
    data.plate = validate_plate(&data.plate)?;
    data.model = require("model", &data.model)?;
    data.brand = clean(data.brand);
    data.color = clean(data.color);
    check_year(data.year)?;
    ensure_driver(store, ctx, data.driver_id).await?;

    let plate = data.plate.clone();
    let vehicle = Vehicle::create(store, ctx, data)
        .await
        .map_err(RegistrationError::plate(&plate))?;
    info!(company_id = ctx.company_id, vehicle_id = vehicle.id, plate = %vehicle.plate, "Vehicle created");

    Ok(Saved::new(vehicle))
}

/// Updates a vehicle
pub async fn update_vehicle(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
    mut changes: UpdateVehicle,
) -> Result<Saved<Vehicle>, RegistrationError> {
    if let Some(plate) = &changes.plate {
        changes.plate = Some(validate_plate(plate)?);
    }
    if let Some(model) = &changes.model {
        changes.model = Some(require("model", model)?);
    }
    check_year(changes.year)?;
    ensure_driver(store, ctx, changes.driver_id).await?;

    let plate = changes.plate.clone().unwrap_or_default();
    let vehicle = Vehicle::update(store, ctx, id, changes)
        .await
        .map_err(RegistrationError::plate(&plate))?
        .ok_or_else(|| RegistrationError::not_found("vehicle", id))?;

    Ok(Saved::new(vehicle))
}

/// Loads a vehicle of the company
pub async fn get_vehicle(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
) -> Result<Vehicle, RegistrationError> {
    Vehicle::find_by_id(store, ctx, id)
        .await?
        .ok_or_else(|| RegistrationError::not_found("vehicle", id))
}
