/// Aggregate driver registration
///
/// An aggregate driver brings their own vehicle. One request creates the
/// driver, the vehicle and the driver's address:
///
/// ```text
/// POST /v1/aggregate-drivers
/// X-Company-Id: 1
///
/// {
///   "driver":  { "name": "Rita Barbosa", "document": "123.456.789-01", "license_category": "E" },
///   "vehicle": { "plate": "ABC1D23", "model": "Atego 2430", "year": 2019 },
///   "address": { "postal_code": "40020-000", "state": "BA", "city": "Salvador", ... }
/// }
/// ```
///
/// If the vehicle cannot be created the driver is removed again. An address
/// failure leaves driver and vehicle in place and is returned as a warning.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{drivers::CreateDriverRequest, vehicles::CreateVehicleRequest},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use frota_shared::address::AddressFields;
use frota_shared::models::driver::CreateDriver;
use frota_shared::models::vehicle::CreateVehicle;
use frota_shared::services::registration::{register_aggregate_driver, RegistrationOutcome};
use frota_shared::tenant::TenantContext;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AggregateDriverRequest {
    #[validate(nested)]
    pub driver: CreateDriverRequest,

    #[validate(nested)]
    pub vehicle: CreateVehicleRequest,

    #[serde(default)]
    pub address: AddressFields,
}

pub async fn register(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<AggregateDriverRequest>,
) -> ApiResult<(StatusCode, Json<RegistrationOutcome>)> {
    req.validate()?;

    let AggregateDriverRequest {
        driver,
        vehicle,
        address,
    } = req;

    // The top-level address wins over one nested in the driver block
    let address = match driver.address {
        Some(nested) if address == AddressFields::default() => nested,
        _ => address,
    };

    let driver = CreateDriver {
        name: driver.name,
        document: driver.document,
        phone: driver.phone,
        email: driver.email,
        license_number: driver.license_number,
        license_category: driver.license_category,
        license_expires_at: driver.license_expires_at,
        aggregate: true,
    };
    let vehicle = CreateVehicle {
        driver_id: None,
        plate: vehicle.plate,
        model: vehicle.model,
        brand: vehicle.brand,
        year: vehicle.year,
        color: vehicle.color,
    };

    let outcome = register_aggregate_driver(state.store.as_ref(), &ctx, driver, vehicle, &address).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
