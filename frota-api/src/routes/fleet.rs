/// Odometer readings and inspection checklists
///
/// - `GET|POST /v1/vehicles/:id/odometer-readings`
/// - `GET /v1/checklists?vehicle_id=`, `POST /v1/checklists`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use frota_shared::models::checklist::{Checklist, ChecklistItem};
use frota_shared::models::odometer::OdometerReading;
use frota_shared::services::fleet;
use frota_shared::services::listing::{
    list_checklists as list_vehicle_checklists, list_odometer_readings, ListParams, Page,
};
use frota_shared::tenant::TenantContext;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct OdometerRequest {
    #[validate(range(min = 0, message = "Kilometers must not be negative"))]
    pub kilometers: i64,

    /// Defaults to now
    pub recorded_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChecklistRequest {
    pub vehicle_id: i64,

    pub driver_id: Option<i64>,

    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<ChecklistItem>,

    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChecklistFilter {
    pub vehicle_id: Option<i64>,
}

pub async fn list_odometer(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(vehicle_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<OdometerReading>>> {
    let page = list_odometer_readings(state.store.as_ref(), &ctx, vehicle_id, &params).await?;
    Ok(Json(page))
}

pub async fn record_odometer(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(vehicle_id): Path<i64>,
    Json(req): Json<OdometerRequest>,
) -> ApiResult<(StatusCode, Json<OdometerReading>)> {
    req.validate()?;

    let reading = fleet::record_odometer(
        state.store.as_ref(),
        &ctx,
        vehicle_id,
        req.kilometers,
        req.recorded_at,
        req.notes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(reading)))
}

pub async fn list_checklists(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(filter): Query<ChecklistFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Checklist>>> {
    let page = list_vehicle_checklists(state.store.as_ref(), &ctx, filter.vehicle_id, &params).await?;
    Ok(Json(page))
}

pub async fn create_checklist(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<ChecklistRequest>,
) -> ApiResult<(StatusCode, Json<Checklist>)> {
    req.validate()?;

    let checklist = fleet::create_checklist(
        state.store.as_ref(),
        &ctx,
        req.vehicle_id,
        req.driver_id,
        req.items,
        req.notes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(checklist)))
}
