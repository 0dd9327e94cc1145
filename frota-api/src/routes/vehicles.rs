/// Vehicle endpoints
///
/// - `GET /v1/vehicles` (search on plate or model), `POST /v1/vehicles`
/// - `GET|PUT|DELETE /v1/vehicles/:id`
/// - `POST /v1/vehicles/bulk-delete`
/// - `POST /v1/vehicles/:id/documents/:kind`

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{upload_from, BulkDeleteRequest},
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use bytes::Bytes;
use frota_shared::models::document::Document;
use frota_shared::models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle};
use frota_shared::services::documents::upload_vehicle_document;
use frota_shared::services::listing::{
    bulk_delete_vehicles, deactivate_vehicle, list_vehicles, BulkDeleteOutcome, ListParams, Page,
};
use frota_shared::services::vehicles::{create_vehicle, get_vehicle, update_vehicle};
use frota_shared::services::Saved;
use frota_shared::tenant::TenantContext;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    /// Old (`ABC1234`) or Mercosul (`ABC1D23`) plate, any case, dashes allowed
    pub plate: String,

    #[validate(length(min = 1, max = 100, message = "Model must be 1-100 characters"))]
    pub model: String,

    pub brand: Option<String>,

    pub year: Option<i32>,

    pub color: Option<String>,

    /// Assigned driver, must belong to the company
    pub driver_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateVehicleRequest {
    pub plate: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Model must be 1-100 characters"))]
    pub model: Option<String>,

    pub brand: Option<String>,

    pub year: Option<i32>,

    pub color: Option<String>,

    pub driver_id: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Vehicle>>> {
    Ok(Json(list_vehicles(state.store.as_ref(), &ctx, &params).await?))
}

/// Creates a vehicle
///
/// # Errors
///
/// - `422`: invalid plate, blank model, year out of range
/// - `409`: plate already registered for the company
/// - `404`: `driver_id` is not a driver of the company
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<CreateVehicleRequest>,
) -> ApiResult<(StatusCode, Json<Saved<Vehicle>>)> {
    req.validate()?;

    let data = CreateVehicle {
        driver_id: req.driver_id,
        plate: req.plate,
        model: req.model,
        brand: req.brand,
        year: req.year,
        color: req.color,
    };
    let saved = create_vehicle(state.store.as_ref(), &ctx, data).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vehicle>> {
    Ok(Json(get_vehicle(state.store.as_ref(), &ctx, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateVehicleRequest>,
) -> ApiResult<Json<Saved<Vehicle>>> {
    req.validate()?;

    let changes = UpdateVehicle {
        driver_id: req.driver_id,
        plate: req.plate,
        model: req.model,
        brand: req.brand,
        year: req.year,
        color: req.color,
    };

    Ok(Json(update_vehicle(state.store.as_ref(), &ctx, id, changes).await?))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deactivate_vehicle(state.store.as_ref(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes vehicles with their documents, odometer readings and checklists
pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteOutcome>> {
    req.validate()?;
    Ok(Json(bulk_delete_vehicles(state.store.as_ref(), &ctx, &req.ids).await?))
}

pub async fn upload_document(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path((id, kind)): Path<(i64, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let document = upload_vehicle_document(
        state.store.as_ref(),
        state.storage.as_ref(),
        state.bucket(),
        &ctx,
        id,
        upload_from(kind, &headers, body),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(document)))
}
