/// Driver endpoints
///
/// # Endpoints
///
/// - `GET /v1/drivers` - List drivers (`?search=&page=&per_page=&include_inactive=`)
/// - `POST /v1/drivers` - Create driver, optionally with an address
/// - `GET /v1/drivers/:id` - Driver detail
/// - `PUT /v1/drivers/:id` - Update driver and its address
/// - `DELETE /v1/drivers/:id` - Soft delete (sets `active = false`)
/// - `POST /v1/drivers/bulk-delete` - Hard delete with best-effort cascade
/// - `POST /v1/drivers/:id/documents/:kind` - Upload a document (raw body)

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
use chrono::NaiveDate;
use frota_shared::address::AddressFields;
use frota_shared::models::document::Document;
use frota_shared::models::driver::{CreateDriver, Driver, UpdateDriver};
use frota_shared::services::documents::upload_driver_document;
use frota_shared::services::drivers::{create_driver, get_driver, update_driver};
use frota_shared::services::listing::{
    bulk_delete_drivers, deactivate_driver, list_drivers, BulkDeleteOutcome, ListParams, Page,
};
use frota_shared::services::Saved;
use frota_shared::tenant::TenantContext;
use serde::Deserialize;
use validator::Validate;

/// Create driver request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// CPF, masked or digits only
    pub document: String,

    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub license_number: Option<String>,

    pub license_category: Option<String>,

    pub license_expires_at: Option<NaiveDate>,

    /// Address block of the form; omitted or all blank means no address
    pub address: Option<AddressFields>,
}

/// Update driver request
///
/// Absent fields keep their value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub document: Option<String>,

    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub license_number: Option<String>,

    pub license_category: Option<String>,

    pub license_expires_at: Option<NaiveDate>,

    pub address: Option<AddressFields>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Driver>>> {
    Ok(Json(list_drivers(state.store.as_ref(), &ctx, &params).await?))
}

/// Creates a driver
///
/// # Errors
///
/// - `422`: invalid name, email or document
/// - `409`: document already registered for the company
///
/// Address failures do not fail the request; they come back in `warnings`.
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<CreateDriverRequest>,
) -> ApiResult<(StatusCode, Json<Saved<Driver>>)> {
    req.validate()?;

    let data = CreateDriver {
        name: req.name,
        document: req.document,
        phone: req.phone,
        email: req.email,
        license_number: req.license_number,
        license_category: req.license_category,
        license_expires_at: req.license_expires_at,
        aggregate: false,
    };
    let saved = create_driver(state.store.as_ref(), &ctx, data, req.address.as_ref()).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Driver>> {
    Ok(Json(get_driver(state.store.as_ref(), &ctx, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateDriverRequest>,
) -> ApiResult<Json<Saved<Driver>>> {
    req.validate()?;

    let changes = UpdateDriver {
        name: req.name,
        document: req.document,
        phone: req.phone,
        email: req.email,
        license_number: req.license_number,
        license_category: req.license_category,
        license_expires_at: req.license_expires_at,
    };
    let saved = update_driver(state.store.as_ref(), &ctx, id, changes, req.address.as_ref()).await?;

    Ok(Json(saved))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deactivate_driver(state.store.as_ref(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes drivers with their addresses, documents and vehicles
pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteOutcome>> {
    req.validate()?;
    Ok(Json(bulk_delete_drivers(state.store.as_ref(), &ctx, &req.ids).await?))
}

/// Stores the request body as a driver document of type `kind`
///
/// The `Content-Type` header must be `image/jpeg`, `image/png` or
/// `application/pdf`; the body is at most 15 MB.
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path((id, kind)): Path<(i64, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let document = upload_driver_document(
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
