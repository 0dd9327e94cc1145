/// Client endpoints
///
/// - `GET /v1/clients`, `POST /v1/clients`
/// - `GET|PUT|DELETE /v1/clients/:id`
/// - `POST /v1/clients/bulk-delete`
///
/// Clients take a CPF (11 digits) or CNPJ (14 digits) as document.

use crate::{app::AppState, error::ApiResult, routes::BulkDeleteRequest};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use frota_shared::address::AddressFields;
use frota_shared::models::client::{Client, CreateClient, UpdateClient};
use frota_shared::services::clients::{create_client, get_client, update_client};
use frota_shared::services::listing::{
    bulk_delete_clients, deactivate_client, list_clients, BulkDeleteOutcome, ListParams, Page,
};
use frota_shared::services::Saved;
use frota_shared::tenant::TenantContext;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub document: String,

    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub address: Option<AddressFields>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub document: Option<String>,

    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub address: Option<AddressFields>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Client>>> {
    Ok(Json(list_clients(state.store.as_ref(), &ctx, &params).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<Saved<Client>>)> {
    req.validate()?;

    let data = CreateClient {
        name: req.name,
        document: req.document,
        phone: req.phone,
        email: req.email,
    };
    let saved = create_client(state.store.as_ref(), &ctx, data, req.address.as_ref()).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Client>> {
    Ok(Json(get_client(state.store.as_ref(), &ctx, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateClientRequest>,
) -> ApiResult<Json<Saved<Client>>> {
    req.validate()?;

    let changes = UpdateClient {
        name: req.name,
        document: req.document,
        phone: req.phone,
        email: req.email,
    };
    let saved = update_client(state.store.as_ref(), &ctx, id, changes, req.address.as_ref()).await?;

    Ok(Json(saved))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deactivate_client(state.store.as_ref(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteOutcome>> {
    req.validate()?;
    Ok(Json(bulk_delete_clients(state.store.as_ref(), &ctx, &req.ids).await?))
}
