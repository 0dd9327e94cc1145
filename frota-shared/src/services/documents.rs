/// Document uploads for drivers and vehicles
///
/// The file is checked (size, type) before the transfer, stored under
/// `{company_id}/{drivers|vehicles}/{owner_id}/{uuid}.{ext}` and its public
/// URL recorded in the owner's document table.

use super::RegistrationError;
use crate::models::document::{Document, DocumentOwner};
use crate::models::driver::Driver;
use crate::models::vehicle::Vehicle;
use crate::storage::{validate_upload, ObjectStorage};
use crate::store::TableStore;
use crate::tenant::TenantContext;
use crate::validation::require;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

/// File submitted for upload
#[derive(Debug, Clone)]
pub struct Upload {
    /// Document type, e.g. "cnh", "crlv"
    pub kind: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Storage key of a new document
pub fn object_path(ctx: &TenantContext, owner: DocumentOwner, owner_id: i64, ext: &str) -> String {
    format!(
        "{}/{}/{}/{}.{}",
        ctx.company_id,
        owner.as_str(),
        owner_id,
        Uuid::new_v4(),
        ext
    )
}

async fn upload_document(
    store: &dyn TableStore,
    storage: &dyn ObjectStorage,
    bucket: &str,
    ctx: &TenantContext,
    owner: DocumentOwner,
    owner_id: i64,
    upload: Upload,
) -> Result<Document, RegistrationError> {
    let kind = require("kind", &upload.kind)?.to_lowercase();
    let ext = validate_upload(upload.data.len(), &upload.content_type)?;

    let exists = match owner {
        DocumentOwner::Driver => Driver::find_by_id(store, ctx, owner_id).await?.is_some(),
        DocumentOwner::Vehicle => Vehicle::find_by_id(store, ctx, owner_id).await?.is_some(),
    };
    if !exists {
        let entity = match owner {
            DocumentOwner::Driver => "driver",
            DocumentOwner::Vehicle => "vehicle",
        };
        return Err(RegistrationError::not_found(entity, owner_id));
    }

    let path = object_path(ctx, owner, owner_id, ext);
    let url = storage
        .upload(bucket, &path, upload.data, &upload.content_type)
        .await?;

    let document = Document::create(store, ctx, owner, owner_id, &kind, &url, &upload.content_type).await?;
    info!(owner = owner.as_str(), owner_id, kind = %kind, path = %path, "Document uploaded");
    Ok(document)
}

/// Uploads a driver document (license scan, proof of address...)
pub async fn upload_driver_document(
    store: &dyn TableStore,
    storage: &dyn ObjectStorage,
    bucket: &str,
    ctx: &TenantContext,
    driver_id: i64,
    upload: Upload,
) -> Result<Document, RegistrationError> {
    upload_document(store, storage, bucket, ctx, DocumentOwner::Driver, driver_id, upload).await
}

/// Uploads a vehicle document (registration certificate, photos...)
pub async fn upload_vehicle_document(
    store: &dyn TableStore,
    storage: &dyn ObjectStorage,
    bucket: &str,
    ctx: &TenantContext,
    vehicle_id: i64,
    upload: Upload,
) -> Result<Document, RegistrationError> {
    upload_document(store, storage, bucket, ctx, DocumentOwner::Vehicle, vehicle_id, upload).await
}
