/// API route handlers
///
/// Organized by resource:
///
/// - `health`: store ping
/// - `postal`: postal code autofill
/// - `states`: state reference list
/// - `drivers`, `clients`, `vehicles`: form and list operations
/// - `registration`: aggregate driver (driver + vehicle + address)
/// - `fleet`: odometer readings and checklists

pub mod clients;
pub mod drivers;
pub mod fleet;
pub mod health;
pub mod postal;
pub mod registration;
pub mod states;
pub mod vehicles;

use axum::http::{header, HeaderMap};
use bytes::Bytes;
use frota_shared::services::documents::Upload;
use serde::Deserialize;
use validator::Validate;

/// Bulk delete request
#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1, message = "Select at least one row"))]
    pub ids: Vec<i64>,
}

/// Builds an upload from a raw request body
///
/// A missing `Content-Type` is passed through as empty and rejected as
/// unsupported by the upload checks.
pub(crate) fn upload_from(kind: String, headers: &HeaderMap, body: Bytes) -> Upload {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Upload {
        kind,
        content_type,
        data: body,
    }
}
