/// Entity flows behind the back-office forms and lists
///
/// - `registration`: aggregate driver + vehicle registration (compensated)
/// - `drivers`, `clients`, `vehicles`: create/update forms
/// - `fleet`: odometer readings and checklists
/// - `listing`: paginated search, soft delete and bulk delete
/// - `documents`: document uploads
///
/// Every function takes the store and the tenant context explicitly.
/// Primary-entity failures are returned as `RegistrationError`; address and
/// cascade failures after the entity is persisted are returned as warnings.

pub mod clients;
pub mod documents;
pub mod drivers;
pub mod error;
pub mod fleet;
pub mod listing;
pub mod registration;
pub mod vehicles;

pub use error::RegistrationError;

use crate::address::{save_address, AddressFields, ResolutionError};
use crate::models::address::AddressOwner;
use crate::store::TableStore;
use serde::Serialize;
use tracing::warn;

/// A persisted entity plus non-fatal warnings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Saved<T> {
    pub entity: T,

    /// Address row written for the entity, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<i64>,

    pub warnings: Vec<String>,
}

impl<T> Saved<T> {
    pub(crate) fn new(entity: T) -> Self {
        Saved {
            entity,
            address_id: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn with_address(mut self, result: AddressResult) -> Self {
        match result {
            AddressResult::Skipped => {}
            AddressResult::Saved(id) => self.address_id = Some(id),
            AddressResult::Failed(warning) => self.warnings.push(warning),
        }
        self
    }
}

/// Outcome of the best-effort address step
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AddressResult {
    /// No address fields were filled in
    Skipped,
    Saved(i64),
    Failed(String),
}

fn is_blank(fields: &AddressFields) -> bool {
    [
        &fields.postal_code,
        &fields.state,
        &fields.city,
        &fields.neighborhood,
        &fields.street,
        &fields.house_number,
        &fields.complement,
    ]
    .iter()
    .all(|f| f.trim().is_empty())
}

/// Saves the owner's address without failing the surrounding flow
///
/// Blank forms are skipped. Partially filled forms and resolver failures
/// become a warning.
pub(crate) async fn save_address_best_effort(
    store: &dyn TableStore,
    owner: &AddressOwner,
    fields: Option<&AddressFields>,
) -> AddressResult {
    let fields = match fields {
        Some(fields) if !is_blank(fields) => fields,
        _ => return AddressResult::Skipped,
    };

    let result = if fields.is_sufficient() {
        save_address(store, owner, fields).await
    } else {
        Err(ResolutionError::Incomplete("street, city and state"))
    };

    match result {
        Ok(id) => AddressResult::Saved(id),
        Err(err) => {
            warn!(
                owner = ?owner.kind,
                owner_id = owner.id,
                error = %err,
                "Address not saved"
            );
            AddressResult::Failed(format!("Address not saved: {}", err))
        }
    }
}

/// Trims an optional text field, mapping blank to `None`
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
