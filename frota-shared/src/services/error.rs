use crate::storage::UploadError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors of the entity flows
///
/// Address failures never appear here: they are downgraded to warnings
/// once the owning entity is persisted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistrationError {
    /// Input rejected before any store call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The document (CPF/CNPJ) is already registered for the company
    #[error("Document already registered: {0}")]
    DuplicateDocument(String),

    /// The plate is already registered for the company
    #[error("Plate already registered: {0}")]
    DuplicatePlate(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Any other store failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl RegistrationError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        RegistrationError::NotFound { entity, id }
    }

    /// Maps a unique violation to `DuplicateDocument`
    pub(crate) fn document(document: &str) -> impl FnOnce(StoreError) -> Self + '_ {
        move |err| {
            if err.is_conflict() {
                RegistrationError::DuplicateDocument(document.to_string())
            } else {
                RegistrationError::Persistence(err)
            }
        }
    }

    /// Maps a unique violation to `DuplicatePlate`
    pub(crate) fn plate(plate: &str) -> impl FnOnce(StoreError) -> Self + '_ {
        move |err| {
            if err.is_conflict() {
                RegistrationError::DuplicatePlate(plate.to_string())
            } else {
                RegistrationError::Persistence(err)
            }
        }
    }
}
