/// Driver form flows
///
/// The driver row is written first; the address is saved afterwards on a
/// best-effort basis and its failure comes back as a warning.

use super::{clean, save_address_best_effort, RegistrationError, Saved};
use crate::address::AddressFields;
use crate::models::address::AddressOwner;
use crate::models::driver::{CreateDriver, Driver, UpdateDriver};
use crate::store::TableStore;
use crate::tenant::TenantContext;
use crate::validation::{require, validate_document};
use tracing::info;

fn normalize_new(mut data: CreateDriver) -> Result<CreateDriver, RegistrationError> {
    data.name = require("name", &data.name)?;
    data.document = validate_document(&data.document)?;
    data.phone = clean(data.phone);
    data.email = clean(data.email);
    data.license_number = clean(data.license_number);
    data.license_category = clean(data.license_category).map(|c| c.to_uppercase());
    Ok(data)
}

fn normalize_changes(mut data: UpdateDriver) -> Result<UpdateDriver, RegistrationError> {
    if let Some(name) = &data.name {
        data.name = Some(require("name", name)?);
    }
    if let Some(document) = &data.document {
        data.document = Some(validate_document(document)?);
    }
    data.license_category = data.license_category.map(|c| c.trim().to_uppercase());
    Ok(data)
}

/// Creates a driver and, if filled in, their address
pub async fn create_driver(
    store: &dyn TableStore,
    ctx: &TenantContext,
    data: CreateDriver,
    address: Option<&AddressFields>,
) -> Result<Saved<Driver>, RegistrationError> {
    let data = normalize_new(data)?;
    let document = data.document.clone();

    let driver = Driver::create(store, ctx, data)
        .await
        .map_err(RegistrationError::document(&document))?;
    info!(company_id = ctx.company_id, driver_id = driver.id, "Driver created");

    let owner = AddressOwner::driver(driver.id);
    let address = save_address_best_effort(store, &owner, address).await;
    Ok(Saved::new(driver).with_address(address))
}

/// Updates a driver and rewrites their current address
///
/// # Errors
///
/// `NotFound` when the driver does not belong to the company.
pub async fn update_driver(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
    changes: UpdateDriver,
    address: Option<&AddressFields>,
) -> Result<Saved<Driver>, RegistrationError> {
    let changes = normalize_changes(changes)?;
    let document = changes.document.clone().unwrap_or_default();

    let driver = Driver::update(store, ctx, id, changes)
        .await
        .map_err(RegistrationError::document(&document))?
        .ok_or_else(|| RegistrationError::not_found("driver", id))?;

    let owner = AddressOwner::driver(driver.id);
    let address = save_address_best_effort(store, &owner, address).await;
    Ok(Saved::new(driver).with_address(address))
}

/// Loads a driver of the company
pub async fn get_driver(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
) -> Result<Driver, RegistrationError> {
    Driver::find_by_id(store, ctx, id)
        .await?
        .ok_or_else(|| RegistrationError::not_found("driver", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreOp};

    fn ana() -> CreateDriver {
        CreateDriver {
            name: "  Ana Lima ".to_string(),
            document: "987.654.321-00".to_string(),
            license_category: Some("ab".to_string()),
            phone: Some("  ".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let store = InMemoryStore::with_default_schema();
        let saved = create_driver(&store, &TenantContext::new(1), ana(), None)
            .await
            .unwrap();

        assert_eq!(saved.entity.name, "Ana Lima");
        assert_eq!(saved.entity.document, "98765432100");
        assert_eq!(saved.entity.license_category.as_deref(), Some("AB"));
        assert_eq!(saved.entity.phone, None);
        assert!(saved.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_document() {
        let store = InMemoryStore::with_default_schema();
        let ctx = TenantContext::new(1);
        create_driver(&store, &ctx, ana(), None).await.unwrap();

        let err = create_driver(&store, &ctx, ana(), None).await.unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateDocument(d) if d == "98765432100"));
    }

    #[tokio::test]
    async fn test_partial_address_warns_but_keeps_driver() {
        let store = InMemoryStore::with_default_schema();
        let address = AddressFields {
            street: "Rua A".to_string(),
            ..Default::default()
        };

        let saved = create_driver(&store, &TenantContext::new(1), ana(), Some(&address))
            .await
            .unwrap();

        assert_eq!(saved.warnings.len(), 1);
        assert_eq!(saved.address_id, None);
        assert_eq!(store.row_count("drivers"), 1);
        assert_eq!(store.call_count("streets", StoreOp::Select), 0);
    }

    #[tokio::test]
    async fn test_address_without_neighborhood_is_saved() {
        let store = InMemoryStore::with_default_schema();
        let state = serde_json::json!({"abbreviation": "MG", "name": "Minas Gerais"});
        store
            .insert("states", state.as_object().cloned().unwrap())
            .await
            .unwrap();
        let address = AddressFields {
            postal_code: "35460-000".to_string(),
            state: "MG".to_string(),
            city: "Brumadinho".to_string(),
            street: "Rua Principal".to_string(),
            house_number: "10".to_string(),
            ..Default::default()
        };
        assert!(address.is_sufficient());

        let saved = create_driver(&store, &TenantContext::new(1), ana(), Some(&address))
            .await
            .unwrap();

        assert!(saved.warnings.is_empty(), "{:?}", saved.warnings);
        assert!(saved.address_id.is_some());
        assert_eq!(store.row_count("streets"), 1);
        assert_eq!(store.rows("neighborhoods")[0]["name"], "");
    }

    #[tokio::test]
    async fn test_update_unknown_driver() {
        let store = InMemoryStore::with_default_schema();
        let changes = UpdateDriver {
            name: Some("X".to_string()),
            ..Default::default()
        };

        let err = update_driver(&store, &TenantContext::new(1), 99, changes, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NotFound { entity: "driver", id: 99 }));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_document_before_store() {
        let store = InMemoryStore::with_default_schema();
        let changes = UpdateDriver {
            document: Some("123".to_string()),
            ..Default::default()
        };

        let err = update_driver(&store, &TenantContext::new(1), 1, changes, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
        assert_eq!(store.call_count("drivers", StoreOp::Update), 0);
    }
}
