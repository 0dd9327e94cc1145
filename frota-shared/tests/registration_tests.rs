/// Integration tests for the registration and list flows
///
/// Covers the cross-module guarantees: validation before any store call,
/// driver compensation when the vehicle insert fails, and address failures
/// downgraded to warnings.

use frota_shared::address::AddressFields;
use frota_shared::models::driver::CreateDriver;
use frota_shared::models::vehicle::CreateVehicle;
use frota_shared::services::listing::{bulk_delete_vehicles, list_vehicles, ListParams};
use frota_shared::services::registration::register_aggregate_driver;
use frota_shared::services::RegistrationError;
use frota_shared::store::{InMemoryStore, StoreError, StoreOp, TableStore};
use frota_shared::tenant::TenantContext;
use frota_shared::validation::validate_document;
use serde_json::json;

async fn store() -> InMemoryStore {
    let store = InMemoryStore::with_default_schema();
    store
        .insert(
            "states",
            json!({"abbreviation": "BA", "name": "Bahia"}).as_object().cloned().unwrap(),
        )
        .await
        .unwrap();
    store
}

fn driver(document: &str) -> CreateDriver {
    CreateDriver {
        name: "Rita Barbosa".to_string(),
        document: document.to_string(),
        license_number: Some("01234567890".to_string()),
        license_category: Some("E".to_string()),
        ..Default::default()
    }
}

fn vehicle(plate: &str) -> CreateVehicle {
    CreateVehicle {
        plate: plate.to_string(),
        model: "Atego 2430".to_string(),
        brand: Some("Mercedes-Benz".to_string()),
        year: Some(2019),
        ..Default::default()
    }
}

fn salvador() -> AddressFields {
    AddressFields {
        postal_code: "40020-000".to_string(),
        state: "BA".to_string(),
        city: "Salvador".to_string(),
        neighborhood: "Comércio".to_string(),
        street: "Avenida da França".to_string(),
        house_number: "393".to_string(),
        complement: String::new(),
    }
}

#[test]
fn test_document_length_property() {
    for len in 0..20 {
        let document = "7".repeat(len);
        assert_eq!(validate_document(&document).is_ok(), len == 11, "length {}", len);
    }
}

#[tokio::test]
async fn test_invalid_document_makes_no_store_call() {
    let store = store().await;

    let err = register_aggregate_driver(
        &store,
        &TenantContext::new(1),
        driver("123.456.789-0"),
        vehicle("ABC1D23"),
        &salvador(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RegistrationError::Validation(_)));
    assert_eq!(store.call_count("drivers", StoreOp::Insert), 0);
    assert_eq!(store.call_count("vehicles", StoreOp::Insert), 0);
}

#[tokio::test]
async fn test_duplicate_plate_compensates_driver() {
    let store = store().await;
    let ctx = TenantContext::new(1);

    register_aggregate_driver(&store, &ctx, driver("11111111111"), vehicle("ABC1D23"), &salvador())
        .await
        .unwrap();

    let err = register_aggregate_driver(&store, &ctx, driver("22222222222"), vehicle("abc-1d23"), &salvador())
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::DuplicatePlate(ref p) if p == "ABC1D23"));
    let drivers = store.rows("drivers");
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0]["document"], "11111111111");
    assert_eq!(store.row_count("vehicles"), 1);
}

#[tokio::test]
async fn test_duplicate_document_inserts_nothing_else() {
    let store = store().await;
    let ctx = TenantContext::new(1);

    register_aggregate_driver(&store, &ctx, driver("11111111111"), vehicle("ABC1D23"), &salvador())
        .await
        .unwrap();
    let err = register_aggregate_driver(&store, &ctx, driver("11111111111"), vehicle("XYZ9876"), &salvador())
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::DuplicateDocument(_)));
    assert_eq!(store.call_count("vehicles", StoreOp::Insert), 1);
}

#[tokio::test]
async fn test_address_failure_keeps_driver_and_vehicle() {
    let store = store().await;
    store.fail_next("neighborhoods", StoreOp::Insert, StoreError::Transport("connection reset".into()));

    let outcome = register_aggregate_driver(
        &store,
        &TenantContext::new(1),
        driver("33333333333"),
        vehicle("QRS4T56"),
        &salvador(),
    )
    .await
    .unwrap();

    let warning = outcome.address_warning.expect("address warning");
    assert!(warning.contains("neighborhood"));
    assert_eq!(outcome.address_id, None);
    assert_eq!(store.row_count("drivers"), 1);
    assert_eq!(store.row_count("vehicles"), 1);
    assert_eq!(store.row_count("driver_addresses"), 0);
}

#[tokio::test]
async fn test_unknown_state_is_a_warning() {
    let store = store().await;
    let mut address = salvador();
    address.state = "ZZ".to_string();

    let outcome = register_aggregate_driver(
        &store,
        &TenantContext::new(1),
        driver("44444444444"),
        vehicle("JKL3M45"),
        &address,
    )
    .await
    .unwrap();

    assert!(outcome.address_warning.is_some());
    assert_eq!(store.row_count("cities"), 0);
}

#[tokio::test]
async fn test_registered_vehicle_listed_and_bulk_deleted() {
    let store = store().await;
    let ctx = TenantContext::new(8);

    let outcome = register_aggregate_driver(&store, &ctx, driver("55555555555"), vehicle("MNO5P67"), &salvador())
        .await
        .unwrap();

    let params = ListParams {
        search: Some("atego".to_string()),
        ..Default::default()
    };
    let page = list_vehicles(&store, &ctx, &params).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, outcome.vehicle.id);

    let deleted = bulk_delete_vehicles(&store, &ctx, &[outcome.vehicle.id]).await.unwrap();
    assert_eq!(deleted.deleted, 1);
    assert_eq!(list_vehicles(&store, &ctx, &ListParams::default()).await.unwrap().total, 0);
    // The driver stays
    assert_eq!(store.row_count("drivers"), 1);
}
