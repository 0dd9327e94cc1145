/// Integration tests for the REST table store
///
/// Each test runs against an httpmock server standing in for the hosted
/// REST endpoint, checking the query dialect, headers and error mapping.

use frota_shared::models::driver::{CreateDriver, Driver};
use frota_shared::store::{Query, RestStore, StoreConfig, StoreError, TableStore};
use frota_shared::tenant::TenantContext;
use httpmock::prelude::*;
use serde_json::json;

const API_KEY: &str = "test-service-key";

fn store_for(server: &MockServer) -> RestStore {
    RestStore::new(StoreConfig {
        url: server.base_url(),
        api_key: API_KEY.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_select_renders_filters_and_window() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/rest/v1/drivers")
                .query_param("company_id", "eq.7")
                .query_param("name", "ilike.*silva*")
                .query_param("order", "id.desc")
                .query_param("offset", "10")
                .query_param("limit", "10")
                .header("apikey", API_KEY)
                .header("authorization", format!("Bearer {}", API_KEY));
            then.status(200)
                .json_body(json!([{"id": 3, "company_id": 7, "name": "Ana Silva"}]));
        })
        .await;

    let query = Query::table("drivers")
        .eq("company_id", 7)
        .ilike("name", "%silva%")
        .order("id", false)
        .range(10, 10);
    let rows = store_for(&server).select(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Ana Silva");
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::HEAD)
                .path("/rest/v1/vehicles")
                .query_param("company_id", "eq.1")
                .header("prefer", "count=exact");
            then.status(200).header("content-range", "*/42");
        })
        .await;

    let total = store_for(&server)
        .count(&Query::table("vehicles").eq("company_id", 1).range(0, 10))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(total, 42);
}

#[tokio::test]
async fn test_insert_returns_representation() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::POST)
                .path("/rest/v1/drivers")
                .header("prefer", "return=representation")
                .body_includes(r#""document":"12345678901""#);
            then.status(201).json_body(json!([{
                "id": 11,
                "company_id": 5,
                "name": "Maria",
                "document": "12345678901",
                "active": true
            }]));
        })
        .await;

    let driver = Driver::create(
        &store_for(&server),
        &TenantContext::new(5),
        CreateDriver {
            name: "Maria".to_string(),
            document: "12345678901".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(driver.id, 11);
    assert!(driver.active);
}

#[tokio::test]
async fn test_unique_violation_maps_to_conflict() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/rest/v1/vehicles");
            then.status(409).json_body(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint",
                "details": "Key (company_id, plate)=(1, ABC1D23) already exists."
            }));
        })
        .await;

    let row = json!({"plate": "ABC1D23"}).as_object().cloned().unwrap();
    let err = store_for(&server).insert("vehicles", row).await.unwrap_err();

    assert!(err.is_conflict());
    match err {
        StoreError::Conflict { table, message } => {
            assert_eq!(table, "vehicles");
            assert!(message.contains("already exists"));
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_errors_map_to_api() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET).path("/rest/v1/cities");
            then.status(500).body("upstream exploded");
        })
        .await;

    let err = store_for(&server)
        .select(&Query::table("cities"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Api { status: 500, ref message } if message == "upstream exploded"));
}

#[tokio::test]
async fn test_maybe_single_treats_empty_as_none() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/rest/v1/states")
                .query_param("abbreviation", "eq.ZZ")
                .query_param("limit", "2");
            then.status(200).json_body(json!([]));
        })
        .await;

    let row = store_for(&server)
        .maybe_single(&Query::table("states").eq("abbreviation", "ZZ"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(row.is_none());
}

#[tokio::test]
async fn test_unfiltered_delete_is_refused_locally() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::DELETE);
            then.status(200).json_body(json!([]));
        })
        .await;

    let err = store_for(&server)
        .delete(&Query::table("drivers"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UnfilteredWrite(_)));
    assert_eq!(mock.calls_async().await, 0);
}

#[tokio::test]
async fn test_patch_filters_by_id_and_tenant() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::PATCH)
                .path("/rest/v1/drivers")
                .query_param("company_id", "eq.2")
                .query_param("id", "eq.9")
                .json_body(json!({"active": false}));
            then.status(200)
                .json_body(json!([{"id": 9, "company_id": 2, "active": false}]));
        })
        .await;

    let updated = Driver::set_active(&store_for(&server), &TenantContext::new(2), 9, false)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(updated);
}
