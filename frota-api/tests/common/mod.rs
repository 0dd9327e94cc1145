/// Common test utilities for integration tests
///
/// Builds the full router over `InMemoryStore` and `InMemoryObjectStorage`,
/// seeded with a few states, and offers request helpers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use frota_api::app::{build_router, AppState};
use frota_api::config::Config;
use frota_shared::storage::InMemoryObjectStorage;
use frota_shared::store::{InMemoryStore, TableStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service as _;

/// Test context containing the app and handles on its backends
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub storage: Arc<InMemoryObjectStorage>,
    pub app: axum::Router,
    pub company_id: i64,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(Config::in_memory()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::with_default_schema());
        for (abbr, name) in [("SP", "São Paulo"), ("MG", "Minas Gerais"), ("BA", "Bahia")] {
            store
                .insert(
                    "states",
                    json!({"abbreviation": abbr, "name": name})
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
                .await
                .unwrap();
        }
        let storage = Arc::new(InMemoryObjectStorage::new());

        let state = AppState::new(store.clone(), storage.clone(), config).unwrap();

        TestContext {
            store,
            storage,
            app: build_router(state),
            company_id: 1,
        }
    }

    /// Sends a request as the test company and returns status and JSON body
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(self.company_id, method, uri, body).await
    }

    pub async fn send_as(
        &self,
        company_id: i64,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-company-id", company_id.to_string());

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.call(builder.body(body).unwrap()).await
    }

    /// Sends a raw request and returns status and JSON body (`Null` if empty)
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}

/// Address block in Salvador/BA
pub fn salvador() -> Value {
    json!({
        "postal_code": "40020-000",
        "state": "BA",
        "city": "Salvador",
        "neighborhood": "Comércio",
        "street": "Avenida da França",
        "house_number": "393",
        "complement": ""
    })
}
