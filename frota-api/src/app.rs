/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use frota_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config)?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::{Config, StoreBackend};
use crate::middleware::tenant::{tenant_layer, COMPANY_HEADER};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use frota_shared::postal::PostalLookupClient;
use frota_shared::storage::{InMemoryObjectStorage, ObjectStorage, RestObjectStorage, MAX_UPLOAD_BYTES};
use frota_shared::store::{InMemoryStore, RestStore, TableStore};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub store: Arc<dyn TableStore>,

    /// Object storage for uploaded documents
    pub storage: Arc<dyn ObjectStorage>,

    /// Postal code lookup client
    pub postal: PostalLookupClient,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state from explicit parts
    pub fn new(
        store: Arc<dyn TableStore>,
        storage: Arc<dyn ObjectStorage>,
        config: Config,
    ) -> anyhow::Result<Self> {
        let postal = PostalLookupClient::new(config.postal.clone())?;
        Ok(Self {
            store,
            storage,
            postal,
            config: Arc::new(config),
        })
    }

    /// Creates state with the backend selected in the configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let (store, storage): (Arc<dyn TableStore>, Arc<dyn ObjectStorage>) = match config.backend {
            StoreBackend::Rest => {
                let store_config = config
                    .store
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("store configuration missing for rest backend"))?;
                let storage_config = config
                    .storage
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("storage configuration missing for rest backend"))?;
                (
                    Arc::new(RestStore::new(store_config)?),
                    Arc::new(RestObjectStorage::new(storage_config)?),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                (
                    Arc::new(InMemoryStore::with_default_schema()),
                    Arc::new(InMemoryObjectStorage::new()),
                )
            }
        };

        Self::new(store, storage, config)
    }

    /// Bucket receiving uploaded documents
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── GET /health
/// ├── /v1/                                  (reference data, no tenant)
/// │   ├── GET  /postal-codes/:code
/// │   └── GET  /states
/// └── /v1/                                  (X-Company-Id required)
///     ├── /drivers            GET POST, /:id GET PUT DELETE, POST /bulk-delete,
///     │                       POST /:id/documents/:kind
///     ├── POST /aggregate-drivers
///     ├── /clients            GET POST, /:id GET PUT DELETE, POST /bulk-delete
///     ├── /vehicles           GET POST, /:id GET PUT DELETE, POST /bulk-delete,
///     │                       POST /:id/documents/:kind, GET POST /:id/odometer-readings
///     └── /checklists         GET POST
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let driver_routes = Router::new()
        .route("/", get(routes::drivers::list).post(routes::drivers::create))
        .route("/bulk-delete", post(routes::drivers::bulk_delete))
        .route(
            "/:id",
            get(routes::drivers::detail)
                .put(routes::drivers::update)
                .delete(routes::drivers::deactivate),
        )
        .route("/:id/documents/:kind", post(routes::drivers::upload_document));

    let client_routes = Router::new()
        .route("/", get(routes::clients::list).post(routes::clients::create))
        .route("/bulk-delete", post(routes::clients::bulk_delete))
        .route(
            "/:id",
            get(routes::clients::detail)
                .put(routes::clients::update)
                .delete(routes::clients::deactivate),
        );

    let vehicle_routes = Router::new()
        .route("/", get(routes::vehicles::list).post(routes::vehicles::create))
        .route("/bulk-delete", post(routes::vehicles::bulk_delete))
        .route(
            "/:id",
            get(routes::vehicles::detail)
                .put(routes::vehicles::update)
                .delete(routes::vehicles::deactivate),
        )
        .route("/:id/documents/:kind", post(routes::vehicles::upload_document))
        .route(
            "/:id/odometer-readings",
            get(routes::fleet::list_odometer).post(routes::fleet::record_odometer),
        );

    let reference_routes = Router::new()
        .route("/postal-codes/:code", get(routes::postal::lookup))
        .route("/states", get(routes::states::list));

    let tenant_routes = Router::new()
        .route("/aggregate-drivers", post(routes::registration::register))
        .route(
            "/checklists",
            get(routes::fleet::list_checklists).post(routes::fleet::create_checklist),
        )
        .nest("/drivers", driver_routes)
        .nest("/clients", client_routes)
        .nest("/vehicles", vehicle_routes)
        .layer(middleware::from_fn(tenant_layer));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                HeaderName::from_static(COMPANY_HEADER),
            ])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", tenant_routes.merge(reference_routes))
        // Raw document uploads reach MAX_UPLOAD_BYTES
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
