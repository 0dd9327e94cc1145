/// REST table store client
///
/// Talks to the hosted record store through its table REST dialect:
///
/// ```text
/// GET    /rest/v1/{table}?col=eq.v&name=ilike.*x*&order=id.desc&offset=0&limit=10
/// HEAD   /rest/v1/{table}?...            Prefer: count=exact  -> Content-Range: */N
/// POST   /rest/v1/{table}                Prefer: return=representation
/// PATCH  /rest/v1/{table}?id=eq.1        Prefer: return=representation
/// DELETE /rest/v1/{table}?id=in.(1,2)    Prefer: return=representation
/// ```
///
/// Every request carries the `apikey` header and a bearer token. A 409
/// response, or an error body with Postgres code `23505`, is reported as
/// `StoreError::Conflict`.
///
/// # Example
///
/// ```no_run
/// use frota_shared::store::{RestStore, StoreConfig, Query, TableStore};
///
/// # async fn example() -> Result<(), frota_shared::store::StoreError> {
/// let store = RestStore::new(StoreConfig {
///     url: "https://project.example.co".to_string(),
///     api_key: "service-key".to_string(),
///     timeout_secs: 10,
/// })?;
///
/// let total = store.count(&Query::table("drivers").eq("company_id", 1)).await?;
/// println!("{} drivers", total);
/// # Ok(())
/// # }
/// ```

use super::{Query, Row, StoreError, StoreResult, TableStore};
use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

/// Postgres SQLSTATE for unique violations
const UNIQUE_VIOLATION: &str = "23505";

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted project (without `/rest/v1`)
    pub url: String,

    /// API key sent as `apikey` and bearer token
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Loads store configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `STORE_URL`: Base URL of the hosted project (required)
    /// - `STORE_API_KEY`: API key (required)
    /// - `STORE_TIMEOUT_SECS`: Request timeout (default: 10)
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        let url = env::var("STORE_URL").map_err(|_| {
            StoreError::Config("STORE_URL environment variable is required".to_string())
        })?;

        let api_key = env::var("STORE_API_KEY").map_err(|_| {
            StoreError::Config("STORE_API_KEY environment variable is required".to_string())
        })?;

        let timeout_secs = env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            url,
            api_key,
            timeout_secs,
        })
    }
}

/// Error body returned by the REST API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    details: Option<String>,
}

/// reqwest-backed `TableStore`
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl RestStore {
    /// Creates a new client
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` if the URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::Config("store URL is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url(), table);
        self.http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
    }

    async fn send(&self, table: &str, builder: RequestBuilder) -> StoreResult<Response> {
        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(table, response).await)
        }
    }

    async fn error_from(table: &str, response: Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();

        let message = body
            .as_ref()
            .and_then(|b| {
                b.message.clone().map(|m| match &b.details {
                    Some(d) => format!("{} ({})", m, d),
                    None => m,
                })
            })
            .unwrap_or_else(|| text.clone());

        let unique_violation = body
            .as_ref()
            .and_then(|b| b.code.as_deref())
            .map(|code| code == UNIQUE_VIOLATION)
            .unwrap_or(false);

        if status == StatusCode::CONFLICT || unique_violation {
            debug!(table, %message, "Unique constraint violation");
            return StoreError::Conflict {
                table: table.to_string(),
                message,
            };
        }

        warn!(table, status = status.as_u16(), %message, "Store request failed");
        StoreError::Api {
            status: status.as_u16(),
            message,
        }
    }

    async fn rows(response: Response) -> StoreResult<Vec<Row>> {
        let value: Value = response.json().await?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(StoreError::Decode(format!("expected row object, got {}", other))),
                })
                .collect(),
            Value::Object(row) => Ok(vec![row]),
            other => Err(StoreError::Decode(format!("expected row array, got {}", other))),
        }
    }
}

/// Parses the total out of a `Content-Range` header (`0-9/42` or `*/42`)
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
        debug!(table = %query.table, "select");
        let builder = self
            .request(Method::GET, &query.table)
            .query(&query.to_params());
        let response = self.send(&query.table, builder).await?;
        Self::rows(response).await
    }

    async fn count(&self, query: &Query) -> StoreResult<u64> {
        debug!(table = %query.table, "count");
        let builder = self
            .request(Method::HEAD, &query.table)
            .query(&query.filters_only().to_params())
            .header("Prefer", "count=exact");
        let response = self.send(&query.table, builder).await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Decode("missing or invalid Content-Range".to_string()))
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        debug!(table, "insert");
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.send(table, builder).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, query: &Query, patch: Row) -> StoreResult<Vec<Row>> {
        if query.filters.is_empty() {
            return Err(StoreError::UnfilteredWrite(query.table.clone()));
        }

        debug!(table = %query.table, "update");
        let builder = self
            .request(Method::PATCH, &query.table)
            .query(&query.filters_only().to_params())
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.send(&query.table, builder).await?;
        Self::rows(response).await
    }

    async fn delete(&self, query: &Query) -> StoreResult<u64> {
        if query.filters.is_empty() {
            return Err(StoreError::UnfilteredWrite(query.table.clone()));
        }

        debug!(table = %query.table, "delete");
        let builder = self
            .request(Method::DELETE, &query.table)
            .query(&query.filters_only().to_params())
            .header("Prefer", "return=representation");
        let response = self.send(&query.table, builder).await?;
        Ok(Self::rows(response).await?.len() as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        let url = format!("{}/rest/v1/", self.base_url());
        let builder = self
            .http
            .get(url)
            .header("apikey", &self.config.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key));
        self.send("", builder).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
    }

    #[test]
    fn test_new_rejects_empty_url() {
        let config = StoreConfig {
            url: "  ".to_string(),
            api_key: "k".to_string(),
            timeout_secs: 1,
        };
        assert!(matches!(RestStore::new(config), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let store = RestStore::new(StoreConfig {
            url: "http://localhost:54321/".to_string(),
            api_key: "k".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(store.base_url(), "http://localhost:54321");
    }
}
