/// Configuration management for the API server
///
/// Configuration comes from environment variables (a `.env` file is honoured
/// in development).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `STORE_BACKEND`: `rest` or `memory` (default: rest)
/// - `STORE_URL`, `STORE_API_KEY`, `STORE_TIMEOUT_SECS`: record store
/// - `STORAGE_BUCKET`: document bucket (default: documents)
/// - `POSTAL_BASE_URL`, `POSTAL_TIMEOUT_SECS`: postal lookup service
/// - `RUST_LOG`, `LOG_FORMAT`: logging (read by the binary)
///
/// # Example
///
/// ```no_run
/// use frota_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use frota_shared::postal::PostalConfig;
use frota_shared::storage::StorageConfig;
use frota_shared::store::StoreConfig;
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Which table store backs the API
    pub backend: StoreBackend,

    /// Record store settings, present for the `rest` backend
    pub store: Option<StoreConfig>,

    /// Object storage settings, present for the `rest` backend
    pub storage: Option<StorageConfig>,

    /// Bucket receiving uploaded documents
    pub bucket: String,

    pub postal: PostalConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` means permissive)
    pub cors_origins: Vec<String>,
}

/// Table store implementation selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted REST backend
    Rest,

    /// In-process store, for local runs and demos
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(StoreBackend::Rest),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("STORE_BACKEND must be 'rest' or 'memory', got '{}'", other),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable has an invalid value, or if the
    /// `rest` backend is selected without `STORE_URL`/`STORE_API_KEY`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "rest".to_string())
            .parse()?;

        let (store, storage) = match backend {
            StoreBackend::Rest => (
                Some(StoreConfig::from_env()?),
                Some(StorageConfig::from_env()?),
            ),
            StoreBackend::Memory => (None, None),
        };
        let bucket = storage
            .as_ref()
            .map(|s| s.bucket.clone())
            .unwrap_or_else(|| env::var("STORAGE_BUCKET").unwrap_or_else(|_| "documents".to_string()));

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            backend,
            store,
            storage,
            bucket,
            postal: PostalConfig::from_env(),
        })
    }

    /// Configuration for tests and local runs: in-memory backend, permissive CORS
    pub fn in_memory() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            backend: StoreBackend::Memory,
            store: None,
            storage: None,
            bucket: "documents".to_string(),
            postal: PostalConfig::default(),
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
