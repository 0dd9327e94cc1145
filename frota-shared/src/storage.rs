/// Object storage for uploaded documents
///
/// Driver and vehicle documents (license scans, registration certificates)
/// are stored as objects in a bucket of the hosted storage service; the
/// public URL is kept in the document row.
///
/// Uploads are checked before any byte leaves the process: at most 15 MB and
/// one of JPEG, PNG or PDF.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header;
use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Accepted MIME types and their file extensions
pub const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("application/pdf", "pdf"),
];

/// Upload errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
    #[error("File is empty")]
    Empty,

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Storage request failed: {0}")]
    Transport(String),

    #[error("Storage returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(err.to_string())
    }
}

/// Checks size and type of an upload, returning the file extension
///
/// Parameters such as `; charset=...` are ignored.
pub fn validate_upload(size: usize, content_type: &str) -> Result<&'static str, UploadError> {
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| UploadError::UnsupportedType(content_type.to_string()))
}

/// Bucket-based object storage
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `data` at `path` inside `bucket` and returns its public URL
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, UploadError>;
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL of the hosted project
    pub url: String,

    pub api_key: String,

    /// Bucket receiving documents
    pub bucket: String,

    pub timeout_secs: u64,
}

impl StorageConfig {
    /// Loads storage configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `STORE_URL`, `STORE_API_KEY`: shared with the record store (required)
    /// - `STORAGE_BUCKET`: bucket name (default: `documents`)
    /// - `STORE_TIMEOUT_SECS`: request timeout (default: 30 for uploads)
    pub fn from_env() -> Result<Self, UploadError> {
        dotenvy::dotenv().ok();

        let url = env::var("STORE_URL")
            .map_err(|_| UploadError::Config("STORE_URL environment variable is required".into()))?;
        let api_key = env::var("STORE_API_KEY").map_err(|_| {
            UploadError::Config("STORE_API_KEY environment variable is required".into())
        })?;

        Ok(StorageConfig {
            url,
            api_key,
            bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "documents".to_string()),
            timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

/// reqwest-backed storage client
#[derive(Debug, Clone)]
pub struct RestObjectStorage {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestObjectStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::Config(e.to_string()))?;

        Ok(RestObjectStorage {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Public URL of an object
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

#[async_trait]
impl ObjectStorage for RestObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        let size = data.len();

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(bucket, path, status = status.as_u16(), %message, "Upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!(bucket, path, size, "Object uploaded");
        Ok(self.public_url(bucket, path))
    }
}

/// Object stored by `InMemoryObjectStorage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-process storage for tests and local runs
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_next: Mutex<Option<UploadError>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next upload fail with `error`
    pub fn fail_next(&self, error: UploadError) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Object stored under `bucket/path`
    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&format!("{}/{}", bucket, path))
            .cloned()
    }

    /// Keys (`bucket/path`) of every stored object
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, UploadError> {
        if let Some(err) = self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).take() {
            return Err(err);
        }

        let key = format!("{}/{}", bucket, path);
        debug!(key = %key, size = data.len(), "Stored object in memory");
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).insert(
            key.clone(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("memory://{}", key))
    }
}
