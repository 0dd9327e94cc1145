/// Postal code (CEP) lookup
///
/// Thin client over a ViaCEP-compatible service:
///
/// ```text
/// GET {base}/ws/{8 digits}/json/
/// 200 {"cep": "01310-100", "logradouro": "Avenida Paulista", "complemento": "",
///      "bairro": "Bela Vista", "localidade": "São Paulo", "uf": "SP"}
/// 200 {"erro": true}                      -> not found
/// ```
///
/// The lookup is advisory. `autofill` never fails: a missing or unreachable
/// code clears the dependent address fields and reports a notice, leaving
/// manual entry open.

use crate::address::AddressFields;
use crate::validation::digits_only;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Number of digits in a postal code
pub const POSTAL_CODE_LEN: usize = 8;

/// Postal lookup errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum PostalError {
    #[error("Postal code must have 8 digits: {0:?}")]
    InvalidCode(String),

    #[error("Postal service unreachable: {0}")]
    Transport(String),

    #[error("Postal service returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected postal service payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for PostalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PostalError::Decode(err.to_string())
        } else {
            PostalError::Transport(err.to_string())
        }
    }
}

/// Postal service configuration
#[derive(Debug, Clone)]
pub struct PostalConfig {
    /// Service root, e.g. `https://viacep.com.br`
    pub base_url: String,

    pub timeout_secs: u64,
}

impl Default for PostalConfig {
    fn default() -> Self {
        PostalConfig {
            base_url: "https://viacep.com.br".to_string(),
            timeout_secs: 5,
        }
    }
}

impl PostalConfig {
    /// Reads `POSTAL_BASE_URL` and `POSTAL_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = PostalConfig::default();
        PostalConfig {
            base_url: std::env::var("POSTAL_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("POSTAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Address returned for a postal code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub postal_code: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Wire payload of the lookup service
#[derive(Debug, Deserialize)]
struct LookupPayload {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,

    /// `true` (or `"true"`) when the code does not exist
    #[serde(default)]
    erro: Option<Value>,
}

impl LookupPayload {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl From<LookupPayload> for PostalAddress {
    fn from(p: LookupPayload) -> Self {
        PostalAddress {
            postal_code: digits_only(&p.cep),
            street: p.logradouro,
            complement: p.complemento,
            neighborhood: p.bairro,
            city: p.localidade,
            state: p.uf,
        }
    }
}

/// HTTP client for the postal lookup service
#[derive(Debug, Clone)]
pub struct PostalLookupClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostalLookupClient {
    pub fn new(config: PostalConfig) -> Result<Self, PostalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(PostalLookupClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Looks up a postal code
    ///
    /// The mask (`01310-100`) is stripped first. Returns `Ok(None)` when the
    /// service reports the code as unknown.
    ///
    /// # Errors
    ///
    /// `InvalidCode` without any request when the code is not 8 digits;
    /// `Transport`, `Status` or `Decode` when the service misbehaves.
    pub async fn lookup(&self, code: &str) -> Result<Option<PostalAddress>, PostalError> {
        let digits = digits_only(code);
        if digits.len() != POSTAL_CODE_LEN {
            return Err(PostalError::InvalidCode(code.to_string()));
        }

        let url = format!("{}/ws/{}/json/", self.base_url, digits);
        debug!(postal_code = %digits, "Looking up postal code");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        // Malformed codes come back as 400 on the public service
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PostalError::Status(status.as_u16()));
        }

        let payload: LookupPayload = response.json().await?;
        if payload.is_not_found() {
            return Ok(None);
        }
        Ok(Some(payload.into()))
    }
}

/// Result of an autofill attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutofillOutcome {
    /// The postal code buffer is not 8 digits yet
    Skipped,

    /// Street, neighborhood, city and state were filled
    Filled,

    /// Unknown code; dependent fields were cleared
    NotFound,

    /// Service failure; dependent fields were cleared
    Unavailable { reason: String },
}

impl AutofillOutcome {
    /// User-facing notice, if any
    pub fn notice(&self) -> Option<String> {
        match self {
            AutofillOutcome::NotFound => Some("Postal code not found".to_string()),
            AutofillOutcome::Unavailable { .. } => {
                Some("Postal code lookup unavailable, fill in the address manually".to_string())
            }
            _ => None,
        }
    }
}

/// Fills the address from its postal code
///
/// Runs only when the postal code has exactly 8 digits. House number and
/// complement are never touched.
pub async fn autofill(client: &PostalLookupClient, fields: &mut AddressFields) -> AutofillOutcome {
    let digits = digits_only(&fields.postal_code);
    if digits.len() != POSTAL_CODE_LEN {
        return AutofillOutcome::Skipped;
    }

    match client.lookup(&digits).await {
        Ok(Some(found)) => {
            fields.street = found.street;
            fields.neighborhood = found.neighborhood;
            fields.city = found.city;
            fields.state = found.state;
            AutofillOutcome::Filled
        }
        Ok(None) => {
            fields.clear_lookup_fields();
            AutofillOutcome::NotFound
        }
        Err(err) => {
            warn!(postal_code = %digits, error = %err, "Postal lookup failed");
            fields.clear_lookup_fields();
            AutofillOutcome::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}
