use crate::constants::{DEFAULT_API_HOST, DEFAULT_TIMEOUT_SECS, DEFAULT_WEB_HOST, USER_AGENT};
use crate::error::{CompressionError, Result};
use std::fmt;
use std::time::Duration;

/// TinyPNG API credential. The value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Picks the API key from the command flag first, then from the environment.
///
/// Blank values are treated as absent.
pub fn resolve_api_key(flag: Option<&str>, env: Option<String>) -> Result<ApiKey> {
    let from_flag = flag.map(str::trim).filter(|key| !key.is_empty());
    if let Some(key) = from_flag {
        return Ok(ApiKey::new(key));
    }

    env.as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ApiKey::new)
        .ok_or(CompressionError::MissingApiKey)
}

/// Settings shared by every HTTP call of a run.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub api_base: String,
    pub web_base: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_base: DEFAULT_API_HOST.to_string(),
            web_base: DEFAULT_WEB_HOST.to_string(),
        }
    }
}

impl ClientSettings {
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        }
    }
}

/// Builds the one HTTP client a run uses. Clones share the connection pool.
pub fn build_http_client(settings: &ClientSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(CompressionError::HttpClient)
}
