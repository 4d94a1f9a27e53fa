//! Clients for the remote compression service.
//!
//! Both protocol variants implement [`CompressionClient`], so the batch runner and the download
//! policy never need to know which one is in use.

mod api;
mod web;

pub use api::TinifyClient;
pub use web::WebClient;

use crate::error::{CompressionError, Result};
use crate::resolver::Source;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A compressed image held by the remote service, ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
    pub download_url: String,
    pub original_size: u64,
    pub compressed_size: u64,
    /// MIME type of the compressed image as declared by the service
    pub content_type: String,
}

#[async_trait]
pub trait CompressionClient: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Uploads `source` and returns the compressed result. Never retries.
    async fn compress(&self, source: &Source) -> Result<RemoteArtifact>;
}

/// Error body the service sends alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// Passes the response through when it carries `expected`, otherwise turns it into
/// `RemoteRejected` with whatever explanation the body offers.
pub(crate) async fn expect_status(response: Response, expected: StatusCode) -> Result<Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ServiceError>(&body) {
        Ok(err) if !err.message.is_empty() => err.message,
        Ok(err) => err.error,
        Err(_) => String::new(),
    };
    Err(CompressionError::RemoteRejected { status, message })
}

/// Reads the whole body and decodes it as JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(CompressionError::from_transport)?;
    serde_json::from_slice(&body).map_err(|e| CompressionError::MalformedResponse(e.to_string()))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
