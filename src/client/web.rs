use super::{decode_json, expect_status, join_url, CompressionClient, RemoteArtifact};
use crate::constants::{DEFAULT_WEB_HOST, WEB_PROCESS_PATH, WEB_STORE_PATH};
use crate::error::{CompressionError, Result};
use crate::formats::sniff_mime;
use crate::resolver::Source;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct StoreResponse {
    key: String,
    size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    key: &'a str,
    original_size: u64,
    original_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    url: String,
    size: u64,
    #[serde(rename = "type")]
    mime: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Client for the anonymous backend behind the tinypng.com upload page.
///
/// Compression takes two calls: the file is stored first, then processed by key.
#[derive(Debug, Clone)]
pub struct WebClient {
    http: Client,
    base_url: String,
}

impl WebClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_WEB_HOST.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn compress_from_file(&self, path: &Path) -> Result<RemoteArtifact> {
        let data = tokio::fs::read(path).await?;
        let mime = sniff_mime(&data);
        debug!(file = %path.display(), mime, bytes = data.len(), "storing file");

        let response = self
            .http
            .post(join_url(&self.base_url, WEB_STORE_PATH))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(CompressionError::from_transport)?;
        let stored: StoreResponse = decode_json(expect_status(response, StatusCode::CREATED).await?).await?;

        let request = ProcessRequest {
            key: &stored.key,
            original_size: stored.size,
            original_type: mime,
        };
        debug!(key = %stored.key, "processing stored file");

        let response = self
            .http
            .post(join_url(&self.base_url, WEB_PROCESS_PATH))
            .json(&request)
            .send()
            .await
            .map_err(CompressionError::from_transport)?;
        let processed: ProcessResponse =
            decode_json(expect_status(response, StatusCode::CREATED).await?).await?;
        debug!(
            url = %processed.url,
            width = ?processed.width,
            height = ?processed.height,
            "processed image available"
        );

        Ok(RemoteArtifact {
            download_url: processed.url,
            original_size: stored.size,
            compressed_size: processed.size,
            content_type: processed.mime,
        })
    }
}

#[async_trait]
impl CompressionClient for WebClient {
    fn name(&self) -> &'static str {
        "web"
    }

    async fn compress(&self, source: &Source) -> Result<RemoteArtifact> {
        match source {
            Source::File(path) => self.compress_from_file(path).await,
            Source::Url(url) => Err(CompressionError::UnsupportedSource(format!(
                "the web backend only accepts local files, got {}",
                url
            ))),
        }
    }
}
