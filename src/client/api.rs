use super::{decode_json, expect_status, join_url, CompressionClient, RemoteArtifact};
use crate::config::ApiKey;
use crate::constants::{BASIC_AUTH_USER, DEFAULT_API_HOST, SHRINK_PATH};
use crate::error::{CompressionError, Result};
use crate::resolver::Source;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    input: ShrinkEntry,
    output: ShrinkEntry,
}

#[derive(Debug, Deserialize)]
struct ShrinkEntry {
    size: u64,
    #[serde(rename = "type")]
    mime: String,
    #[serde(default)]
    url: Option<String>,
}

/// Client for the authenticated Tinify developer API.
#[derive(Debug, Clone)]
pub struct TinifyClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl TinifyClient {
    pub fn new(http: Client, api_key: ApiKey) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_API_HOST.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Uploads a local file as the raw request body.
    pub async fn compress_from_file(&self, path: &Path) -> Result<RemoteArtifact> {
        let data = tokio::fs::read(path).await?;
        debug!(file = %path.display(), bytes = data.len(), "uploading file");

        let request = self
            .shrink_request()
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data);
        self.send_shrink(request).await
    }

    /// Asks the service to fetch the image from `url` itself.
    pub async fn compress_from_url(&self, url: &str) -> Result<RemoteArtifact> {
        debug!(url, "requesting remote fetch");
        let request = self.shrink_request().json(&json!({ "source": { "url": url } }));
        self.send_shrink(request).await
    }

    fn shrink_request(&self) -> RequestBuilder {
        self.http
            .post(join_url(&self.base_url, SHRINK_PATH))
            .basic_auth(BASIC_AUTH_USER, Some(self.api_key.expose()))
    }

    async fn send_shrink(&self, request: RequestBuilder) -> Result<RemoteArtifact> {
        let response = request
            .send()
            .await
            .map_err(CompressionError::from_transport)?;
        let response = expect_status(response, StatusCode::CREATED).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let shrink: ShrinkResponse = decode_json(response).await?;
        let download_url = location.or(shrink.output.url).ok_or_else(|| {
            CompressionError::MalformedResponse("no download location in response".to_string())
        })?;
        debug!(%download_url, "compressed image available");

        Ok(RemoteArtifact {
            download_url,
            original_size: shrink.input.size,
            compressed_size: shrink.output.size,
            content_type: shrink.output.mime,
        })
    }
}

#[async_trait]
impl CompressionClient for TinifyClient {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn compress(&self, source: &Source) -> Result<RemoteArtifact> {
        match source {
            Source::File(path) => self.compress_from_file(path).await,
            Source::Url(url) => self.compress_from_url(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const AUTH_HEADER: &str = "Basic YXBpOnRlc3Qta2V5";

    fn client_for(server: &MockServer) -> TinifyClient {
        TinifyClient::new(Client::new(), ApiKey::new("test-key")).with_base_url(server.base_url())
    }

    fn shrink_body() -> serde_json::Value {
        json!({
            "input": { "size": 2000, "type": "image/png" },
            "output": { "size": 800, "type": "image/png", "width": 10, "height": 10, "ratio": 0.4 }
        })
    }

    #[tokio::test]
    async fn test_compress_from_file() {
        let server = MockServer::start_async().await;
        let download_url = server.url("/output/abc");
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/shrink")
                .header("authorization", AUTH_HEADER)
                .body("png bytes");
            then.status(201)
                .header("Location", download_url.as_str())
                .json_body(shrink_body());
        });

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.png");
        std::fs::write(&file, b"png bytes").unwrap();

        let client = client_for(&server);
        let artifact = client.compress(&Source::File(file)).await.unwrap();

        mock.assert();
        assert_eq!(
            artifact,
            RemoteArtifact {
                download_url,
                original_size: 2000,
                compressed_size: 800,
                content_type: "image/png".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_compress_from_url_sends_source_envelope() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/shrink")
                .json_body(json!({ "source": { "url": "https://example.com/cat.png" } }));
            then.status(201)
                .header("Location", "https://api.tinify.com/output/xyz")
                .json_body(shrink_body());
        });

        let client = client_for(&server);
        let artifact = client
            .compress(&Source::Url("https://example.com/cat.png".to_string()))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(artifact.download_url, "https://api.tinify.com/output/xyz");
    }

    #[tokio::test]
    async fn test_falls_back_to_output_url() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/shrink");
            then.status(201).json_body(json!({
                "input": { "size": 10, "type": "image/jpeg" },
                "output": { "size": 5, "type": "image/jpeg", "url": "https://api.tinify.com/output/body" }
            }));
        });

        let artifact = client_for(&server)
            .compress_from_url("https://example.com/a.jpg")
            .await
            .unwrap();
        assert_eq!(artifact.download_url, "https://api.tinify.com/output/body");
        assert_eq!(artifact.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_rejected_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/shrink");
            then.status(401).json_body(json!({
                "error": "Unauthorized",
                "message": "Credentials are invalid."
            }));
        });

        let result = client_for(&server).compress_from_url("https://example.com/a.png").await;
        match result {
            Err(CompressionError::RemoteRejected { status, message }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Credentials are invalid.");
            }
            other => panic!("expected RemoteRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_status_other_than_created_is_rejected() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/shrink");
            then.status(200).json_body(shrink_body());
        });

        let result = client_for(&server).compress_from_url("https://example.com/a.png").await;
        assert!(matches!(
            result,
            Err(CompressionError::RemoteRejected { status, .. }) if status == StatusCode::OK
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/shrink");
            then.status(201)
                .header("Location", "https://api.tinify.com/output/x")
                .body("<html>not json</html>");
        });

        let result = client_for(&server).compress_from_url("https://example.com/a.png").await;
        assert!(matches!(result, Err(CompressionError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/shrink");
            then.status(201).delay(Duration::from_secs(2)).json_body(shrink_body());
        });

        let http = Client::builder().timeout(Duration::from_millis(100)).build().unwrap();
        let client = TinifyClient::new(http, ApiKey::new("test-key")).with_base_url(server.base_url());
        let result = client.compress_from_url("https://example.com/a.png").await;
        assert!(matches!(result, Err(CompressionError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let client = TinifyClient::new(Client::new(), ApiKey::new("test-key"))
            .with_base_url("http://127.0.0.1:9");
        let result = client
            .compress(&Source::File("/nonexistent/photo.png".into()))
            .await;
        assert!(matches!(result, Err(CompressionError::Io(_))));
    }
}
