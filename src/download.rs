use crate::client::{expect_status, RemoteArtifact};
use crate::config::ApiKey;
use crate::constants::{BASIC_AUTH_USER, COMPRESSED_SUFFIX, FALLBACK_STEM};
use crate::error::{CompressionError, Result};
use crate::formats::{suffix_from_mime, ConvertFormat, MetadataTag, ResizeMethod};
use crate::resolver::Source;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub method: ResizeMethod,
    /// Zero leaves the dimension to the service
    pub width: u32,
    pub height: u32,
}

/// Post-processing requested for every file of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    pub metadata: Vec<MetadataTag>,
    pub convert: Option<ConvertFormat>,
    /// Background fill for conversions that drop transparency
    pub background: Option<String>,
    pub resize: Option<ResizeOptions>,
}

#[derive(Debug, Serialize)]
pub struct ConvertSpec {
    #[serde(rename = "type")]
    pub mime: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TransformSpec<'a> {
    pub background: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResizeSpec {
    pub method: ResizeMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// JSON body of a download that asks the service for extra work.
#[derive(Debug, Serialize)]
pub struct DownloadRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve: Option<&'a [MetadataTag]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSpec<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeSpec>,
}

impl DownloadOptions {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.convert.is_none() && self.resize.is_none()
    }

    /// Request body for these options, or `None` when a plain download will do.
    ///
    /// Each category is independent; all the requested ones travel in the same body.
    pub fn request_body(&self) -> Option<DownloadRequest<'_>> {
        if self.is_empty() {
            return None;
        }

        let preserve = (!self.metadata.is_empty()).then_some(self.metadata.as_slice());
        let convert = self.convert.map(|format| ConvertSpec {
            mime: format.mime_type(),
        });
        let transform = self
            .convert
            .and(self.background.as_deref())
            .filter(|background| !background.is_empty())
            .map(|background| TransformSpec { background });
        let resize = self.resize.map(|resize| ResizeSpec {
            method: resize.method,
            width: (resize.width > 0).then_some(resize.width),
            height: (resize.height > 0).then_some(resize.height),
        });

        Some(DownloadRequest {
            preserve,
            convert,
            transform,
            resize,
        })
    }
}

/// Output location for a compressed file.
///
/// The name is the source stem, `-compressed.`, and a suffix taken from the compressed MIME type.
/// Without `output_dir` the file lands next to a local source, or in the current directory for a
/// URL source.
pub fn derive_output_path(
    source: &Source,
    content_type: &str,
    output_dir: Option<&Path>,
) -> Result<PathBuf> {
    let suffix = suffix_from_mime(content_type).ok_or_else(|| {
        CompressionError::MalformedResponse(format!("unrecognized content type '{}'", content_type))
    })?;

    let path = match source {
        Source::File(path) => {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| FALLBACK_STEM.to_string());
            let name = format!("{}{}{}", stem, COMPRESSED_SUFFIX, suffix);
            match output_dir {
                Some(dir) => dir.join(name),
                None => path.with_file_name(name),
            }
        }
        Source::Url(raw) => {
            let name = format!("{}{}{}", url_stem(raw), COMPRESSED_SUFFIX, suffix);
            match output_dir {
                Some(dir) => dir.join(name),
                None => PathBuf::from(name),
            }
        }
    };

    Ok(path)
}

fn url_stem(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|url| {
            let segment = url.path_segments()?.next_back()?.to_string();
            Path::new(&segment)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

/// Decides how a compressed artifact is fetched and writes it to disk.
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    http: Client,
    api_key: Option<ApiKey>,
    options: DownloadOptions,
}

impl DownloadPolicy {
    pub fn new(http: Client, api_key: Option<ApiKey>, options: DownloadOptions) -> Self {
        Self {
            http,
            api_key,
            options,
        }
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    pub fn resolve(
        &self,
        source: &Source,
        artifact: &RemoteArtifact,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        derive_output_path(source, &artifact.content_type, output_dir)
    }

    /// Downloads the artifact into `dest` and returns the number of bytes written.
    ///
    /// Bytes go to a temporary file next to `dest` that replaces it only once the body is
    /// complete; on any failure the temporary file is removed and `dest` is left untouched.
    pub async fn materialize(&self, artifact: &RemoteArtifact, dest: &Path) -> Result<u64> {
        let request = match self.options.request_body() {
            None => self.http.get(&artifact.download_url),
            Some(body) => {
                let request = self.http.post(&artifact.download_url).json(&body);
                match &self.api_key {
                    Some(key) => request.basic_auth(BASIC_AUTH_USER, Some(key.expose())),
                    None => request,
                }
            }
        };
        debug!(url = %artifact.download_url, dest = %dest.display(), "downloading");

        let response = request
            .send()
            .await
            .map_err(CompressionError::from_transport)?;
        let mut response = expect_status(response, StatusCode::OK).await?;

        let parent = dest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".tinypng-")
            .suffix(".part")
            .tempfile_in(parent)?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(CompressionError::from_transport)?
        {
            temp.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        temp.flush()?;

        // Temporary files are created owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }

        // Two sources can map to one name, e.g. `a/x.png` and `b/x.png` under one `--output`.
        if dest.exists() {
            warn!(dest = %dest.display(), "overwriting existing file");
        }
        temp.persist(dest).map_err(|e| CompressionError::Io(e.error))?;
        Ok(written)
    }
}
