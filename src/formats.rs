//! Type-safe handling of the option values the compression service understands
//!
//! Each enum doubles as a clap value parser and serializes to the exact token
//! the service expects in a download request body.

use crate::constants::{FALLBACK_MIME, SNIFF_LEN};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Metadata the service can copy from the original into the compressed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataTag {
    Copyright,
    Creation,
    /// JPEG only
    Location,
}

/// Target format for server-side conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConvertFormat {
    Avif,
    #[value(name = "webp")]
    WebP,
    Jpeg,
    Png,
    /// Let the service pick the smallest of its supported formats
    #[value(name = "*", alias = "any")]
    Any,
}

impl ConvertFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ConvertFormat::Avif => "image/avif",
            ConvertFormat::WebP => "image/webp",
            ConvertFormat::Jpeg => "image/jpeg",
            ConvertFormat::Png => "image/png",
            ConvertFormat::Any => "*/*",
        }
    }
}

impl fmt::Display for ConvertFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMethod {
    Scale,
    Fit,
    Cover,
    Thumb,
}

/// Where compressed files end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SaveTarget {
    #[default]
    Local,
    #[value(name = "aws_s3")]
    AwsS3,
    Gcs,
}

impl fmt::Display for SaveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveTarget::Local => "local",
            SaveTarget::AwsS3 => "aws_s3",
            SaveTarget::Gcs => "gcs",
        };
        f.write_str(name)
    }
}

/// File suffix for a MIME type: `image/jpeg` maps to `jpg`, everything else to its subtype.
///
/// Returns `None` when the value has no `/` or an empty subtype.
pub fn suffix_from_mime(mime: &str) -> Option<&str> {
    if mime == "image/jpeg" {
        return Some("jpg");
    }
    match mime.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => Some(subtype),
        _ => None,
    }
}

/// Detects an image MIME type from the leading bytes of a file.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LEN)];
    image::guess_format(head)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}
