pub mod batch;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod download;
pub mod error;
pub mod formats;
pub mod logger;
pub mod resolver;
pub mod utils;

pub use batch::{BatchReport, BatchRunner, CompressionJob, JobOutcome, JobStatus};
pub use client::{CompressionClient, RemoteArtifact, TinifyClient, WebClient};
pub use config::{build_http_client, resolve_api_key, ApiKey, ClientSettings};
pub use download::{derive_output_path, DownloadOptions, DownloadPolicy, ResizeOptions};
pub use error::{CompressionError, Result};
pub use resolver::{enumerate_files, is_url, matches_extension, resolve_input, ResolvedInput, Source};
