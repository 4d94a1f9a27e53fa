use crate::constants::{DEFAULT_EXTENSIONS, DEFAULT_MAX_UPLOAD, DEFAULT_TIMEOUT_SECS};
use crate::download::{DownloadOptions, ResizeOptions};
use crate::formats::{ConvertFormat, MetadataTag, ResizeMethod, SaveTarget};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tinypng",
    about = "A tiny CLI for TinyPNG",
    long_about = "Compress images with the TinyPNG service. \
                  Official API documentation: https://tinypng.com/developers/reference. \
                  The compress command needs an API key (https://tinify.com/developers), \
                  passed with --api-key or the TINYPNG_API_KEY environment variable.",
    version,
    after_help = "EXAMPLES:\n  \
    tinypng compress photo.png\n  \
    tinypng compress ./images --recursive --output ./compressed --max-upload 8\n  \
    tinypng compress https://example.com/cat.jpg --convert-to webp --convert-bg white\n  \
    tinypng web-compress ./images --extensions png,jpg"
)]
pub struct Args {
    #[arg(
        short = 'k',
        long,
        global = true,
        help = "TinyPNG API key",
        long_help = "TinyPNG API key. Takes precedence over the TINYPNG_API_KEY environment variable."
    )]
    pub api_key: Option<String>,

    #[arg(short = 'd', long, global = true, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        help = "Only print errors",
        long_help = "Suppress progress output and summaries; per-file errors are still reported."
    )]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Per-request timeout in seconds"
    )]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Compress images",
        long_about = "Compress a file, every matching file in a directory, or a remote image URL \
                      with the TinyPNG developer API. Optionally preserve metadata, convert, \
                      or resize on the server while downloading."
    )]
    Compress {
        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        download: DownloadArgs,
    },

    #[command(
        about = "Compress images using the web page API",
        long_about = "Compress a file or every matching file in a directory through the backend \
                      of the tinypng.com upload page. No API key required; URLs are not supported."
    )]
    WebCompress {
        #[command(flatten)]
        batch: BatchArgs,
    },

    #[command(
        about = "Generate a shell completion script",
        long_about = "Print a completion script for the given shell to stdout. \
                      It completes subcommands, flags, and the accepted values of \
                      --save-to, --metadata, --convert-to, and --resize-method.",
        after_help = "EXAMPLES:\n  \
        tinypng completion bash > /etc/bash_completion.d/tinypng\n  \
        tinypng completion zsh > \"${fpath[1]}/_tinypng\""
    )]
    Completion {
        #[arg(value_enum, help = "Target shell")]
        shell: Shell,
    },
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

/// Options shared by both compress commands
#[derive(clap::Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(help = "File, directory, or URL to compress")]
    pub path: String,

    #[arg(
        long,
        help = "Directory for compressed files",
        long_help = "Directory for compressed files. Created if missing. \
                     Without it, each compressed file is written beside its original."
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_UPLOAD as u16,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Max upload parallelism",
        long_help = "Number of files uploaded concurrently. Only used for directories; \
                     be aware of your upload bandwidth."
    )]
    pub max_upload: u16,

    #[arg(long, help = "Read files from subdirectories too (directories only)")]
    pub recursive: bool,

    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = default_extensions(),
        help = "File name suffix filter (directories only)",
        long_help = "Comma-separated suffixes a file name must end with, compared case-insensitively. \
                     Only used for directories; files named directly are always sent."
    )]
    pub extensions: Vec<String>,
}

/// Server-side post-processing applied while downloading
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DownloadArgs {
    #[arg(long, value_enum, default_value_t = SaveTarget::Local, help = "Where to save compressed files")]
    pub save_to: SaveTarget,

    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        help = "Metadata to copy into the compressed file",
        long_help = "Comma-separated metadata to copy into the compressed file. \
                     location is JPEG only."
    )]
    pub metadata: Vec<MetadataTag>,

    #[arg(long, value_enum, help = "Convert to a specific type; * lets the service choose")]
    pub convert_to: Option<ConvertFormat>,

    #[arg(
        long,
        requires = "convert_to",
        help = "Background color for conversion: hex value, white, or black"
    )]
    pub convert_bg: Option<String>,

    #[arg(
        long,
        value_enum,
        help = "Resize method",
        long_help = "Resize method. See https://tinypng.com/developers/reference#resizing-images"
    )]
    pub resize_method: Option<ResizeMethod>,

    #[arg(long, requires = "resize_method", help = "Resize width in pixels")]
    pub resize_width: Option<u32>,

    #[arg(long, requires = "resize_method", help = "Resize height in pixels")]
    pub resize_height: Option<u32>,
}

impl DownloadArgs {
    pub fn to_options(&self) -> DownloadOptions {
        DownloadOptions {
            metadata: self.metadata.clone(),
            convert: self.convert_to,
            background: self.convert_bg.clone(),
            resize: self.resize_method.map(|method| ResizeOptions {
                method,
                width: self.resize_width.unwrap_or(0),
                height: self.resize_height.unwrap_or(0),
            }),
        }
    }
}

impl BatchArgs {
    pub fn workers(&self) -> usize {
        usize::from(self.max_upload)
    }
}
