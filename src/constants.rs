pub const DEFAULT_API_HOST: &str = "https://api.tinify.com";
pub const DEFAULT_WEB_HOST: &str = "https://tinypng.com";

pub const SHRINK_PATH: &str = "/shrink";
pub const WEB_STORE_PATH: &str = "/backend/opt/store";
pub const WEB_PROCESS_PATH: &str = "/backend/opt/process";

pub const API_KEY_ENV: &str = "TINYPNG_API_KEY";
pub const BASIC_AUTH_USER: &str = "api";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_UPLOAD: usize = 4;
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Inserted between the original stem and the new extension.
pub const COMPRESSED_SUFFIX: &str = "-compressed.";

/// Number of leading bytes inspected when sniffing a file's MIME type.
pub const SNIFF_LEN: usize = 512;
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Used when a URL path has no usable file name.
pub const FALLBACK_STEM: &str = "image";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

pub const USER_AGENT: &str = concat!("tinypng-cli/", env!("CARGO_PKG_VERSION"));
