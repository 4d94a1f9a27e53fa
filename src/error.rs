use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("TinyPNG API key not set: pass --api-key or set TINYPNG_API_KEY")]
    MissingApiKey,

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Failed to enumerate {root}: {source}")]
    Enumeration {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Save target '{0}' is not implemented, only 'local' is supported")]
    UnsupportedSaveTarget(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Remote service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Remote service rejected the request: {status}{}", format_message(.message))]
    RemoteRejected { status: StatusCode, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Job aborted: {0}")]
    JobAborted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_message(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(" ({message})")
    }
}

impl CompressionError {
    /// Classifies a transport-level failure. Body decode failures count as malformed responses,
    /// everything else (connect, timeout, reset) as unreachable.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CompressionError::MalformedResponse(err.to_string())
        } else {
            CompressionError::Unreachable(err)
        }
    }

    /// True for errors that abort the whole run rather than a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompressionError::MissingApiKey
                | CompressionError::PathNotFound(_)
                | CompressionError::Enumeration { .. }
                | CompressionError::UnsupportedSaveTarget(_)
                | CompressionError::HttpClient(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_rejected_display() {
        let err = CompressionError::RemoteRejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "File type is not supported".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote service rejected the request: 415 Unsupported Media Type (File type is not supported)"
        );

        let err = CompressionError::RemoteRejected {
            status: StatusCode::UNAUTHORIZED,
            message: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Remote service rejected the request: 401 Unauthorized"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(CompressionError::MissingApiKey.is_fatal());
        assert!(CompressionError::PathNotFound(PathBuf::from("x")).is_fatal());
        assert!(!CompressionError::MalformedResponse("bad".into()).is_fatal());
        assert!(!CompressionError::Io(std::io::Error::other("disk full")).is_fatal());
        assert!(!CompressionError::JobAborted("panicked".into()).is_fatal());
    }
}
