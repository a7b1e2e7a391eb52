use reqwest::StatusCode;

use crate::resolve::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download cancelled")]
    Cancelled,

    #[error("metadata resolution failed: {source}")]
    Resolve {
        #[from]
        source: ResolveError,
    },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("size mismatch: expected {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("transfer failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<DownloadError>,
    },

    #[error(
        "cannot create `{path}`: {source} (check for illegal characters in the name, missing write permission, or an over-long path)"
    )]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn filesystem(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether another attempt at the same transfer may succeed.
    ///
    /// Everything that can happen inside one attempt retries; resolution,
    /// directory-level failures, and cancellation do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Cancelled
            | Self::Resolve { .. }
            | Self::RetriesExhausted { .. }
            | Self::Filesystem { .. } => false,
            Self::Network { .. }
            | Self::HttpStatus { .. }
            | Self::Io { .. }
            | Self::SizeMismatch { .. } => true,
        }
    }
}
