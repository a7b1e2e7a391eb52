use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use tracing::debug;

use crate::error::DownloadError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Bytes buffered before each write to the destination file.
pub const BLOCK_SIZE: usize = 1024 * 1024;

/// Configurable options for the downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Read timeout (maximum time between receiving data chunks)
    pub read_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Referer header sent with every request; some CDNs reject
    /// requests without one.
    pub referer: Option<String>,

    /// Minimum time between two progress samples for the same attempt.
    pub progress_interval: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            referer: None,
            progress_interval: Duration::from_millis(500),
        }
    }
}

impl DownloaderConfig {
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, DownloadError> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = &self.referer {
            match HeaderValue::from_str(referer) {
                Ok(value) => {
                    headers.insert(REFERER, value);
                }
                Err(e) => {
                    debug!("skipping invalid referer value: {e}");
                }
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .build()?;
        Ok(client)
    }
}
