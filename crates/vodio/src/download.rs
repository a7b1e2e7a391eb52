//! Chunked single-stream downloader.
//!
//! Streams one remote resource into one local file, buffering writes in
//! fixed-size blocks. A failed attempt is retried after a fixed backoff up
//! to the policy's attempt budget; each attempt reopens the destination
//! with truncation, so partial data is overwritten rather than appended.

use std::path::PathBuf;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{BLOCK_SIZE, DownloaderConfig};
use crate::error::DownloadError;
use crate::progress::{EventSink, ProgressEvent, ProgressSample, RateMeter};
use crate::retry::RetryPolicy;

/// One transfer: where to read, where to write, and how many bytes to
/// expect. Built per download from resolved stream metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub dest: PathBuf,
    /// Declared size, `None` when the provider reported 0/unknown. With
    /// no expectation there is no integrity check and no percentage.
    pub expected_size: Option<u64>,
}

impl DownloadTarget {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>, expected_size: u64) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            expected_size: (expected_size > 0).then_some(expected_size),
        }
    }
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub bytes_written: u64,
    /// Attempts that failed before the one that succeeded.
    pub failed_attempts: u32,
}

/// Downloads one URL to one file with retry and progress reporting.
pub struct ChunkedDownloader {
    client: reqwest::Client,
    config: DownloaderConfig,
}

impl ChunkedDownloader {
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Runs the transfer to completion, retrying failed attempts.
    ///
    /// Retryable failures (network, HTTP status, I/O, size mismatch)
    /// consume one attempt each; after the fixed backoff the next attempt
    /// starts from byte zero. When the budget is spent the last error is
    /// wrapped in [`DownloadError::RetriesExhausted`]. Whatever partial
    /// file the final attempt left behind stays on disk; cleanup belongs
    /// to the caller.
    pub async fn download(
        &self,
        target: &DownloadTarget,
        title: &str,
        policy: &RetryPolicy,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<DownloadStats, DownloadError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempts: u32 = 0;

        loop {
            if token.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            let retry_index = attempts;
            attempts += 1;

            match self.run_attempt(target, retry_index, sink, token).await {
                Ok(bytes_written) => {
                    return Ok(DownloadStats {
                        bytes_written,
                        failed_attempts: attempts - 1,
                    });
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    if attempts >= max_attempts {
                        return Err(DownloadError::RetriesExhausted {
                            attempts,
                            source: Box::new(err),
                        });
                    }
                    warn!(
                        "attempt {attempts}/{max_attempts} for `{title}` failed: {err}, retrying in {:?}",
                        policy.backoff
                    );
                    sink.emit(ProgressEvent::ItemRetrying {
                        title: title.to_string(),
                        retry_count: attempts,
                        error: err.to_string(),
                    });
                    sink.emit(ProgressEvent::Progress {
                        sample: ProgressSample::retry_marker(target.expected_size, attempts),
                    });
                    tokio::select! {
                        _ = token.cancelled() => return Err(DownloadError::Cancelled),
                        _ = tokio::time::sleep(policy.backoff) => {}
                    }
                }
            }
        }
    }

    /// One attempt: GET, stream chunks into a block-buffered writer,
    /// then verify the byte count against the expected size.
    async fn run_attempt(
        &self,
        target: &DownloadTarget,
        retry_index: u32,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        debug!("GET {} (attempt {})", target.url, retry_index + 1);
        let response = self.client.get(&target.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(status, target.url.clone()));
        }

        // Opened only after the status check, so a rejected request never
        // creates the destination. Truncates leftovers from prior attempts.
        let file = File::create(&target.dest).await?;
        let mut writer = BufWriter::with_capacity(BLOCK_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut meter = RateMeter::new(self.config.progress_interval);
        let mut downloaded: u64 = 0;

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => return Err(DownloadError::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk?;
            downloaded += chunk.len() as u64;
            writer.write_all(&chunk).await?;
            if let Some(rate) = meter.sample(downloaded) {
                sink.emit(ProgressEvent::Progress {
                    sample: ProgressSample::new(
                        downloaded,
                        target.expected_size,
                        rate,
                        retry_index,
                    ),
                });
            }
        }
        writer.flush().await?;

        if let Some(expected) = target.expected_size
            && downloaded != expected
        {
            return Err(DownloadError::SizeMismatch {
                expected,
                actual: downloaded,
            });
        }
        Ok(downloaded)
    }
}
