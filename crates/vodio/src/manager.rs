//! Orchestration: resolve metadata, lay out destination paths, and run
//! single or collection downloads with per-item failure containment.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collection::{CollectionItem, CollectionResult, ItemState};
use crate::config::DownloaderConfig;
use crate::download::{ChunkedDownloader, DownloadStats, DownloadTarget};
use crate::error::DownloadError;
use crate::filename::{sanitize_title, video_file_name};
use crate::progress::{EventSink, ProgressEvent};
use crate::resolve::{MediaResolver, ResolveError, VideoMeta};
use crate::retry::RetryPolicy;

pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Root directory for downloads; collections get a subdirectory
    /// named after the sanitized collection title.
    pub download_dir: PathBuf,
    /// Provider-defined quality selector, forwarded opaquely to the
    /// resolver.
    pub quality: u32,
    pub retry: RetryPolicy,
    pub downloader: DownloaderConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            quality: 80,
            retry: RetryPolicy::default(),
            downloader: DownloaderConfig::default(),
        }
    }
}

/// What a top-level download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Standalone video, downloaded to this path.
    Single(PathBuf),
    /// Multi-part collection with its aggregate result.
    Collection(CollectionResult),
}

/// Drives a [`MediaResolver`] and a [`ChunkedDownloader`] to turn one
/// video reference into files on disk.
pub struct DownloadManager<R: MediaResolver> {
    resolver: R,
    downloader: ChunkedDownloader,
    config: ManagerConfig,
}

impl<R: MediaResolver> DownloadManager<R> {
    pub fn new(resolver: R, config: ManagerConfig) -> Result<Self, DownloadError> {
        let downloader = ChunkedDownloader::new(config.downloader.clone())?;
        Ok(Self {
            resolver,
            downloader,
            config,
        })
    }

    pub async fn fetch_meta(&self, id: &str) -> Result<VideoMeta, ResolveError> {
        self.resolver.resolve_video(id).await
    }

    /// Downloads a resolved video: a standalone video goes straight to
    /// `<dir>/<title>.mp4`, a collection into its own subdirectory.
    pub async fn download_video(
        &self,
        id: &str,
        meta: &VideoMeta,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<DownloadOutcome, DownloadError> {
        if meta.is_collection() {
            let dir = self.config.download_dir.join(sanitize_title(&meta.title));
            ensure_dir(&dir).await?;
            let result = self.download_collection(id, meta, &dir, sink, token).await?;
            Ok(DownloadOutcome::Collection(result))
        } else {
            let part = meta
                .parts
                .first()
                .ok_or(ResolveError::MissingData { field: "parts" })?;
            ensure_dir(&self.config.download_dir).await?;
            let dest = self.config.download_dir.join(video_file_name(&meta.title));
            self.download_item(id, part.part_id, &meta.title, &dest, sink, token)
                .await?;
            Ok(DownloadOutcome::Single(dest))
        }
    }

    /// Downloads only the first part of a collection into the root
    /// download directory, named after that part.
    pub async fn download_first_part(
        &self,
        id: &str,
        meta: &VideoMeta,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let part = meta
            .parts
            .first()
            .ok_or(ResolveError::MissingData { field: "parts" })?;
        ensure_dir(&self.config.download_dir).await?;
        let dest = self.config.download_dir.join(video_file_name(&part.title));
        self.download_item(id, part.part_id, &part.title, &dest, sink, token)
            .await?;
        Ok(dest)
    }

    /// Downloads one resolved part to `dest`. On any failure the partial
    /// file is removed before the error propagates; removal itself is
    /// best-effort and never masks the download error.
    pub async fn download_item(
        &self,
        id: &str,
        part_id: u64,
        title: &str,
        dest: &Path,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<DownloadStats, DownloadError> {
        sink.emit(ProgressEvent::ItemStarted {
            title: title.to_string(),
            path: dest.to_path_buf(),
        });

        match self
            .resolve_and_transfer(id, part_id, title, dest, sink, token)
            .await
        {
            Ok(stats) => {
                info!("downloaded `{title}` ({} bytes)", stats.bytes_written);
                sink.emit(ProgressEvent::ItemCompleted {
                    title: title.to_string(),
                    path: dest.to_path_buf(),
                });
                Ok(stats)
            }
            Err(err) => {
                remove_partial(dest).await;
                sink.emit(ProgressEvent::ItemFailed {
                    title: title.to_string(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn resolve_and_transfer(
        &self,
        id: &str,
        part_id: u64,
        title: &str,
        dest: &Path,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<DownloadStats, DownloadError> {
        let source = self
            .resolver
            .resolve_stream(id, part_id, self.config.quality)
            .await?;
        let target = DownloadTarget::new(source.url, dest, source.size);
        self.downloader
            .download(&target, title, &self.config.retry, sink, token)
            .await
    }

    /// Runs every item of a collection in order, numbering destinations
    /// by 1-based position. A failed item is recorded and the loop moves
    /// on; only cancellation aborts early.
    pub async fn download_collection(
        &self,
        id: &str,
        meta: &VideoMeta,
        dir: &Path,
        sink: &dyn EventSink,
        token: &CancellationToken,
    ) -> Result<CollectionResult, DownloadError> {
        let total = meta.parts.len();
        let mut result = CollectionResult::default();

        for (index, part) in meta.parts.iter().enumerate() {
            if token.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            // Items are numbered by position, never by provider metadata.
            let item = CollectionItem::from_part(index as u32 + 1, part, dir);
            sink.emit(ProgressEvent::Status {
                message: format!("downloading ({}/{}): {}", index + 1, total, item.title),
            });

            let state = match self
                .download_item(id, item.part_id, &item.title, &item.dest, sink, token)
                .await
            {
                Ok(stats) => {
                    result.record_success(&item.title, stats.failed_attempts);
                    ItemState::Completed
                }
                Err(DownloadError::Cancelled) => return Err(DownloadError::Cancelled),
                Err(DownloadError::RetriesExhausted { attempts, source }) => {
                    warn!(
                        "`{}` failed after {attempts} attempts: {source}",
                        item.title
                    );
                    result.record_failure(&item.title, attempts);
                    ItemState::Failed
                }
                Err(err) => {
                    warn!("`{}` failed: {err}", item.title);
                    result.record_failure(&item.title, 0);
                    ItemState::Failed
                }
            };
            debug!("item {}/{total} finished in state {state:?}", index + 1);
        }

        sink.emit(ProgressEvent::Status {
            message: format!("finished: {} of {total} items downloaded", result.success),
        });
        info!(
            "collection done: {} ok, {} failed",
            result.success,
            result.failed.len()
        );
        Ok(result)
    }
}

/// Best-effort removal of a partial download. A failure to remove is
/// logged and swallowed, never compounded into the reported error.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("removed partial file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove partial file {}: {e}", path.display()),
    }
}

async fn ensure_dir(path: &Path) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| DownloadError::filesystem(path, e))
}
