//! VOD download engine: chunked single-stream transfers with retry and
//! progress telemetry, plus collection orchestration with per-item
//! failure containment. Provider protocols live behind the
//! [`MediaResolver`] seam in companion crates.

pub mod collection;
pub mod config;
pub mod download;
pub mod error;
pub mod filename;
pub mod manager;
pub mod progress;
pub mod resolve;
pub mod retry;

#[cfg(test)]
mod test_util;

pub use collection::{CollectionItem, CollectionResult, ItemState};
pub use config::{BLOCK_SIZE, DEFAULT_USER_AGENT, DownloaderConfig};
pub use download::{ChunkedDownloader, DownloadStats, DownloadTarget};
pub use error::DownloadError;
pub use filename::{item_path, sanitize_title, video_file_name};
pub use manager::{DEFAULT_DOWNLOAD_DIR, DownloadManager, DownloadOutcome, ManagerConfig};
pub use progress::{EventSink, NullSink, ProgressEvent, ProgressSample};
pub use resolve::{MediaResolver, ResolveError, StreamSource, VideoMeta, VideoPart};
pub use retry::RetryPolicy;
