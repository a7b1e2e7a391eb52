//! Response models for the Bilibili web API. Only the fields the
//! resolver reads are mapped; everything else is ignored.

use serde::Deserialize;

/// Standard envelope: `code` is 0 on success, anything else is an
/// error with `message` explaining it.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// `/x/web-interface/view` payload.
#[derive(Debug, Deserialize)]
pub(crate) struct ViewData {
    pub title: String,
    /// Number of parts; > 1 means the video is a collection.
    pub videos: u32,
    #[serde(default)]
    pub pages: Vec<PageInfo>,
    /// Top-level cid, present for standalone videos.
    pub cid: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    pub cid: u64,
    /// Part title.
    pub part: String,
}

/// `/x/player/playurl` payload in the legacy `durl` form.
#[derive(Debug, Deserialize)]
pub(crate) struct PlayData {
    #[serde(default)]
    pub durl: Vec<DurlEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DurlEntry {
    pub url: String,
    #[serde(default)]
    pub size: u64,
}
