//! Bilibili web API client implementing the engine's resolver seam.
//!
//! Covers the VOD endpoints only: `view` for video metadata and
//! `playurl` for the legacy `durl` stream form. No login, no WBI
//! signing; only what anonymous playback needs.

mod client;
mod models;
mod quality;

use std::sync::LazyLock;

use regex::Regex;
use vodio_engine::ResolveError;

pub use client::{BASE_URL, BiliClient};
pub use quality::Quality;

static BV_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"BV\w{10}").unwrap());

/// Extracts the `BV` identifier from a video URL or a bare id.
pub fn extract_bvid(input: &str) -> Result<&str, ResolveError> {
    BV_REGEX
        .find(input)
        .map(|m| m.as_str())
        .ok_or_else(|| ResolveError::invalid_reference(input, "no BV id found"))
}
