//! Metadata resolution seam.
//!
//! The download engine never speaks a provider protocol itself; it asks a
//! [`MediaResolver`] for video metadata and playable stream URLs and treats
//! both as opaque. Provider crates implement the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of a multi-part collection. Parts are ordered; an item's
/// 1-based position within [`VideoMeta::parts`] is its ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPart {
    pub title: String,
    /// Provider-side identifier for this part's stream.
    pub part_id: u64,
}

/// Resolved metadata for one video reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub title: String,
    pub parts: Vec<VideoPart>,
}

impl VideoMeta {
    pub fn is_collection(&self) -> bool {
        self.parts.len() > 1
    }
}

/// A playable stream location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    pub url: String,
    /// Declared size in bytes; 0 when the provider does not report one.
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid video reference `{input}`: {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("response missing expected field `{field}`")]
    MissingData { field: &'static str },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolveError {
    pub fn invalid_reference(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }
}

/// Provider abstraction consulted by the download manager.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolves a canonical video identifier to its title and part list.
    /// A standalone video resolves to exactly one part.
    async fn resolve_video(&self, id: &str) -> Result<VideoMeta, ResolveError>;

    /// Resolves the playable stream for one part at the requested
    /// quality. The quality value is provider-defined and passed through
    /// opaquely.
    async fn resolve_stream(
        &self,
        id: &str,
        part_id: u64,
        quality: u32,
    ) -> Result<StreamSource, ResolveError>;
}
