//! Per-item lifecycle tracking and aggregate results for collections.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::filename::item_path;
use crate::resolve::VideoPart;

/// Lifecycle of one collection item.
///
/// `Pending → Downloading → (Completed | Failed)`, with `Retrying`
/// looping back to `Downloading` until the attempt budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Downloading,
    Retrying,
    Completed,
    Failed,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Downloading)
                | (Self::Downloading, Self::Retrying)
                | (Self::Downloading, Self::Completed)
                | (Self::Downloading, Self::Failed)
                | (Self::Retrying, Self::Downloading)
                | (Self::Retrying, Self::Failed)
        )
    }

    pub fn advance(self, next: Self) -> Self {
        debug_assert!(
            self.can_transition_to(next),
            "invalid item transition {self:?} -> {next:?}"
        );
        next
    }
}

/// One entry of a collection with its resolved destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionItem {
    pub ordinal: u32,
    pub title: String,
    pub part_id: u64,
    pub dest: PathBuf,
}

impl CollectionItem {
    /// `ordinal` is the 1-based position of `part` in the collection.
    /// Destinations are numbered by position, so repeated titles keep
    /// distinct paths.
    pub fn from_part(ordinal: u32, part: &VideoPart, dir: &Path) -> Self {
        Self {
            ordinal,
            title: part.title.clone(),
            part_id: part.part_id,
            dest: item_path(dir, ordinal, &part.title),
        }
    }
}

/// Aggregate outcome of a collection run. Always covers every item; a
/// failed item lands in `failed` while the loop carries on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionResult {
    pub success: usize,
    /// Titles of failed items, in collection order.
    pub failed: Vec<String>,
    /// Failed attempts consumed per item title; items that needed no
    /// retry are absent.
    pub retry_info: BTreeMap<String, u32>,
}

impl CollectionResult {
    pub fn record_success(&mut self, title: &str, failed_attempts: u32) {
        self.success += 1;
        self.note_retries(title, failed_attempts);
    }

    pub fn record_failure(&mut self, title: &str, failed_attempts: u32) {
        self.failed.push(title.to_string());
        self.note_retries(title, failed_attempts);
    }

    fn note_retries(&mut self, title: &str, failed_attempts: u32) {
        if failed_attempts > 0 {
            self.retry_info.insert(title.to_string(), failed_attempts);
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
