//! Shared helpers for the crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::progress::{EventSink, ProgressEvent, ProgressSample};
use crate::resolve::{MediaResolver, ResolveError, StreamSource, VideoMeta};

/// Sink that stores every event for later assertions.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingSink {
    pub fn retry_events(&self) -> Vec<u32> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::ItemRetrying { retry_count, .. } => Some(*retry_count),
                _ => None,
            })
            .collect()
    }

    pub fn progress_samples(&self) -> Vec<ProgressSample> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Progress { sample } => Some(sample.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn completed_titles(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::ItemCompleted { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failed_titles(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::ItemFailed { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}

/// Canned resolver with per-part stream fixtures and optional failures.
/// Records every `resolve_stream` call for assertions on forwarding.
pub(crate) struct StubResolver {
    meta: VideoMeta,
    streams: HashMap<u64, StreamSource>,
    fail_parts: HashSet<u64>,
    pub calls: Arc<Mutex<Vec<(u64, u32)>>>,
}

impl StubResolver {
    pub fn new(meta: VideoMeta) -> Self {
        Self {
            meta,
            streams: HashMap::new(),
            fail_parts: HashSet::new(),
            calls: Arc::default(),
        }
    }

    pub fn with_stream(mut self, part_id: u64, source: StreamSource) -> Self {
        self.streams.insert(part_id, source);
        self
    }

    pub fn with_failing_part(mut self, part_id: u64) -> Self {
        self.fail_parts.insert(part_id);
        self
    }
}

#[async_trait]
impl MediaResolver for StubResolver {
    async fn resolve_video(&self, _id: &str) -> Result<VideoMeta, ResolveError> {
        Ok(self.meta.clone())
    }

    async fn resolve_stream(
        &self,
        _id: &str,
        part_id: u64,
        quality: u32,
    ) -> Result<StreamSource, ResolveError> {
        self.calls.lock().push((part_id, quality));
        if self.fail_parts.contains(&part_id) {
            return Err(ResolveError::api(-404, "stream unavailable"));
        }
        self.streams
            .get(&part_id)
            .cloned()
            .ok_or(ResolveError::MissingData { field: "durl" })
    }
}
