//! Chunked chapter segmentation.
//!
//! Runs in two passes: [`Segmenter::collect`] asks the inference service for
//! each chunk and tags what comes back with the chunk index, then a
//! [`MergePolicy`] turns the tagged boundaries into one ordered list. A chunk
//! whose call fails contributes nothing; the rest of the run carries on.

pub mod chunking;
pub mod inference;
pub mod merge;

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::{
    config::SegmenterSettings,
    transcript::{canonicalize, is_canonical, render_for_inference},
    types::{ChapterBoundary, TaggedBoundary, TranscriptLine},
};

pub use chunking::{Chunk, DEFAULT_CHUNK_SIZE, split_into_chunks};
pub use inference::{
    BoundaryInference, ChunkRequest, ChunkResponse, InferenceError, LlmBoundaryInference,
};
pub use merge::MergePolicy;

/// Everything the first pass gathered, in chunk order.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub boundaries: Vec<TaggedBoundary>,
    pub summaries: Vec<String>,
    pub failed_chunks: Vec<usize>,
}

/// Result of a full segmentation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Segmentation {
    pub boundaries: Vec<ChapterBoundary>,
    pub summaries: Vec<String>,
    pub failed_chunks: Vec<usize>,
}

pub struct Segmenter {
    inference: Arc<dyn BoundaryInference>,
    chunk_size: usize,
    max_concurrent_chunks: usize,
    max_retries: u32,
    retry_backoff: Duration,
    merge_policy: MergePolicy,
}

impl Segmenter {
    pub fn new(inference: Arc<dyn BoundaryInference>) -> Self {
        Self::with_settings(inference, &SegmenterSettings::default())
    }

    pub fn with_settings(inference: Arc<dyn BoundaryInference>, settings: &SegmenterSettings) -> Self {
        Self {
            inference,
            chunk_size: settings.chunk_size.max(1),
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
            max_retries: settings.max_retries,
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
            merge_policy: settings.merge_policy,
        }
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    pub async fn segment(&self, lines: &[TranscriptLine]) -> Segmentation {
        let collected = self.collect(lines).await;
        let boundaries = self.merge_policy.merge(collected.boundaries);

        info!(
            chapters = boundaries.len(),
            failed_chunks = collected.failed_chunks.len(),
            policy = ?self.merge_policy,
            "merged chapter boundaries"
        );

        Segmentation {
            boundaries,
            summaries: collected.summaries,
            failed_chunks: collected.failed_chunks,
        }
    }

    /// First pass: one task per chunk, at most `max_concurrent_chunks` in flight,
    /// all joined before anything is merged.
    pub async fn collect(&self, lines: &[TranscriptLine]) -> Collected {
        let chunks = split_into_chunks(lines, self.chunk_size);
        let total = chunks.len();
        let permits = Arc::new(Semaphore::new(self.max_concurrent_chunks));

        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let request = chunk_request(&chunk, total);
                let inference = Arc::clone(&self.inference);
                let permits = Arc::clone(&permits);
                let max_retries = self.max_retries;
                let backoff = self.retry_backoff;

                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    infer_with_retries(inference.as_ref(), &request, max_retries, backoff).await
                })
            })
            .collect();

        let mut collected = Collected::default();
        for (index, handle) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(chunk = index + 1, total, error = %e, "chunk task aborted");
                    collected.failed_chunks.push(index);
                    continue;
                }
            };

            match outcome {
                Ok(response) => {
                    info!(
                        chunk = index + 1,
                        total,
                        chapters = response.chapters.len(),
                        "chunk segmented"
                    );
                    if let Some(summary) = response.summary.filter(|s| !s.trim().is_empty()) {
                        collected.summaries.push(summary);
                    }
                    collected.boundaries.extend(
                        response
                            .chapters
                            .into_iter()
                            .filter_map(enforce_fixed_width)
                            .map(|boundary| TaggedBoundary {
                                chunk_index: index,
                                boundary,
                            }),
                    );
                }
                Err(e) => {
                    warn!(chunk = index + 1, total, error = %e, "error processing chunk");
                    collected.failed_chunks.push(index);
                }
            }
        }

        collected
    }
}

fn chunk_request(chunk: &Chunk, total: usize) -> ChunkRequest {
    ChunkRequest {
        index: chunk.index,
        total,
        rendered: render_for_inference(&chunk.lines),
        first_start: chunk.first_start().unwrap_or_default().to_string(),
        last_start: chunk.last_start().unwrap_or_default().to_string(),
    }
}

async fn infer_with_retries(
    inference: &dyn BoundaryInference,
    request: &ChunkRequest,
    max_retries: u32,
    backoff: Duration,
) -> Result<ChunkResponse, InferenceError> {
    let mut attempt = 0;
    loop {
        match inference.infer(request).await {
            Ok(response) => return Ok(response),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                warn!(
                    chunk = request.index + 1,
                    attempt,
                    max_retries,
                    error = %e,
                    "retrying chunk"
                );
                tokio::time::sleep(backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Boundary timestamps are compared as strings downstream, so they must be
/// fixed width. Loose ones are rewritten; unreadable ones drop the boundary.
fn enforce_fixed_width(mut boundary: ChapterBoundary) -> Option<ChapterBoundary> {
    for ts in [&mut boundary.start_timestamp, &mut boundary.end_timestamp] {
        if is_canonical(ts) {
            continue;
        }
        match canonicalize(ts) {
            Some(fixed) => {
                warn!(title = %boundary.title, from = %ts, to = %fixed, "rewrote non-canonical timestamp");
                *ts = fixed;
            }
            None => {
                warn!(title = %boundary.title, timestamp = %ts, "dropping boundary with unreadable timestamp");
                return None;
            }
        }
    }
    Some(boundary)
}
