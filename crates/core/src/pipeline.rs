use std::path::Path;

use serde::Serialize;
use tokio::fs;
use tracing::info;

use crate::{
    error::{LecternError, Result},
    format::format_chapters_markdown,
    materialize::materialize,
    segmenter::{Segmentation, Segmenter},
    transcript::{LineParser, render_for_inference},
    types::{Chapter, TranscriptLine},
};

/// Everything a segmentation run produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChapterDocument {
    pub chapters: Vec<Chapter>,
    pub markdown: String,
    pub summaries: Vec<String>,
    /// `[start] text` rendering of the cleaned transcript that was segmented.
    pub cleaned_input: String,
    pub line_count: usize,
    pub failed_chunks: Vec<usize>,
}

/// Parse, segment and materialize raw transcript text. Never fails: bad lines
/// and failed chunks only shrink the result.
pub async fn process_transcript_text(
    raw: &str,
    parser: &LineParser,
    segmenter: &Segmenter,
) -> ChapterDocument {
    let lines = parser.parse(raw);
    info!(lines = lines.len(), "filtered transcript");
    chapters_from_lines(&lines, segmenter).await
}

pub async fn chapters_from_lines(lines: &[TranscriptLine], segmenter: &Segmenter) -> ChapterDocument {
    let segmentation = segmenter.segment(lines).await;
    document_from_segmentation(lines, segmentation)
}

/// Materialize a finished segmentation against the lines it was computed from.
pub fn document_from_segmentation(
    lines: &[TranscriptLine],
    segmentation: Segmentation,
) -> ChapterDocument {
    let materialized = materialize(&segmentation.boundaries, lines);
    let markdown = format_chapters_markdown(&materialized, &segmentation.summaries);

    ChapterDocument {
        chapters: materialized.into_iter().map(|m| m.chapter).collect(),
        markdown,
        summaries: segmentation.summaries,
        cleaned_input: render_for_inference(lines),
        line_count: lines.len(),
        failed_chunks: segmentation.failed_chunks,
    }
}

/// Read a transcript file. A missing or unreadable file is the one fatal case.
pub async fn read_transcript(path: &Path) -> Result<String> {
    match fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LecternError::TranscriptNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(LecternError::TranscriptUnreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub async fn process_transcript_file(
    path: &Path,
    parser: &LineParser,
    segmenter: &Segmenter,
) -> Result<ChapterDocument> {
    let raw = read_transcript(path).await?;
    Ok(process_transcript_text(&raw, parser, segmenter).await)
}
