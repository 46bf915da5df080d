pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod jobs;
pub mod materialize;
pub mod output;
pub mod pipeline;
pub mod provider;
pub mod queues;
pub mod quiz;
pub mod routes;
pub mod segmenter;
pub mod transcript;
pub mod types;
pub mod workers;

pub use config::{QuizSettings, SegmenterSettings, Settings};
pub use error::{LecternError, Result};
pub use format::{format_chapters_markdown, format_clock};
pub use jobs::{JobRecord, JobStatus, JobStore};
pub use materialize::{MaterializedChapter, chapter_at, chapters_in_range, materialize};
pub use output::{get_job_dir, load_chapters, save_chapters, save_document};
pub use pipeline::{
    ChapterDocument, chapters_from_lines, document_from_segmentation, process_transcript_file,
    process_transcript_text, read_transcript,
};
pub use provider::{Provider, ProviderConfig};
pub use quiz::{AnswerVerdict, Question, Quiz, QuizClient, lenient_verdict};
pub use segmenter::{BoundaryInference, LlmBoundaryInference, MergePolicy, Segmenter};
pub use transcript::{LineParser, NoiseClassifier};
pub use types::{Chapter, ChapterBoundary, ChapterTranscriptEntry, TaggedBoundary, TranscriptLine};
