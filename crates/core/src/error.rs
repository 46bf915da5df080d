use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Transcript not found: {path}")]
    TranscriptNotFound { path: PathBuf },

    #[error("Transcript could not be read from {path}: {source}")]
    TranscriptUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Chapter {segment_number} not found")]
    ChapterNotFound { segment_number: u32 },

    #[error("Question {question_number} not found in quiz {quiz_id}")]
    QuestionNotFound {
        quiz_id: String,
        question_number: u32,
    },

    #[error("Quiz service unavailable at {url}")]
    QuizServiceUnavailable { url: String },

    #[error("Quiz generation failed ({status}): {body}")]
    QuizFailed { status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, LecternError>;
