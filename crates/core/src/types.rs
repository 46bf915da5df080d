use serde::{Deserialize, Serialize};

/// A transcript line that survived parsing and noise filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// `HH:MM:SS.mmm`, as written by the transcription provider.
    pub start: String,
    pub end: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Trimmed spoken text. Never empty, never garbage.
    pub text: String,
    /// The original line, kept for the human-readable rendering.
    pub full_line: String,
}

/// Chapter range proposed by the boundary-inference service for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBoundary {
    pub title: String,
    pub start_timestamp: String,
    pub end_timestamp: String,
}

/// A boundary remembered together with the chunk that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedBoundary {
    pub chunk_index: usize,
    pub boundary: ChapterBoundary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterTranscriptEntry {
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub segment_number: u32,
    pub segment_title: String,
    pub segment_start_timestamp: f64,
    pub segment_end_timestamp: f64,
    pub transcript: Vec<ChapterTranscriptEntry>,
}

impl Chapter {
    /// Slice texts joined by a single space, used as grading context.
    pub fn transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn contains(&self, seconds: f64) -> bool {
        self.segment_start_timestamp <= seconds && seconds <= self.segment_end_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_text_joins_slices() {
        let chapter = Chapter {
            segment_number: 1,
            segment_title: "Kernels".to_string(),
            segment_start_timestamp: 10.0,
            segment_end_timestamp: 20.0,
            transcript: ["a kernel", "measures similarity"]
                .iter()
                .enumerate()
                .map(|(i, text)| ChapterTranscriptEntry {
                    start_timestamp: 10.0 + i as f64,
                    end_timestamp: 11.0 + i as f64,
                    text: text.to_string(),
                })
                .collect(),
        };

        assert_eq!(chapter.transcript_text(), "a kernel measures similarity");
        assert!(chapter.contains(10.0));
        assert!(chapter.contains(20.0));
        assert!(!chapter.contains(20.5));
    }
}
