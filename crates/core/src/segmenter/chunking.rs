use crate::types::TranscriptLine;

/// Lines per inference call.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

/// A contiguous, order-preserving slice of the cleaned transcript.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    pub lines: Vec<TranscriptLine>,
}

impl Chunk {
    pub fn first_start(&self) -> Option<&str> {
        self.lines.first().map(|l| l.start.as_str())
    }

    pub fn last_start(&self) -> Option<&str> {
        self.lines.last().map(|l| l.start.as_str())
    }
}

/// Split `lines` into non-overlapping chunks of at most `chunk_size` lines.
/// A zero size is treated as one.
pub fn split_into_chunks(lines: &[TranscriptLine], chunk_size: usize) -> Vec<Chunk> {
    lines
        .chunks(chunk_size.max(1))
        .enumerate()
        .map(|(index, lines)| Chunk {
            index,
            lines: lines.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::format_timestamp;

    fn lines(n: usize) -> Vec<TranscriptLine> {
        (0..n)
            .map(|i| {
                let start = i as f64;
                TranscriptLine {
                    start: format_timestamp(start),
                    end: format_timestamp(start + 1.0),
                    start_seconds: start,
                    end_seconds: start + 1.0,
                    text: format!("line {i}"),
                    full_line: String::new(),
                }
            })
            .collect()
    }

    #[test]
    fn splits_600_lines_into_three_chunks() {
        let chunks = split_into_chunks(&lines(600), DEFAULT_CHUNK_SIZE);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.lines.len()).collect();
        assert_eq!(sizes, [250, 250, 100]);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].lines[0].text, "line 250");
        assert_eq!(chunks[2].last_start(), Some("00:09:59.000"));
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(split_into_chunks(&[], DEFAULT_CHUNK_SIZE).is_empty());
    }

    #[test]
    fn zero_chunk_size_does_not_panic() {
        assert_eq!(split_into_chunks(&lines(3), 0).len(), 3);
    }
}
