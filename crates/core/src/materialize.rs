use crate::{
    transcript::parse_timestamp,
    types::{Chapter, ChapterBoundary, ChapterTranscriptEntry, TranscriptLine},
};

/// A chapter together with the original lines that fell inside it.
#[derive(Debug, Clone)]
pub struct MaterializedChapter<'a> {
    pub chapter: Chapter,
    pub lines: Vec<&'a TranscriptLine>,
}

/// Build chapters from sorted boundaries by re-scanning every line for each one.
///
/// Membership is `start_timestamp <= line.start <= end_timestamp` on the raw
/// strings. Chapters are independent views, not a partition: a line inside two
/// overlapping chapters belongs to both.
pub fn materialize<'a>(
    boundaries: &[ChapterBoundary],
    lines: &'a [TranscriptLine],
) -> Vec<MaterializedChapter<'a>> {
    boundaries
        .iter()
        .enumerate()
        .map(|(idx, boundary)| {
            let start = boundary.start_timestamp.as_str();
            let end = boundary.end_timestamp.as_str();
            let owned: Vec<&TranscriptLine> = lines
                .iter()
                .filter(|line| start <= line.start.as_str() && line.start.as_str() <= end)
                .collect();

            let chapter = Chapter {
                segment_number: idx as u32 + 1,
                segment_title: boundary.title.clone(),
                segment_start_timestamp: parse_timestamp(start),
                segment_end_timestamp: parse_timestamp(end),
                transcript: owned
                    .iter()
                    .map(|line| ChapterTranscriptEntry {
                        start_timestamp: line.start_seconds,
                        end_timestamp: line.end_seconds,
                        text: line.text.clone(),
                    })
                    .collect(),
            };

            MaterializedChapter {
                chapter,
                lines: owned,
            }
        })
        .collect()
}

/// First chapter whose numeric range contains `seconds`.
pub fn chapter_at(chapters: &[Chapter], seconds: f64) -> Option<&Chapter> {
    chapters.iter().find(|chapter| chapter.contains(seconds))
}

/// Chapters numbered `first..=last`, in order.
pub fn chapters_in_range(chapters: &[Chapter], first: u32, last: u32) -> Vec<&Chapter> {
    chapters
        .iter()
        .filter(|chapter| (first..=last).contains(&chapter.segment_number))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::LineParser;

    fn boundary(title: &str, start: &str, end: &str) -> ChapterBoundary {
        ChapterBoundary {
            title: title.to_string(),
            start_timestamp: start.to_string(),
            end_timestamp: end.to_string(),
        }
    }

    fn sample_lines() -> Vec<TranscriptLine> {
        LineParser::default().parse(
            "[00:00:01.000 -> 00:00:05.000] welcome to the course\n\
             [00:00:05.000 -> 00:00:09.000] today we cover kernels\n\
             [00:00:09.000 -> 00:00:14.000] a kernel measures similarity\n\
             [00:00:14.000 -> 00:00:20.000] that wraps up the session",
        )
    }

    #[test]
    fn numbers_chapters_and_slices_lines() {
        let lines = sample_lines();
        let chapters = materialize(
            &[
                boundary("Intro", "00:00:01.000", "00:00:05.000"),
                boundary("Kernels", "00:00:09.000", "00:00:20.000"),
            ],
            &lines,
        );

        assert_eq!(chapters.len(), 2);
        let intro = &chapters[0].chapter;
        assert_eq!(intro.segment_number, 1);
        assert_eq!(intro.segment_title, "Intro");
        assert_eq!(intro.segment_start_timestamp, 1.0);
        assert_eq!(intro.segment_end_timestamp, 5.0);
        let texts: Vec<&str> = intro.transcript.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["welcome to the course", "today we cover kernels"]);

        let kernels = &chapters[1].chapter;
        assert_eq!(kernels.segment_number, 2);
        assert_eq!(kernels.transcript.len(), 2);
        assert_eq!(kernels.transcript[0].start_timestamp, 9.0);
        assert_eq!(kernels.transcript[0].end_timestamp, 14.0);
    }

    #[test]
    fn overlapping_chapters_share_lines() {
        let lines = sample_lines();
        let chapters = materialize(
            &[
                boundary("Part 1", "00:00:01.000", "00:00:09.000"),
                boundary("Part 2", "00:00:09.000", "00:00:14.000"),
            ],
            &lines,
        );

        let shared = "a kernel measures similarity";
        assert!(chapters[0].chapter.transcript.iter().any(|e| e.text == shared));
        assert!(chapters[1].chapter.transcript.iter().any(|e| e.text == shared));
    }

    #[test]
    fn chapter_without_lines_is_kept() {
        let lines = sample_lines();
        let chapters = materialize(&[boundary("Gap", "00:30:00.000", "00:40:00.000")], &lines);
        assert_eq!(chapters.len(), 1);
        assert!(chapters[0].chapter.transcript.is_empty());
        assert!(chapters[0].lines.is_empty());
    }

    #[test]
    fn no_boundaries_no_chapters() {
        assert!(materialize(&[], &sample_lines()).is_empty());
    }

    #[test]
    fn looks_up_chapter_by_time_and_number() {
        let lines = sample_lines();
        let chapters: Vec<Chapter> = materialize(
            &[
                boundary("Intro", "00:00:01.000", "00:00:05.000"),
                boundary("Kernels", "00:00:05.500", "00:00:20.000"),
            ],
            &lines,
        )
        .into_iter()
        .map(|m| m.chapter)
        .collect();

        assert_eq!(chapter_at(&chapters, 3.0).map(|c| c.segment_number), Some(1));
        assert_eq!(chapter_at(&chapters, 5.0).map(|c| c.segment_number), Some(1));
        assert_eq!(chapter_at(&chapters, 12.0).map(|c| c.segment_number), Some(2));
        assert!(chapter_at(&chapters, 5.2).is_none());
        assert!(chapter_at(&chapters, 99.0).is_none());

        let numbers: Vec<u32> = chapters_in_range(&chapters, 2, 9)
            .iter()
            .map(|c| c.segment_number)
            .collect();
        assert_eq!(numbers, [2]);
        assert_eq!(chapters_in_range(&chapters, 1, u32::MAX).len(), 2);
        assert!(chapters_in_range(&chapters, 3, 9).is_empty());
    }
}
