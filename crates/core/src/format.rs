use crate::materialize::MaterializedChapter;

const SUMMARY_PLACEHOLDER: &str = "(Generated from segmented processing)";

/// Format seconds as a short `MM:SS` clock for terminal output
pub fn format_clock(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Render chapters as markdown: a summary heading, then each chapter's title
/// followed by its original transcript lines. No chapters renders as "".
pub fn format_chapters_markdown(chapters: &[MaterializedChapter<'_>], summaries: &[String]) -> String {
    if chapters.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push_str("# Summary\n\n");
    if summaries.is_empty() {
        output.push_str(SUMMARY_PLACEHOLDER);
    } else {
        output.push_str(&summaries.join("\n\n"));
    }
    output.push_str("\n\n");

    for materialized in chapters {
        output.push_str(&format!("## {}\n\n", materialized.chapter.segment_title));
        if !materialized.lines.is_empty() {
            let body = materialized
                .lines
                .iter()
                .map(|line| line.full_line.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            output.push_str(&body);
            output.push_str("\n\n");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{materialize::materialize, transcript::LineParser, types::ChapterBoundary};

    #[test]
    fn renders_headings_and_original_lines() {
        let lines = LineParser::default().parse(
            "[00:00:01.000 -> 00:00:02.000] first idea\n\
             [00:00:03.000 -> 00:00:04.000] second idea",
        );
        let boundaries = vec![
            ChapterBoundary {
                title: "Opening".to_string(),
                start_timestamp: "00:00:01.000".to_string(),
                end_timestamp: "00:00:04.000".to_string(),
            },
            ChapterBoundary {
                title: "Empty".to_string(),
                start_timestamp: "00:10:00.000".to_string(),
                end_timestamp: "00:11:00.000".to_string(),
            },
        ];
        let chapters = materialize(&boundaries, &lines);

        let markdown = format_chapters_markdown(&chapters, &[]);
        assert_eq!(
            markdown,
            "# Summary\n\n(Generated from segmented processing)\n\n\
             ## Opening\n\n\
             [00:00:01.000 -> 00:00:02.000] first idea\n\
             [00:00:03.000 -> 00:00:04.000] second idea\n\n\
             ## Empty\n\n"
        );
    }

    #[test]
    fn summaries_replace_placeholder() {
        let lines = LineParser::default().parse("[00:00:01.000 -> 00:00:02.000] only line");
        let boundaries = vec![ChapterBoundary {
            title: "One".to_string(),
            start_timestamp: "00:00:01.000".to_string(),
            end_timestamp: "00:00:02.000".to_string(),
        }];
        let chapters = materialize(&boundaries, &lines);

        let markdown = format_chapters_markdown(&chapters, &["Part one.".into(), "Part two.".into()]);
        assert!(markdown.starts_with("# Summary\n\nPart one.\n\nPart two.\n\n## One"));
    }

    #[test]
    fn no_chapters_renders_empty() {
        assert_eq!(format_chapters_markdown(&[], &["ignored".into()]), "");
    }

    #[test]
    fn clock_is_minutes_and_seconds() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(125.9), "02:05");
        assert_eq!(format_clock(-3.0), "00:00");
    }
}
