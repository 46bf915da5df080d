use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    transcript::{noise::NoiseClassifier, timecode::parse_timestamp},
    types::TranscriptLine,
};

// `â†’` is `→` decoded as Windows-1252 somewhere upstream.
static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[(\d{2,}:\d{2}:\d{2}\.\d{3})\s*(?:->|→|â†’)\s*(\d{2,}:\d{2}:\d{2}\.\d{3})\](.*)$",
    )
    .expect("transcript line pattern")
});

/// Turns `[HH:MM:SS.mmm -> HH:MM:SS.mmm] text` lines into [`TranscriptLine`]s.
///
/// Lines that do not match the format are dropped rather than glued onto a
/// neighbour, so a line broken by the recognizer loses its tail.
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    classifier: NoiseClassifier,
}

impl LineParser {
    pub fn new(classifier: NoiseClassifier) -> Self {
        Self { classifier }
    }

    pub fn parse(&self, raw: &str) -> Vec<TranscriptLine> {
        let mut lines = Vec::new();
        let mut skipped = 0usize;
        let mut garbage = 0usize;

        for raw_line in raw.lines() {
            let Some(captures) = LINE_PATTERN.captures(raw_line.trim_end()) else {
                skipped += 1;
                continue;
            };

            let text = &captures[3];
            if self.classifier.is_garbage(text) {
                garbage += 1;
                continue;
            }

            let start = captures[1].to_string();
            let end = captures[2].to_string();
            lines.push(TranscriptLine {
                start_seconds: parse_timestamp(&start),
                end_seconds: parse_timestamp(&end),
                start,
                end,
                text: text.trim().to_string(),
                full_line: raw_line.trim().to_string(),
            });
        }

        debug!(kept = lines.len(), skipped, garbage, "parsed transcript lines");
        lines
    }
}

/// Render lines as `[start] text`, one per line, for the inference prompt.
pub fn render_for_inference(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(|line| format!("[{}] {}", line.start, line.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_valid_lines() {
        let raw = "[00:00:01.000 -> 00:00:02.000] Hello world\n\
                   garbage-no-brackets\n\
                   [00:00:03.000 -> 00:00:04.000] '''''''''''''''''''''''";
        let lines = LineParser::default().parse(raw);

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.start, "00:00:01.000");
        assert_eq!(line.end, "00:00:02.000");
        assert_eq!(line.start_seconds, 1.0);
        assert_eq!(line.end_seconds, 2.0);
        assert_eq!(line.text, "Hello world");
        assert_eq!(line.full_line, "[00:00:01.000 -> 00:00:02.000] Hello world");
    }

    #[test]
    fn accepts_unicode_and_misdecoded_arrows() {
        let raw = "[00:00:01.000 → 00:00:02.000] first point\n\
                   [00:00:02.000 â†’ 00:00:03.000] second point\n\
                   [00:00:03.000->00:00:04.000]third point";
        let lines = LineParser::default().parse(raw);

        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["first point", "second point", "third point"]);
    }

    #[test]
    fn preserves_input_order() {
        let raw = "[00:00:09.000 -> 00:00:10.000] later\n\
                   [00:00:01.000 -> 00:00:02.000] earlier";
        let lines = LineParser::default().parse(raw);
        assert_eq!(lines[0].text, "later");
        assert_eq!(lines[1].text, "earlier");
    }

    #[test]
    fn drops_partial_format_lines() {
        let raw = "[00:00:01 -> 00:00:02.000] missing millis\n\
                   00:00:01.000 -> 00:00:02.000 no brackets\n\
                   [00:00:01.000 -> 00:00:02.000]";
        assert!(LineParser::default().parse(raw).is_empty());
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let raw = "[00:00:01.000 -> 00:00:02.000] windows line\r\n";
        let lines = LineParser::default().parse(raw);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "windows line");
    }

    #[test]
    fn renders_start_and_text() {
        let raw = "[00:00:01.000 -> 00:00:02.000] a b\n[00:00:03.000 -> 00:00:04.000] c d";
        let lines = LineParser::default().parse(raw);
        assert_eq!(
            render_for_inference(&lines),
            "[00:00:01.000] a b\n[00:00:03.000] c d"
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(LineParser::default().parse("").is_empty());
    }
}
