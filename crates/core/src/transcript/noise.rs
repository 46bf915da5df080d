use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Decides whether a recognized line is speech or recognizer noise.
///
/// Rules run in order and the first match wins:
/// 1. empty or whitespace-only text
/// 2. configurable denylist patterns (case-insensitive substrings)
/// 3. punctuation spam: long runs built from very few distinct characters
/// 4. stammering: long lines with a low unique-word ratio
/// 5. single-word lines from a fixed denylist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseClassifier {
    pub denylist: Vec<String>,
    pub single_word_denylist: Vec<String>,
}

impl Default for NoiseClassifier {
    fn default() -> Self {
        Self {
            denylist: Vec::new(),
            single_word_denylist: vec!["blues".to_string(), "gats".to_string()],
        }
    }
}

impl NoiseClassifier {
    pub fn is_garbage(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return true;
        }

        if self.matches_denylist(text) {
            return true;
        }

        let clean: Vec<char> = text.chars().filter(|c| *c != ' ').collect();
        if clean.len() > 10 {
            let unique: HashSet<&char> = clean.iter().collect();
            if unique.len() < 5 && clean.len() > 20 {
                return true;
            }
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return true;
        }

        let unique_words: HashSet<&&str> = words.iter().collect();
        let ratio = unique_words.len() as f64 / words.len() as f64;
        if words.len() > 6 && ratio < 0.4 {
            return true;
        }

        if let [word] = words.as_slice() {
            let word = word.to_lowercase();
            if self
                .single_word_denylist
                .iter()
                .any(|noise| noise.to_lowercase() == word)
            {
                return true;
            }
        }

        false
    }

    fn matches_denylist(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        let short = text.chars().count() < 20;

        self.denylist
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| {
                if text == pattern.as_str() {
                    return true;
                }
                let pattern = pattern.to_lowercase();
                match text_lower.matches(pattern.as_str()).count() {
                    0 => false,
                    1 => short,
                    _ => true,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_garbage() {
        let classifier = NoiseClassifier::default();
        assert!(classifier.is_garbage(""));
        assert!(classifier.is_garbage("   \t "));
    }

    #[test]
    fn repeated_token_is_garbage() {
        let classifier = NoiseClassifier::default();
        let line = vec!["ag"; 30].join(" ");
        assert!(classifier.is_garbage(&line));
    }

    #[test]
    fn stammering_is_caught_by_word_ratio() {
        let classifier = NoiseClassifier::default();
        // Enough distinct characters to pass the spam rule, ratio 3/9.
        assert!(classifier.is_garbage("the cat sat the cat sat the cat sat"));
    }

    #[test]
    fn normal_sentence_is_kept() {
        let classifier = NoiseClassifier::default();
        let sentence = "So today we are going to look at how gradient descent \
            actually converges when the loss surface is convex and what changes \
            once we move to deep networks with plateaus";
        assert_eq!(sentence.split_whitespace().count(), 30);
        assert!(!classifier.is_garbage(sentence));
    }

    #[test]
    fn punctuation_spam_is_garbage() {
        let classifier = NoiseClassifier::default();
        assert!(classifier.is_garbage(&"'".repeat(25)));
        assert!(classifier.is_garbage("'' '' '' '' '' '' '' '' '' '' ''"));
        let sentence = "we now define the kernels";
        assert_eq!(sentence.chars().count(), 25);
        assert!(!classifier.is_garbage(sentence));
    }

    #[test]
    fn short_lines_are_not_spam() {
        let classifier = NoiseClassifier::default();
        assert!(!classifier.is_garbage("okay"));
        assert!(!classifier.is_garbage("Right, so."));
    }

    #[test]
    fn single_word_denylist_is_case_insensitive() {
        let classifier = NoiseClassifier::default();
        assert!(classifier.is_garbage("Blues"));
        assert!(classifier.is_garbage("  GATS "));
        assert!(!classifier.is_garbage("gats and blues"));
    }

    #[test]
    fn denylist_counts_occurrences_and_length() {
        let classifier = NoiseClassifier {
            denylist: vec!["yw'n".to_string()],
            ..Default::default()
        };
        assert!(classifier.is_garbage("yw'n"));
        assert!(classifier.is_garbage("oh YW'N there"));
        assert!(classifier.is_garbage(
            "this is a much longer line yw'n that repeats it yw'n again"
        ));
        assert!(!classifier.is_garbage(
            "this is a much longer line that mentions yw'n exactly once"
        ));
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let classifier = NoiseClassifier {
            denylist: vec![String::new()],
            ..Default::default()
        };
        assert!(!classifier.is_garbage("the lecture begins"));
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = NoiseClassifier::default();
        for text in ["", "hello there", "''''''''''''''''''''''''", "é ü ß"] {
            assert_eq!(classifier.is_garbage(text), classifier.is_garbage(text));
        }
    }
}
