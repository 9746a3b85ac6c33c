//! Cleanup of model and document text.
//!
//! A single pass removes chat-template special tokens, drops control
//! characters, collapses long repeated substrings and consecutive duplicate
//! words, squeezes whitespace, and truncates to a character ceiling. Passes
//! repeat until the text stops changing, which makes normalization idempotent.

use regex::Regex;
use std::sync::LazyLock;

/// Default character ceiling.
pub const DEFAULT_MAX_CHARS: usize = 1000;

/// Longest repeated unit, in characters, the repetition scan looks for.
const MAX_REPEAT_UNIT: usize = 512;

/// Minimum length of a repeated run before it is collapsed.
const MIN_REPEAT_RUN: usize = 50;

static SPECIAL_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|[^|>]*\|>|<</?SYS>>|</?s>|\[/?INST\]|<pad>|<unk>|<eos>|<bos>").unwrap()
});

/// Text normalizer with a configurable character ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    max_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl Normalizer {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Normalize `text` to a fixed point.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.pass(text);
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, text: &str) -> String {
        let text = SPECIAL_TOKENS.replace_all(text, " ");
        let text = strip_control_chars(&text);
        let text = collapse_repeats(&text);
        let text = dedupe_words(&text);
        truncate_chars(&text, self.max_chars).trim().to_string()
    }
}

/// Normalize with the default ceiling.
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}

/// Control whitespace becomes a space; other control characters are dropped.
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if !c.is_control() {
                Some(c)
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect()
}

/// Replace every run of a unit repeated back to back, spanning at least
/// `MIN_REPEAT_RUN` characters, with a single copy of the unit.
///
/// Scans left to right; at each position the shortest qualifying unit wins.
fn collapse_repeats(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    'scan: while i < n {
        let max_unit = MAX_REPEAT_UNIT.min((n - i) / 2);
        for len in 1..=max_unit {
            let unit = &chars[i..i + len];
            let mut reps = 1;
            while i + (reps + 1) * len <= n && chars[i + reps * len..i + (reps + 1) * len] == *unit
            {
                reps += 1;
            }

            if reps >= 2 && reps * len >= MIN_REPEAT_RUN {
                out.extend(unit);
                i += reps * len;
                continue 'scan;
            }
        }

        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Collapse consecutive identical words and squeeze whitespace to single spaces.
fn dedupe_words(text: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if words.last() != Some(&word) {
            words.push(word);
        }
    }
    words.join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_unit_collapses_to_one_occurrence() {
        let text = "abcdefghij".repeat(20);
        assert_eq!(normalize(&text), "abcdefghij");
    }

    #[test]
    fn test_short_repeats_are_kept() {
        assert_eq!(normalize("hahaha, very funny"), "hahaha, very funny");
    }

    #[test]
    fn test_special_tokens_removed() {
        let text = "<|im_start|>assistant What is ATP?<|im_end|></s> [INST]next[/INST]";
        assert_eq!(normalize(text), "assistant What is ATP? next");
    }

    #[test]
    fn test_control_characters() {
        let text = "Mitochondria\u{0}\u{7} produce\tATP.\r\n\u{1b}";
        let normalized = normalize(text);
        assert_eq!(normalized, "Mitochondria produce ATP.");
        assert!(!normalized.chars().any(|c| c.is_control()));
    }

    #[test]
    fn test_duplicate_words_and_whitespace() {
        assert_eq!(
            normalize("  The the   cell cell cell uses  energy  "),
            "The the cell uses energy"
        );
    }

    #[test]
    fn test_truncates_to_ceiling() {
        let text = (0..400).map(|i| format!("w{} ", i)).collect::<String>();
        let normalized = normalize(&text);
        assert!(normalized.chars().count() <= DEFAULT_MAX_CHARS);

        let short = Normalizer::with_max_chars(12).normalize("Photosynthesis converts light");
        assert_eq!(short, "Photosynthes");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let normalized = Normalizer::with_max_chars(3).normalize("éàü and more");
        assert_eq!(normalized, "éàü");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "What is ATP?  What is ATP? <s>",
            "go go <pad> go stop",
            "x\u{0}y y\u{0}y",
            &"ab".repeat(40),
            "  leading and trailing  ",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_removed_token_exposes_duplicate_words() {
        assert_eq!(normalize("go <pad> go stop"), "go stop");
    }
}
