//! Word-boundary tokenizer used for chunk budgets.
//!
//! Tokens are the word-boundary segments of Unicode text segmentation
//! (UAX #29). Whitespace and punctuation runs are tokens too, so joining a
//! token slice reproduces the exact source text.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_word_bounds().collect()
}

/// Number of tokens in `text`.
pub fn count_tokens(text: &str) -> usize {
    text.split_word_bounds().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_reconstruct_text() {
        let text = "Page 1: Photosynthesis converts light into energy.\n\tÉnergie!";
        assert_eq!(tokenize(text).concat(), text);
    }

    #[test]
    fn test_words_and_separators_are_tokens() {
        assert_eq!(tokenize("Mitochondria produce ATP."), vec![
            "Mitochondria",
            " ",
            "produce",
            " ",
            "ATP",
            "."
        ]);
        assert_eq!(count_tokens("Mitochondria produce ATP."), 6);
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
        assert_eq!(count_tokens(""), 0);
    }
}
