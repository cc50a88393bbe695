//! Text normalization applied before prediction.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Normalizes raw user text into the form models were trained on.
pub trait TextPreprocessor: Send + Sync {
    fn preprocess(&self, text: &str) -> String;
}

/// Used when no preprocessor is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercasePreprocessor;

impl TextPreprocessor for LowercasePreprocessor {
    fn preprocess(&self, text: &str) -> String {
        text.to_lowercase()
    }
}

/// Common English function words dropped before classification.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

/// NFKC-normalize, lowercase, keep alphanumeric tokens and drop stop words.
#[derive(Debug, Clone)]
pub struct StopWordPreprocessor {
    stop_words: HashSet<String>,
}

impl StopWordPreprocessor {
    pub fn english() -> Self {
        Self::with_stop_words(ENGLISH_STOP_WORDS.iter().copied())
    }

    pub fn with_stop_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self { stop_words: words.into_iter().map(str::to_lowercase).collect() }
    }

    /// Keeps every token.
    pub fn keep_all() -> Self {
        Self { stop_words: HashSet::new() }
    }
}

impl Default for StopWordPreprocessor {
    fn default() -> Self {
        Self::english()
    }
}

impl TextPreprocessor for StopWordPreprocessor {
    fn preprocess(&self, text: &str) -> String {
        let normalized: String = text.nfkc().collect::<String>().to_lowercase();
        normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .filter(|token| !self.stop_words.contains(*token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_fallback() {
        assert_eq!(LowercasePreprocessor.preprocess("Hello THERE!"), "hello there!");
    }

    #[test]
    fn test_drops_stop_words_and_punctuation() {
        let pre = StopWordPreprocessor::english();
        assert_eq!(pre.preprocess("Hello, I want a REFUND for my order!"), "hello want refund order");
    }

    #[test]
    fn test_nfkc_folds_compatibility_forms() {
        let pre = StopWordPreprocessor::keep_all();
        // Fullwidth letters fold to ASCII.
        assert_eq!(pre.preprocess("ＨＥＬＬＯ world"), "hello world");
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        let pre = StopWordPreprocessor::english();
        assert_eq!(pre.preprocess(""), "");
        assert_eq!(pre.preprocess("?!... --"), "");
    }
}
