//! Review text normalization
//!
//! Turns raw review text into the token sequence used for scoring and topic
//! modeling:
//! - lowercase
//! - strip URLs and email addresses
//! - replace every non-alphabetic character with whitespace
//! - split on whitespace
//! - drop English stop words, except protected domain terms
//! - drop domain stop words (brand and app names)
//! - lemmatize

use super::lemmatizer::{Lemmatizer, RuleLemmatizer};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Domain terms that survive stop word removal
pub const PROTECTED_TERMS: [&str; 3] = ["otp", "kyc", "upi"];

/// Domain stop words removed before lemmatization
pub const CUSTOM_STOP_WORDS: [&str; 7] = [
    "app",
    "application",
    "bpcl",
    "bharatgas",
    "use",
    "using",
    "used",
];

/// Normalized token sequence of one review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub tokens: Vec<String>,
}

impl NormalizedText {
    /// True when nothing survived normalization
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// Text normalizer with precompiled patterns
#[derive(Clone)]
pub struct TextNormalizer {
    url_pattern: Regex,
    email_pattern: Regex,
    non_alpha_pattern: Regex,
    stop_words: HashSet<String>,
    protected: HashSet<String>,
    custom_stop_words: HashSet<String>,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("stop_words", &self.stop_words.len())
            .field("protected", &self.protected)
            .field("custom_stop_words", &self.custom_stop_words)
            .finish()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a normalizer with English stop words, the default protected
    /// terms and domain stop words, and the rule lemmatizer
    pub fn new() -> Self {
        Self::with_word_lists(
            PROTECTED_TERMS.iter().map(|s| s.to_string()),
            CUSTOM_STOP_WORDS.iter().map(|s| s.to_string()),
        )
    }

    /// Create a normalizer with explicit protected terms and domain stop words
    pub fn with_word_lists<P, C>(protected: P, custom_stop_words: C) -> Self
    where
        P: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        Self {
            url_pattern: Regex::new(r"(?:https?://|www\.)\S+").expect("valid URL pattern"),
            email_pattern: Regex::new(r"\S+@\S+").expect("valid email pattern"),
            non_alpha_pattern: Regex::new(r"[^a-z]+").expect("valid alphabetic pattern"),
            stop_words: english_stop_words(),
            protected: protected.into_iter().map(|w| w.to_lowercase()).collect(),
            custom_stop_words: custom_stop_words
                .into_iter()
                .map(|w| w.to_lowercase())
                .collect(),
            lemmatizer: Arc::new(RuleLemmatizer::new()),
        }
    }

    /// Replace the lemmatizer
    pub fn with_lemmatizer(mut self, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        self.lemmatizer = lemmatizer;
        self
    }

    /// Lowercase, strip URLs, emails and non-alphabetic characters
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = self.url_pattern.replace_all(&lowered, " ");
        let without_emails = self.email_pattern.replace_all(&without_urls, " ");
        self.non_alpha_pattern
            .replace_all(&without_emails, " ")
            .trim()
            .to_string()
    }

    /// True when a token is removed as a stop word
    pub fn is_stop_word(&self, token: &str) -> bool {
        if self.protected.contains(token) {
            return false;
        }
        self.stop_words.contains(token) || self.custom_stop_words.contains(token)
    }

    /// Normalize one review text
    ///
    /// Empty or symbol-only input yields an empty token sequence.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        let cleaned = self.clean(text);
        let tokens = cleaned
            .split_whitespace()
            .filter(|token| !self.is_stop_word(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .filter(|lemma| !lemma.is_empty())
            .collect();

        NormalizedText { tokens }
    }

    /// Normalize many texts in parallel, preserving order
    pub fn normalize_all<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<NormalizedText> {
        texts
            .par_iter()
            .map(|text| self.normalize(text.as_ref()))
            .collect()
    }
}

/// English stop word list (NLTK corpus)
fn english_stop_words() -> HashSet<String> {
    let words = [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
        "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
        "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
        "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
        "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
        "wouldn't",
    ];

    words.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Leaves every token unchanged
    struct KeepAll;

    impl Lemmatizer for KeepAll {
        fn lemmatize(&self, token: &str) -> String {
            token.to_string()
        }
    }

    #[test]
    fn test_normalize_basic() {
        let normalizer = TextNormalizer::new();
        let text = normalizer.normalize("The OTP is NOT coming!! Cylinders delayed...");

        assert_eq!(text.tokens, vec!["otp", "coming", "cylinder", "delayed"]);
    }

    #[test]
    fn test_strips_urls_and_emails() {
        let normalizer = TextNormalizer::new();
        let text = normalizer.normalize(
            "Check https://example.com/help or mail support@example.com about refund",
        );

        assert_eq!(text.tokens, vec!["check", "mail", "refund"]);
    }

    #[test]
    fn test_numbers_and_symbols_become_separators() {
        let normalizer = TextNormalizer::new();
        let text = normalizer.normalize("paid Rs.850 twice,no refund#fail");

        assert_eq!(text.tokens, vec!["paid", "rs", "twice", "refund", "fail"]);
    }

    #[test]
    fn test_protected_terms_survive() {
        let normalizer = TextNormalizer::new();
        let text = normalizer.normalize("KYC and UPI");
        assert_eq!(text.tokens, vec!["kyc", "upi"]);
        assert!(!normalizer.is_stop_word("otp"));
        assert!(normalizer.is_stop_word("the"));
    }

    #[test]
    fn test_custom_stop_words_removed() {
        let normalizer = TextNormalizer::new();
        let text = normalizer.normalize("BPCL app using Bharatgas application booking");
        assert_eq!(text.tokens, vec!["booking"]);
    }

    #[test]
    fn test_empty_input_is_no_signal() {
        let normalizer = TextNormalizer::new();
        assert!(normalizer.normalize("").is_empty());
        assert!(normalizer.normalize("!!! 123 ???").is_empty());
        assert!(normalizer.normalize("the and of").is_empty());
    }

    #[test]
    fn test_custom_lemmatizer() {
        let normalizer = TextNormalizer::new().with_lemmatizer(Arc::new(KeepAll));
        let text = normalizer.normalize("payments failed");
        assert_eq!(text.tokens, vec!["payments", "failed"]);
    }

    #[test]
    fn test_normalize_all_keeps_order() {
        let normalizer = TextNormalizer::new();
        let texts = vec!["great delivery", "", "slow refunds"];
        let normalized = normalizer.normalize_all(&texts);

        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].tokens, vec!["great", "delivery"]);
        assert!(normalized[1].is_empty());
        assert_eq!(normalized[2].tokens, vec!["slow", "refund"]);
    }
}
