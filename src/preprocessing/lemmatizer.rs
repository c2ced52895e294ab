//! Lemmatization
//!
//! Reduces inflected tokens to a dictionary form. The default
//! [`RuleLemmatizer`] treats every token as a noun and undoes plural
//! inflection, which is what review text mostly needs: "charges" and
//! "charge" should count as one term for topic modeling.
//!
//! The plural rules follow step 1a of Porter's suffix stripping
//! (`-sses`, `-ies`, `-ss`, `-s`), but stop at a word rather than a stem so
//! the valence lexicon still recognizes the result.
//!
//! # Examples
//!
//! ```
//! use review_insights::preprocessing::lemmatizer::{Lemmatizer, RuleLemmatizer};
//!
//! let lemmatizer = RuleLemmatizer::new();
//! assert_eq!(lemmatizer.lemmatize("deliveries"), "delivery");
//! assert_eq!(lemmatizer.lemmatize("cylinders"), "cylinder");
//! assert_eq!(lemmatizer.lemmatize("status"), "status");
//! ```

use std::collections::{HashMap, HashSet};

/// Maps a lowercase token to its lemma
pub trait Lemmatizer: Send + Sync {
    /// Lemma of a single token
    fn lemmatize(&self, token: &str) -> String;

    /// Lemmatize a token sequence
    fn lemmatize_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String>
    where
        Self: Sized,
    {
        tokens.iter().map(|t| self.lemmatize(t.as_ref())).collect()
    }
}

/// Irregular plurals
const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("data", "datum"),
    ("criteria", "criterion"),
];

/// Words that end like plurals but are not
const INVARIANT: &[&str] = &[
    "news", "series", "species", "gas", "bus", "status", "plus", "yes", "this", "always",
    "was", "has", "does", "its", "his", "hers", "ours", "yours", "thus", "perhaps", "sometimes",
    "lens", "politics", "economics", "physics", "whereas", "afterwards", "towards", "besides",
    "ios", "sms", "upi", "kyc", "otp",
];

/// Endings that take `-es` in the plural
const SIBILANT_ENDINGS: &[&str] = &["sses", "ches", "shes", "xes", "zes"];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Plural-undoing lemmatizer with an exception table
///
/// Rules, first match wins:
/// 1. irregular plural table
/// 2. invariant words and tokens of three letters or fewer are kept
/// 3. `-ss`, `-us`, `-is` endings are kept
/// 4. `-ies` becomes `-y` when a consonant precedes it ("deliveries"),
///    otherwise drops the `-s` ("ties")
/// 5. sibilant `-es` plurals drop `-es`
/// 6. a final `-s` is dropped when the rest still has a vowel
#[derive(Debug, Clone)]
pub struct RuleLemmatizer {
    irregular: HashMap<String, String>,
    invariant: HashSet<String>,
}

impl Default for RuleLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleLemmatizer {
    /// Create a lemmatizer with the built-in exception tables
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            invariant: INVARIANT.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.irregular.get(token) {
            return lemma.clone();
        }
        if token.len() <= 3 || self.invariant.contains(token) {
            return token.to_string();
        }
        if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
            return token.to_string();
        }

        if let Some(stem) = token.strip_suffix("ies") {
            return match stem.chars().last() {
                Some(c) if stem.len() >= 2 && !is_vowel(c) => format!("{stem}y"),
                _ => token[..token.len() - 1].to_string(),
            };
        }
        if SIBILANT_ENDINGS.iter().any(|suffix| token.ends_with(suffix)) {
            return token[..token.len() - 2].to_string();
        }
        if let Some(stem) = token.strip_suffix('s') {
            if stem.chars().any(is_vowel) {
                return stem.to_string();
            }
        }
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = RuleLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("cylinders"), "cylinder");
        assert_eq!(lemmatizer.lemmatize("charges"), "charge");
        assert_eq!(lemmatizer.lemmatize("deliveries"), "delivery");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("matches"), "match");
        assert_eq!(lemmatizer.lemmatize("addresses"), "address");
        assert_eq!(lemmatizer.lemmatize("ties"), "tie");
    }

    #[test]
    fn test_non_plurals_are_kept() {
        let lemmatizer = RuleLemmatizer::new();
        for word in ["status", "address", "analysis", "gas", "news", "otp", "bad", "slow", "mrps"] {
            assert_eq!(lemmatizer.lemmatize(word), word);
        }
    }

    #[test]
    fn test_irregular_forms() {
        let lemmatizer = RuleLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("people"), "person");
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("knives"), "knife");
    }

    #[test]
    fn test_lemmatize_tokens() {
        let lemmatizer = RuleLemmatizer::new();
        let lemmas = lemmatizer.lemmatize_tokens(&["payments", "failed", "issues"]);
        assert_eq!(lemmas, vec!["payment", "failed", "issue"]);
    }
}
