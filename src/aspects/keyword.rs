//! Keyword-driven aspect extractor
//!
//! A review is split into clauses; every clause mentioning an aspect trigger
//! yields a pair whose sentiment is the valence lexicon's verdict on that
//! clause alone. Clauses keep their stop words, so negations and boosters
//! shape the clause score ("not fast" is negative).

use super::{AspectExtractor, AspectSentimentPair};
use crate::error::ModelError;
use crate::preprocessing::lemmatizer::{Lemmatizer, RuleLemmatizer};
use crate::sentiment::gate::DEFAULT_LABEL_THRESHOLD;
use crate::sentiment::{SentimentLabel, ValenceLexicon};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Aspect extractor matching trigger words per clause
#[derive(Clone)]
pub struct KeywordAspectExtractor {
    /// (aspect, trigger token sequences), in aspect name order
    triggers: Vec<(String, Vec<Vec<String>>)>,
    lexicon: Arc<ValenceLexicon>,
    lemmatizer: Arc<dyn Lemmatizer>,
    clause_pattern: Regex,
    label_threshold: f64,
}

impl std::fmt::Debug for KeywordAspectExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordAspectExtractor")
            .field("aspects", &self.triggers.len())
            .field("label_threshold", &self.label_threshold)
            .finish()
    }
}

impl KeywordAspectExtractor {
    /// Create an extractor from an aspect -> trigger phrases map
    pub fn new(vocabulary: &BTreeMap<String, Vec<String>>) -> Self {
        Self::with_parts(
            vocabulary,
            Arc::new(ValenceLexicon::new()),
            Arc::new(RuleLemmatizer::new()),
        )
    }

    /// Create an extractor sharing a lexicon and lemmatizer
    pub fn with_parts(
        vocabulary: &BTreeMap<String, Vec<String>>,
        lexicon: Arc<ValenceLexicon>,
        lemmatizer: Arc<dyn Lemmatizer>,
    ) -> Self {
        let triggers = vocabulary
            .iter()
            .map(|(aspect, phrases)| {
                let sequences: Vec<Vec<String>> = phrases
                    .iter()
                    .map(|phrase| tokenize(phrase, lemmatizer.as_ref()))
                    .filter(|tokens| !tokens.is_empty())
                    .collect();
                (aspect.clone(), sequences)
            })
            .filter(|(_, sequences)| !sequences.is_empty())
            .collect();

        Self {
            triggers,
            lexicon,
            lemmatizer,
            clause_pattern: Regex::new(r"(?i)[.!?;,\n]+|\bbut\b|\bhowever\b|\balthough\b")
                .expect("valid clause pattern"),
            label_threshold: DEFAULT_LABEL_THRESHOLD,
        }
    }

    /// Override the compound threshold of the clause labels
    pub fn with_label_threshold(mut self, threshold: f64) -> Self {
        self.label_threshold = threshold;
        self
    }

    /// Aspect names in match order
    pub fn aspects(&self) -> impl Iterator<Item = &str> {
        self.triggers.iter().map(|(aspect, _)| aspect.as_str())
    }

    /// Aspect pairs of one text
    ///
    /// Each aspect appears at most once per sentiment; order follows the
    /// first mention.
    pub fn extract_one(&self, text: &str) -> Vec<AspectSentimentPair> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();

        for clause in self.clause_pattern.split(text) {
            let tokens = tokenize(clause, self.lemmatizer.as_ref());
            if tokens.is_empty() {
                continue;
            }

            let mut sentiment = None;
            for (aspect, sequences) in &self.triggers {
                if !sequences.iter().any(|seq| contains_sequence(&tokens, seq)) {
                    continue;
                }
                let label = *sentiment.get_or_insert_with(|| {
                    let score = self.lexicon.score(&tokens);
                    SentimentLabel::from_compound(score.compound, self.label_threshold)
                });
                let pair = AspectSentimentPair::new(aspect.clone(), label);
                if seen.insert(pair.clone()) {
                    pairs.push(pair);
                }
            }
        }

        pairs
    }
}

impl AspectExtractor for KeywordAspectExtractor {
    fn name(&self) -> &str {
        "keyword"
    }

    fn extract(&self, texts: &[&str]) -> Result<Vec<Vec<AspectSentimentPair>>, ModelError> {
        Ok(texts.iter().map(|text| self.extract_one(text)).collect())
    }
}

fn tokenize(text: &str, lemmatizer: &dyn Lemmatizer) -> Vec<String> {
    text.unicode_words()
        .map(|word| lemmatizer.lemmatize(&word.to_lowercase().replace(['\'', '\u{2019}'], "")))
        .collect()
}

fn contains_sequence(tokens: &[String], sequence: &[String]) -> bool {
    sequence.len() <= tokens.len() && tokens.windows(sequence.len()).any(|w| w == sequence)
}
