//! Aspect-level sentiment
//!
//! An aspect extractor turns raw review text into (aspect, sentiment) pairs.
//! Extractors are opaque behind [`AspectExtractor`]; [`extract_all`] drives
//! one in batches and degrades failed batches instead of failing the run.

pub mod keyword;

pub use keyword::KeywordAspectExtractor;

use crate::error::ModelError;
use crate::sentiment::SentimentLabel;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One aspect mentioned in a review, with its own sentiment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectSentimentPair {
    pub aspect: String,
    pub sentiment: SentimentLabel,
}

impl AspectSentimentPair {
    pub fn new(aspect: impl Into<String>, sentiment: SentimentLabel) -> Self {
        Self {
            aspect: aspect.into(),
            sentiment,
        }
    }
}

/// Batch aspect extractor
///
/// `extract` must return one entry per input text, in input order. An `Err`
/// marks the whole batch as failed.
pub trait AspectExtractor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Extract aspect pairs for a batch of raw texts
    fn extract(&self, texts: &[&str]) -> Result<Vec<Vec<AspectSentimentPair>>, ModelError>;
}

/// Extractor that is never available
#[derive(Debug, Clone)]
pub struct UnavailableAspectExtractor {
    reason: String,
}

impl UnavailableAspectExtractor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AspectExtractor for UnavailableAspectExtractor {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn extract(&self, _texts: &[&str]) -> Result<Vec<Vec<AspectSentimentPair>>, ModelError> {
        Err(ModelError::Unavailable(self.reason.clone()))
    }
}

/// Aspects of one review
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectOutcome {
    pub pairs: Vec<AspectSentimentPair>,
    /// Set when the review's batch failed
    pub degraded: bool,
}

impl AspectOutcome {
    /// Outcome of a review in a failed batch
    pub fn degraded() -> Self {
        Self {
            pairs: Vec::new(),
            degraded: true,
        }
    }
}

/// Run an extractor over all texts in batches of `batch_size`
///
/// Output is aligned with `texts`. A failed or short batch yields degraded
/// empty outcomes for its reviews only.
pub fn extract_all(
    extractor: &dyn AspectExtractor,
    texts: &[&str],
    batch_size: usize,
) -> Vec<AspectOutcome> {
    texts
        .par_chunks(batch_size.max(1))
        .map(|chunk| match extractor.extract(chunk) {
            Ok(results) if results.len() == chunk.len() => results
                .into_iter()
                .map(|pairs| AspectOutcome {
                    pairs,
                    degraded: false,
                })
                .collect(),
            Ok(results) => {
                warn!(
                    extractor = extractor.name(),
                    expected = chunk.len(),
                    got = results.len(),
                    "Aspect extractor returned a short batch, no aspects for it"
                );
                vec![AspectOutcome::degraded(); chunk.len()]
            }
            Err(e) => {
                warn!(
                    extractor = extractor.name(),
                    batch = chunk.len(),
                    error = %e,
                    "Aspect extractor failed, no aspects for batch"
                );
                vec![AspectOutcome::degraded(); chunk.len()]
            }
        })
        .collect::<Vec<Vec<AspectOutcome>>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Aspect vocabulary of the LPG booking app domain
pub fn default_vocabulary() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        ("booking", &["booking", "book", "booked", "order", "ordered"]),
        ("customer service", &["customer service", "customer care", "support", "helpline", "agent"]),
        ("cylinder", &["cylinder", "refill", "lpg"]),
        ("delivery", &["delivery", "deliver", "delivered", "distributor", "delivery boy"]),
        ("kyc", &["kyc", "document", "aadhaar"]),
        ("login", &["login", "log in", "sign in", "password", "register", "registration"]),
        ("otp", &["otp", "verification", "verify"]),
        ("payment", &["payment", "pay", "paid", "upi", "card", "transaction", "money"]),
        ("performance", &["crash", "hang", "loading", "lag", "server", "speed"]),
        ("refund", &["refund", "refunded", "cashback"]),
        ("update", &["update", "updated", "version"]),
    ];

    entries
        .iter()
        .map(|(aspect, triggers)| {
            (
                aspect.to_string(),
                triggers.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Labels every text with its length parity
    struct ParityExtractor;

    impl AspectExtractor for ParityExtractor {
        fn name(&self) -> &str {
            "parity"
        }

        fn extract(&self, texts: &[&str]) -> Result<Vec<Vec<AspectSentimentPair>>, ModelError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let label = if t.len() % 2 == 0 {
                        SentimentLabel::Positive
                    } else {
                        SentimentLabel::Negative
                    };
                    vec![AspectSentimentPair::new("length", label)]
                })
                .collect())
        }
    }

    /// Fails every batch containing the text "boom"
    struct ExplodingExtractor;

    impl AspectExtractor for ExplodingExtractor {
        fn name(&self) -> &str {
            "exploding"
        }

        fn extract(&self, texts: &[&str]) -> Result<Vec<Vec<AspectSentimentPair>>, ModelError> {
            if texts.contains(&"boom") {
                return Err(ModelError::Resource("out of memory".into()));
            }
            Ok(vec![Vec::new(); texts.len()])
        }
    }

    #[test]
    fn test_extract_all_keeps_order() {
        let texts = ["ab", "abc", "abcd", "a", "abcdef"];
        let outcomes = extract_all(&ParityExtractor, &texts, 2);

        assert_eq!(outcomes.len(), 5);
        let labels: Vec<SentimentLabel> = outcomes.iter().map(|o| o.pairs[0].sentiment).collect();
        assert_eq!(
            labels,
            vec![
                SentimentLabel::Positive,
                SentimentLabel::Negative,
                SentimentLabel::Positive,
                SentimentLabel::Negative,
                SentimentLabel::Positive,
            ]
        );
        assert!(outcomes.iter().all(|o| !o.degraded));
    }

    #[test]
    fn test_failed_batch_degrades_only_its_reviews() {
        let texts = ["fine", "boom", "also fine", "ok"];
        let outcomes = extract_all(&ExplodingExtractor, &texts, 2);

        assert_eq!(
            outcomes.iter().map(|o| o.degraded).collect::<Vec<_>>(),
            vec![true, true, false, false]
        );
        assert!(outcomes.iter().all(|o| o.pairs.is_empty()));
    }

    #[test]
    fn test_unavailable_extractor_degrades_everything() {
        let extractor = UnavailableAspectExtractor::new("model missing");
        let outcomes = extract_all(&extractor, &["a", "b", "c"], 32);
        assert!(outcomes.iter().all(|o| o.degraded && o.pairs.is_empty()));
    }

    #[test]
    fn test_default_vocabulary() {
        let vocabulary = default_vocabulary();
        assert!(vocabulary.contains_key("otp"));
        assert!(vocabulary["payment"].contains(&"upi".to_string()));
    }
}
