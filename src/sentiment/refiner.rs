//! # Refiner
//!
//! The refiner is an opaque binary classifier consulted only for reviews the
//! confidence gate does not trust. Implementations range from pretrained
//! transformers to the naive Bayes model in [`super::naive_bayes`].

use super::label::BinarySentiment;
use crate::error::ModelError;

/// One review handed to the refiner
#[derive(Debug, Clone, Copy)]
pub struct RefinerInput<'a> {
    /// Review id
    pub id: &'a str,
    /// Raw review text
    pub text: &'a str,
    /// Normalized tokens of the review
    pub tokens: &'a [String],
}

/// Refiner output for one review
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinedLabel {
    /// Predicted polarity
    pub label: BinarySentiment,
    /// Confidence of the prediction (0 to 1)
    pub confidence: f64,
}

/// Binary sentiment classifier behind the confidence gate
///
/// `classify` receives a whole batch and must return exactly one label per
/// input, in input order. An `Err` marks the whole batch as failed.
pub trait Refiner: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Classify a batch of reviews
    fn classify(&self, batch: &[RefinerInput<'_>]) -> Result<Vec<RefinedLabel>, ModelError>;
}

/// Refiner that is never available
///
/// Stands in for a model that failed to load or was switched off; every call
/// fails, which sends all gated reviews through the fallback path.
#[derive(Debug, Clone)]
pub struct UnavailableRefiner {
    reason: String,
}

impl UnavailableRefiner {
    /// Create an unavailable refiner with the reason shown in logs
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the refiner is unavailable
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Refiner for UnavailableRefiner {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn classify(&self, _batch: &[RefinerInput<'_>]) -> Result<Vec<RefinedLabel>, ModelError> {
        Err(ModelError::Unavailable(self.reason.clone()))
    }
}
