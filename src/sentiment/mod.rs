//! Hybrid sentiment classification
//!
//! - Valence lexicon scorer producing a bounded compound score
//! - Confidence gate deciding whether that score is trusted
//! - Refiner trait with a naive Bayes implementation
//! - Resolver combining gate and refiner into one label per review

pub mod gate;
pub mod label;
pub mod lexicon;
pub mod naive_bayes;
pub mod refiner;
pub mod resolver;

pub use gate::{ConfidenceGate, GateDecision, SentimentSource};
pub use label::{BinarySentiment, SentimentLabel};
pub use lexicon::{SentimentScore, ValenceLexicon};
pub use naive_bayes::{NaiveBayesClassifier, NaiveBayesRefiner};
pub use refiner::{RefinedLabel, Refiner, RefinerInput, UnavailableRefiner};
pub use resolver::{HybridResolver, Resolution, ScoredReview};
