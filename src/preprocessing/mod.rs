//! Text preprocessing
//!
//! Normalization, lemmatization and TF-IDF vectorization of review text.

pub mod lemmatizer;
pub mod normalizer;
pub mod vectorizer;

pub use lemmatizer::{Lemmatizer, RuleLemmatizer};
pub use normalizer::{NormalizedText, TextNormalizer};
pub use vectorizer::TfIdfVectorizer;
