//! # review-insights
//!
//! Customer review analytics for app-store reviews: hybrid rule-based and
//! model sentiment, LDA topics per polarity subset, and aspect-level
//! sentiment, written as the artifacts a dashboard reads.
//!
//! ## Modules
//!
//! - `data` - Review ingestion and artifact writers
//! - `preprocessing` - Normalization, lemmatization, TF-IDF
//! - `sentiment` - Valence scorer, confidence gate, refiner, resolver
//! - `models` - LDA, topic count selection, per-subset topic assigner
//! - `aspects` - Aspect extraction
//! - `pipeline` - Stage orchestration and aggregation
//! - `utils` - Configuration, topic evaluation, classification metrics
//!
//! ## Example
//!
//! ```
//! use review_insights::data::Review;
//! use review_insights::pipeline::Pipeline;
//! use review_insights::utils::Config;
//!
//! let reviews = vec![
//!     Review::new("r1", "Excellent service, amazing and fast delivery").with_rating(5),
//!     Review::new("r2", "").with_rating(3),
//! ];
//!
//! let output = Pipeline::new(Config::default())
//!     .without_refiner()
//!     .run(&reviews)
//!     .unwrap();
//!
//! assert_eq!(output.records.len(), 2);
//! assert_eq!(output.records[0].label().as_str(), "Positive");
//! assert!(output.records[1].topic.is_none());
//! ```

pub mod aspects;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod sentiment;
pub mod utils;

pub use aspects::{AspectExtractor, AspectSentimentPair, KeywordAspectExtractor};
pub use data::{Review, ReviewLoader};
pub use error::{ModelError, PipelineError, Result};
pub use models::{LdaModel, TopicAssigner, TopicModels};
pub use pipeline::{EnrichedRecord, Pipeline, PipelineOutput};
pub use preprocessing::{TextNormalizer, TfIdfVectorizer};
pub use sentiment::{HybridResolver, Refiner, SentimentLabel, ValenceLexicon};
pub use utils::Config;
