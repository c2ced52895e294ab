//! Topic models
//!
//! LDA fitted by collapsed Gibbs sampling, held-out topic count selection,
//! and the per-subset topic assigner built on both.

pub mod lda;
pub mod selection;
pub mod topic_assigner;

pub use lda::{LdaConfig, LdaError, LdaModel, LdaTopic};
pub use selection::{select_topic_count, SelectionConfig, TopicCountSelection};
pub use topic_assigner::{TopicAssigner, TopicAssignment, TopicKeywordMap, TopicModels, TopicSubset};
