//! End-to-end review analytics
//!
//! Wires normalization, hybrid sentiment, topic assignment and aspect
//! extraction into one run and reduces the results per review.

pub mod aggregator;
pub mod runner;
pub mod summary;

pub use aggregator::{Aggregator, EnrichedRecord, StageOutputs};
pub use runner::{Pipeline, PipelineOutput};
pub use summary::RunSummary;
