//! Configuration and evaluation utilities

pub mod config;
pub mod evaluation;
pub mod metrics;

pub use config::Config;
pub use evaluation::{Evaluator, ModelSummary};
pub use metrics::{EvaluationReport, EvaluationSample};
