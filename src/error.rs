//! Error types for the review analytics pipeline

use crate::models::lda::LdaError;
use thiserror::Error;

/// Errors that abort a pipeline run
///
/// Row-level problems never show up here: malformed rows are skipped at
/// ingestion and model outages degrade the affected records instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Topic model error: {0}")]
    Topic(#[from] LdaError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("No sentiment resolved for review {0}")]
    MissingSentiment(String),
}

/// Errors reported by the opaque scoring models (refiner, aspect extractor)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The model could not be loaded or is switched off
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// The model failed while processing a batch
    #[error("Resource error during inference: {0}")]
    Resource(String),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PipelineError>;
