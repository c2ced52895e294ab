//! Review input and artifact output
//!
//! Provides the review record, CSV ingestion and the writers for the files
//! the dashboard reads.

pub mod export;
pub mod loader;
pub mod review;

pub use export::{ArtifactPaths, ArtifactWriter};
pub use loader::{IngestReport, ReviewLoader};
pub use review::{IngestError, Review};
