//! Review ingestion from CSV
//!
//! Columns are located by header name, so extra columns and any column order
//! are accepted. Malformed rows are skipped and reported, never fatal.

use super::review::{parse_rating, IngestError, Review};
use crate::error::{PipelineError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Header names of the review export
pub mod columns {
    pub const ID: &str = "reviewId";
    pub const CONTENT: &str = "content";
    pub const SCORE: &str = "score";
    pub const AT: &str = "at";
    pub const APP_VERSION: &str = "appVersion";
}

/// Accepted reviews and the rows that were skipped
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Reviews in input order
    pub reviews: Vec<Review>,
    pub skipped: Vec<IngestError>,
}

/// Column positions resolved from the header row
struct ColumnIndex {
    id: usize,
    content: usize,
    score: Option<usize>,
    at: Option<usize>,
    app_version: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            find(name).ok_or_else(|| {
                PipelineError::InvalidInput(format!("input has no '{}' column", name))
            })
        };

        Ok(Self {
            id: required(columns::ID)?,
            content: required(columns::CONTENT)?,
            score: find(columns::SCORE),
            at: find(columns::AT),
            app_version: find(columns::APP_VERSION),
        })
    }
}

/// Loader for review CSV exports
pub struct ReviewLoader;

impl ReviewLoader {
    /// Load reviews from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<IngestReport> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let report = Self::load_from_reader(file)?;
        info!(
            path = %path.display(),
            reviews = report.reviews.len(),
            skipped = report.skipped.len(),
            "Reviews loaded"
        );
        Ok(report)
    }

    /// Load reviews from any CSV source
    pub fn load_from_reader<R: Read>(reader: R) -> Result<IngestReport> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = ColumnIndex::from_headers(reader.headers()?)?;

        let mut report = IngestReport::default();
        let mut seen_ids = HashSet::new();

        for result in reader.records() {
            let outcome = match result {
                Ok(record) => parse_record(&record, &columns, &mut seen_ids),
                Err(e) => Err(IngestError::Unparseable {
                    line: e.position().map(|p| p.line()).unwrap_or(0),
                    message: e.to_string(),
                }),
            };

            match outcome {
                Ok(review) => report.reviews.push(review),
                Err(e) => {
                    warn!(line = e.line(), error = %e, "Skipping malformed row");
                    report.skipped.push(e);
                }
            }
        }

        Ok(report)
    }
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnIndex,
    seen_ids: &mut HashSet<String>,
) -> std::result::Result<Review, IngestError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

    let id = record.get(columns.id).unwrap_or("").trim();
    if id.is_empty() {
        return Err(IngestError::MissingId { line });
    }

    let text = record
        .get(columns.content)
        .ok_or_else(|| IngestError::MissingText {
            line,
            id: id.to_string(),
        })?;

    if !seen_ids.insert(id.to_string()) {
        return Err(IngestError::DuplicateId {
            line,
            id: id.to_string(),
        });
    }

    Ok(Review {
        id: id.to_string(),
        text: text.to_string(),
        rating: parse_rating(field(columns.score)),
        timestamp: field(columns.at).trim().to_string(),
        app_version: field(columns.app_version).trim().to_string(),
    })
}
