//! Review records and row-level ingestion errors

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One app-store review, immutable after ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique review id
    pub id: String,
    /// Raw review text, may be empty
    pub text: String,
    /// Star rating 1-5; `None` when absent or out of range
    pub rating: Option<u8>,
    /// Timestamp as found in the input
    pub timestamp: String,
    pub app_version: String,
}

impl Review {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            rating: None,
            timestamp: String::new(),
            app_version: String::new(),
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = (1..=5).contains(&rating).then_some(rating);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }

    /// Calendar date of the timestamp, `YYYY-MM-DD`
    ///
    /// Falls back to the raw timestamp when no known format matches.
    pub fn date(&self) -> String {
        format_date(&self.timestamp)
    }
}

/// Parse a star rating; anything outside 1..=5 is no rating
///
/// Accepts integral floats ("4.0") since spreadsheet exports write them.
pub fn parse_rating(raw: &str) -> Option<u8> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return None;
    }
    Some(value as u8)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Reduce a timestamp to its `YYYY-MM-DD` date
pub fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    trimmed.to_string()
}

/// A malformed input row; the row is skipped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("line {line}: missing review id")]
    MissingId { line: u64 },

    #[error("line {line}: review {id} has no content field")]
    MissingText { line: u64, id: String },

    #[error("line {line}: duplicate review id {id}")]
    DuplicateId { line: u64, id: String },

    #[error("line {line}: unparseable row: {message}")]
    Unparseable { line: u64, message: String },
}

impl IngestError {
    /// Input line of the skipped row
    pub fn line(&self) -> u64 {
        match self {
            IngestError::MissingId { line }
            | IngestError::MissingText { line, .. }
            | IngestError::DuplicateId { line, .. }
            | IngestError::Unparseable { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("5"), Some(5));
        assert_eq!(parse_rating(" 1 "), Some(1));
        assert_eq!(parse_rating("4.0"), Some(4));
        assert_eq!(parse_rating("4.5"), None);
        assert_eq!(parse_rating("0"), None);
        assert_eq!(parse_rating("6"), None);
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("five"), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05 14:22:10"), "2024-03-05");
        assert_eq!(format_date("2024-03-05T14:22:10+05:30"), "2024-03-05");
        assert_eq!(format_date("2024-03-05"), "2024-03-05");
        assert_eq!(format_date("05/03/2024 09:15"), "2024-03-05");
        assert_eq!(format_date("yesterday"), "yesterday");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn test_review_builder() {
        let review = Review::new("r1", "Great app")
            .with_rating(9)
            .with_timestamp("2024-01-02 10:00:00")
            .with_app_version("3.1.0");

        assert_eq!(review.rating, None);
        assert_eq!(review.date(), "2024-01-02");
        assert_eq!(review.app_version, "3.1.0");
    }

    #[test]
    fn test_ingest_error_line() {
        let error = IngestError::DuplicateId {
            line: 7,
            id: "r1".into(),
        };
        assert_eq!(error.line(), 7);
        assert_eq!(error.to_string(), "line 7: duplicate review id r1");
    }
}
