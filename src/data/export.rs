//! Artifact writers
//!
//! Column names and file layouts are fixed by the dashboard that reads them.

use crate::error::Result;
use crate::models::TopicKeywordMap;
use crate::pipeline::aggregator::EnrichedRecord;
use crate::utils::config::OutputConfig;
use crate::utils::metrics::EvaluationReport;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header of the enriched review table
pub const ENRICHED_COLUMNS: [&str; 13] = [
    "reviewId",
    "content",
    "rating",
    "date",
    "app_version",
    "sentiment_score",
    "sentiment_label",
    "sentiment_source",
    "sentiment_degraded",
    "topic_id",
    "topic_label",
    "topic_keywords",
    "aspects_degraded",
];

/// Header of the aspect table
pub const ASPECT_COLUMNS: [&str; 6] = [
    "Aspect",
    "Sentiment",
    "Review_Text",
    "Rating",
    "Date",
    "App_Version",
];

/// Row of the enriched review table
#[derive(Debug, Serialize)]
struct EnrichedRow<'a> {
    #[serde(rename = "reviewId")]
    review_id: &'a str,
    content: &'a str,
    rating: Option<u8>,
    date: String,
    app_version: &'a str,
    sentiment_score: f64,
    sentiment_label: &'static str,
    sentiment_source: &'static str,
    sentiment_degraded: bool,
    topic_id: Option<usize>,
    topic_label: Option<String>,
    topic_keywords: Option<String>,
    aspects_degraded: bool,
}

impl<'a> From<&'a EnrichedRecord> for EnrichedRow<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        let keywords = (!record.topic_keywords.is_empty()).then(|| record.topic_keywords.join(", "));
        Self {
            review_id: &record.review.id,
            content: &record.review.text,
            rating: record.review.rating,
            date: record.review.date(),
            app_version: &record.review.app_version,
            sentiment_score: record.sentiment.compound,
            sentiment_label: record.sentiment.label.as_str(),
            sentiment_source: record.sentiment.source.as_str(),
            sentiment_degraded: record.sentiment_degraded(),
            topic_id: record.topic.as_ref().map(|t| t.topic_id),
            topic_label: record.topic.as_ref().map(|t| t.label()),
            topic_keywords: record.topic.as_ref().and(keywords),
            aspects_degraded: record.aspects_degraded,
        }
    }
}

/// Row of the aspect table, one per aspect pair
#[derive(Debug, Serialize)]
struct AspectRow<'a> {
    #[serde(rename = "Aspect")]
    aspect: &'a str,
    #[serde(rename = "Sentiment")]
    sentiment: &'static str,
    #[serde(rename = "Review_Text")]
    review_text: &'a str,
    #[serde(rename = "Rating")]
    rating: Option<u8>,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "App_Version")]
    app_version: &'a str,
}

/// Paths of the written artifacts
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub enriched: PathBuf,
    pub aspects: PathBuf,
    pub topic_keywords: PathBuf,
    pub metrics: PathBuf,
}

/// Writes the run artifacts into one output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    files: OutputConfig,
}

impl ArtifactWriter {
    /// Create the writer, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P, files: &OutputConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: files.clone(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the enriched table, one row per record
    pub fn write_enriched(&self, records: &[EnrichedRecord]) -> Result<PathBuf> {
        let path = self.dir.join(&self.files.enriched_file);
        let mut writer = table_writer(&path, &ENRICHED_COLUMNS)?;
        for record in records {
            writer.serialize(EnrichedRow::from(record))?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Write the aspect table, one row per aspect pair
    pub fn write_aspects(&self, records: &[EnrichedRecord]) -> Result<PathBuf> {
        let path = self.dir.join(&self.files.aspects_file);
        let mut writer = table_writer(&path, &ASPECT_COLUMNS)?;
        for record in records {
            let date = record.review.date();
            for pair in &record.aspects {
                writer.serialize(AspectRow {
                    aspect: &pair.aspect,
                    sentiment: pair.sentiment.as_str(),
                    review_text: &record.review.text,
                    rating: record.review.rating,
                    date: date.clone(),
                    app_version: &record.review.app_version,
                })?;
            }
        }
        writer.flush()?;
        Ok(path)
    }

    /// Write the per-subset topic keywords
    pub fn write_topic_keywords(&self, keywords: &TopicKeywordMap) -> Result<PathBuf> {
        let path = self.dir.join(&self.files.topic_keywords_file);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, keywords)?;
        Ok(path)
    }

    /// Write the evaluation report
    pub fn write_metrics(&self, report: &EvaluationReport) -> Result<PathBuf> {
        let path = self.dir.join(&self.files.metrics_file);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, report)?;
        Ok(path)
    }

    /// Write all four artifacts
    pub fn write_all(
        &self,
        records: &[EnrichedRecord],
        keywords: &TopicKeywordMap,
        report: &EvaluationReport,
    ) -> Result<ArtifactPaths> {
        let paths = ArtifactPaths {
            enriched: self.write_enriched(records)?,
            aspects: self.write_aspects(records)?,
            topic_keywords: self.write_topic_keywords(keywords)?,
            metrics: self.write_metrics(report)?,
        };
        info!(dir = %self.dir.display(), records = records.len(), "Artifacts written");
        Ok(paths)
    }
}

/// CSV writer with an explicit header, so an empty table still has one
fn table_writer(path: &Path, columns: &[&str]) -> Result<Writer<File>> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(columns)?;
    Ok(writer)
}
