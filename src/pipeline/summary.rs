//! End-of-run counters

use super::aggregator::EnrichedRecord;
use crate::sentiment::{SentimentLabel, SentimentSource};
use serde::Serialize;
use tracing::info;

/// Counts describing one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub records: usize,
    /// Input rows skipped as malformed
    pub skipped_rows: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
    pub rule_based: usize,
    pub refined: usize,
    /// Records whose sentiment took the fallback path
    pub sentiment_degraded: usize,
    pub aspects_degraded: usize,
    pub with_topic: usize,
    pub aspect_pairs: usize,
    pub average_compound: f64,
}

impl RunSummary {
    pub fn from_records(records: &[EnrichedRecord], skipped_rows: usize) -> Self {
        let mut summary = Self {
            records: records.len(),
            skipped_rows,
            ..Default::default()
        };

        for record in records {
            match record.label() {
                SentimentLabel::Negative => summary.negative += 1,
                SentimentLabel::Neutral => summary.neutral += 1,
                SentimentLabel::Positive => summary.positive += 1,
            }
            match record.sentiment.source {
                SentimentSource::RuleBased => summary.rule_based += 1,
                SentimentSource::Refined => summary.refined += 1,
                SentimentSource::Fallback => summary.sentiment_degraded += 1,
            }
            if record.aspects_degraded {
                summary.aspects_degraded += 1;
            }
            if record.topic.is_some() {
                summary.with_topic += 1;
            }
            summary.aspect_pairs += record.aspects.len();
        }

        if !records.is_empty() {
            summary.average_compound = records
                .iter()
                .map(|r| r.sentiment.compound)
                .sum::<f64>()
                / records.len() as f64;
        }

        summary
    }

    pub fn log(&self) {
        info!(
            records = self.records,
            skipped = self.skipped_rows,
            negative = self.negative,
            neutral = self.neutral,
            positive = self.positive,
            average_compound = self.average_compound,
            "Sentiment distribution"
        );
        info!(
            rule_based = self.rule_based,
            refined = self.refined,
            degraded = self.sentiment_degraded,
            aspects_degraded = self.aspects_degraded,
            with_topic = self.with_topic,
            aspect_pairs = self.aspect_pairs,
            "Run summary"
        );
    }
}
