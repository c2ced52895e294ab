//! Joins per-stage results into one record per review

use crate::aspects::{AspectOutcome, AspectSentimentPair};
use crate::data::Review;
use crate::error::{PipelineError, Result};
use crate::models::{TopicAssignment, TopicKeywordMap, TopicSubset};
use crate::sentiment::{Resolution, SentimentLabel};
use std::collections::{BTreeMap, HashMap};

/// A review with everything the pipeline learned about it
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub review: Review,
    pub sentiment: Resolution,
    /// `None` when the normalized text had no vocabulary term
    pub topic: Option<TopicAssignment>,
    /// Top words of the assigned topic
    pub topic_keywords: Vec<String>,
    pub aspects: Vec<AspectSentimentPair>,
    pub aspects_degraded: bool,
}

impl EnrichedRecord {
    pub fn id(&self) -> &str {
        &self.review.id
    }

    pub fn label(&self) -> SentimentLabel {
        self.sentiment.label
    }

    pub fn sentiment_degraded(&self) -> bool {
        self.sentiment.is_degraded()
    }
}

/// Per-review results of the pipeline stages, keyed by review id
///
/// Only sentiment is mandatory; missing topic or aspect entries mean
/// "none".
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    pub resolutions: HashMap<String, Resolution>,
    pub topics: HashMap<String, TopicAssignment>,
    pub aspects: HashMap<String, AspectOutcome>,
}

/// Pure reduction of stage outputs into enriched records
pub struct Aggregator;

impl Aggregator {
    /// One record per review, ordered by id
    ///
    /// Inputs are not modified, so repeated calls give identical output.
    /// Stage outputs are keyed by id, so a repeated id is rejected as
    /// invalid input. Also fails when a review has no resolved sentiment.
    pub fn aggregate(
        reviews: &[Review],
        stages: &StageOutputs,
        keywords: &TopicKeywordMap,
    ) -> Result<Vec<EnrichedRecord>> {
        let mut by_id: BTreeMap<&str, &Review> = BTreeMap::new();
        for review in reviews {
            if by_id.insert(review.id.as_str(), review).is_some() {
                return Err(PipelineError::InvalidInput(format!(
                    "duplicate review id {}",
                    review.id
                )));
            }
        }

        by_id
            .into_values()
            .map(|review| {
                let sentiment = *stages
                    .resolutions
                    .get(&review.id)
                    .ok_or_else(|| PipelineError::MissingSentiment(review.id.clone()))?;

                let topic = stages.topics.get(&review.id).cloned();
                let topic_keywords = topic
                    .as_ref()
                    .and_then(|t| lookup_keywords(keywords, t))
                    .unwrap_or_default();

                let (aspects, aspects_degraded) = match stages.aspects.get(&review.id) {
                    Some(outcome) => (outcome.pairs.clone(), outcome.degraded),
                    None => (Vec::new(), false),
                };

                Ok(EnrichedRecord {
                    review: review.clone(),
                    sentiment,
                    topic,
                    topic_keywords,
                    aspects,
                    aspects_degraded,
                })
            })
            .collect()
    }
}

fn lookup_keywords(keywords: &TopicKeywordMap, topic: &TopicAssignment) -> Option<Vec<String>> {
    let table = match topic.subset {
        TopicSubset::Negative => &keywords.negative_topics,
        TopicSubset::NonNegative => &keywords.positive_topics,
    };
    table.get(&(topic.topic_id + 1)).cloned()
}
