//! # Pipeline
//!
//! Runs every stage over one batch of reviews:
//!
//! 1. normalize and score (parallel, shared read-only lexicon)
//! 2. resolve sentiment through the confidence gate and refiner
//! 3. train one topic model per polarity subset and assign topics
//! 4. extract aspects in batches
//! 5. aggregate, evaluate and summarize

use super::aggregator::{Aggregator, EnrichedRecord, StageOutputs};
use super::summary::RunSummary;
use crate::aspects::{extract_all, AspectExtractor, AspectOutcome, KeywordAspectExtractor};
use crate::data::{ArtifactPaths, ArtifactWriter, IngestError, IngestReport, Review, ReviewLoader};
use crate::error::Result;
use crate::models::topic_assigner::search_topic_count;
use crate::models::{LdaError, TopicCountSelection, TopicKeywordMap, TopicModels, TopicSubset};
use crate::preprocessing::lemmatizer::{Lemmatizer, RuleLemmatizer};
use crate::preprocessing::{NormalizedText, TextNormalizer};
use crate::sentiment::{
    BinarySentiment, ConfidenceGate, GateDecision, HybridResolver, NaiveBayesRefiner, Refiner,
    Resolution, ScoredReview, SentimentLabel, UnavailableRefiner, ValenceLexicon,
};
use crate::utils::config::{Config, RefinerKind};
use crate::utils::metrics::{EvaluationReport, EvaluationSample};
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// One record per review, ordered by id
    pub records: Vec<EnrichedRecord>,
    pub topic_keywords: TopicKeywordMap,
    pub evaluation: EvaluationReport,
    pub summary: RunSummary,
}

/// Reviews after the sentiment stage
struct SentimentStage {
    normalized: Vec<NormalizedText>,
    resolutions: HashMap<String, Resolution>,
}

/// Configured pipeline
pub struct Pipeline {
    config: Config,
    normalizer: TextNormalizer,
    lexicon: Arc<ValenceLexicon>,
    gate: ConfidenceGate,
    refiner: Option<Arc<dyn Refiner>>,
    aspect_extractor: Option<Arc<dyn AspectExtractor>>,
}

impl Pipeline {
    /// Build a pipeline from configuration
    ///
    /// The refiner is trained per run unless one is injected; the keyword
    /// aspect extractor is used when aspects are enabled.
    pub fn new(config: Config) -> Self {
        let lexicon = Arc::new(ValenceLexicon::new());
        let lemmatizer: Arc<dyn Lemmatizer> = Arc::new(RuleLemmatizer::new());
        let normalizer = TextNormalizer::with_word_lists(
            config.normalizer.protected_terms.iter().cloned(),
            config.normalizer.custom_stop_words.iter().cloned(),
        )
        .with_lemmatizer(Arc::clone(&lemmatizer));
        let gate = ConfidenceGate::new(
            config.sentiment.gate_threshold,
            config.sentiment.label_threshold,
        );
        let aspect_extractor: Option<Arc<dyn AspectExtractor>> = if config.aspects.enabled {
            Some(Arc::new(
                KeywordAspectExtractor::with_parts(
                    &config.aspects.vocabulary,
                    Arc::clone(&lexicon),
                    lemmatizer,
                )
                .with_label_threshold(config.sentiment.label_threshold),
            ))
        } else {
            None
        };

        Self {
            config,
            normalizer,
            lexicon,
            gate,
            refiner: None,
            aspect_extractor,
        }
    }

    /// Use a fixed refiner instead of training one per run
    pub fn with_refiner(mut self, refiner: Arc<dyn Refiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    /// Run without a refiner; gated reviews take the degraded fallback
    pub fn without_refiner(self) -> Self {
        self.with_refiner(Arc::new(UnavailableRefiner::new("refiner disabled")))
    }

    /// Replace the aspect extractor
    pub fn with_aspect_extractor(mut self, extractor: Arc<dyn AspectExtractor>) -> Self {
        self.aspect_extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load reviews from a CSV file, run, and write the artifacts
    pub fn run_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output_dir: Q,
    ) -> Result<(PipelineOutput, ArtifactPaths)> {
        let report = ReviewLoader::load(input)?;
        let output = self.run_ingested(&report)?;

        let writer = ArtifactWriter::new(output_dir, &self.config.output)?;
        let paths = writer.write_all(&output.records, &output.topic_keywords, &output.evaluation)?;
        Ok((output, paths))
    }

    /// Run over an ingestion result, counting its skipped rows
    pub fn run_ingested(&self, report: &IngestReport) -> Result<PipelineOutput> {
        self.run_with_skipped(&report.reviews, report.skipped.len())
    }

    /// Run over already loaded reviews
    ///
    /// A review repeating an earlier id is skipped like a malformed row.
    pub fn run(&self, reviews: &[Review]) -> Result<PipelineOutput> {
        self.run_with_skipped(reviews, 0)
    }

    fn run_with_skipped(&self, reviews: &[Review], skipped_rows: usize) -> Result<PipelineOutput> {
        let (reviews, duplicates) = drop_duplicate_ids(reviews);
        let reviews: &[Review] = &reviews;
        let skipped_rows = skipped_rows + duplicates.len();
        info!(reviews = reviews.len(), "Pipeline started");

        let SentimentStage {
            normalized,
            resolutions,
        } = self.resolve_sentiment(reviews)?;

        let labeled: Vec<(SentimentLabel, &[String])> = reviews
            .iter()
            .zip(&normalized)
            .filter_map(|(review, norm)| {
                resolutions
                    .get(&review.id)
                    .map(|r| (r.label, norm.tokens.as_slice()))
            })
            .collect();
        let topic_models = TopicModels::train(&labeled, &self.config.topics);

        let topics = reviews
            .par_iter()
            .zip(normalized.par_iter())
            .filter_map(|(review, norm)| {
                let label = resolutions.get(&review.id)?.label;
                match topic_models.assign(label, &norm.tokens) {
                    Ok(Some(assignment)) => Some(Ok((review.id.clone(), assignment))),
                    Ok(None) => None,
                    Err(e) => Some(Err(e)),
                }
            })
            .collect::<std::result::Result<HashMap<_, _>, LdaError>>()?;

        let aspects = self.extract_aspects(reviews, &normalized);

        let stages = StageOutputs {
            resolutions,
            topics,
            aspects,
        };
        let topic_keywords = topic_models.keyword_map();
        let records = Aggregator::aggregate(reviews, &stages, &topic_keywords)?;

        let samples: Vec<EvaluationSample> = records
            .iter()
            .map(|record| EvaluationSample {
                rating: record.review.rating,
                predicted: record.label(),
                rule_based: self.gate.label_for(record.sentiment.compound),
            })
            .collect();
        let evaluation = EvaluationReport::from_samples(&samples);
        info!(
            accuracy = evaluation.accuracy,
            match_rate = evaluation.match_rate,
            rated = evaluation.n_rated,
            "Evaluation against ratings"
        );

        let summary = RunSummary::from_records(&records, skipped_rows);
        summary.log();

        Ok(PipelineOutput {
            records,
            topic_keywords,
            evaluation,
            summary,
        })
    }

    /// Held-out perplexity search per polarity subset
    ///
    /// Sentiment is resolved first so the subsets match a real run. A subset
    /// without enough vocabulary reports its error instead of a selection.
    pub fn select_topic_counts(
        &self,
        reviews: &[Review],
    ) -> Result<Vec<(TopicSubset, std::result::Result<TopicCountSelection, LdaError>)>> {
        let (reviews, _) = drop_duplicate_ids(reviews);
        let reviews: &[Review] = &reviews;
        let SentimentStage {
            normalized,
            resolutions,
        } = self.resolve_sentiment(reviews)?;

        let results = [TopicSubset::Negative, TopicSubset::NonNegative]
            .into_iter()
            .map(|subset| {
                let documents: Vec<Vec<String>> = reviews
                    .iter()
                    .zip(&normalized)
                    .filter(|(review, _)| {
                        resolutions
                            .get(&review.id)
                            .map(|r| TopicSubset::for_label(r.label) == subset)
                            .unwrap_or(false)
                    })
                    .map(|(_, norm)| norm.tokens.clone())
                    .collect();
                (subset, search_topic_count(&documents, &self.config.topics))
            })
            .collect();

        Ok(results)
    }

    fn resolve_sentiment(&self, reviews: &[Review]) -> Result<SentimentStage> {
        let texts: Vec<&str> = reviews.iter().map(|r| r.text.as_str()).collect();
        let normalized = self.normalizer.normalize_all(&texts);

        let scored: Vec<ScoredReview> = reviews
            .par_iter()
            .zip(normalized.par_iter())
            .map(|(review, norm)| ScoredReview {
                id: review.id.clone(),
                text: review.text.clone(),
                tokens: norm.tokens.clone(),
                compound: self.lexicon.score(&norm.tokens).compound,
            })
            .collect();

        let refiner = match &self.refiner {
            Some(refiner) => Arc::clone(refiner),
            None => self.train_refiner(&scored),
        };

        let resolver = HybridResolver::new(
            self.gate,
            self.config.sentiment.batch_size,
            self.config.sentiment.workers,
        );
        let resolutions = resolver.resolve(&scored, refiner.as_ref())?;

        Ok(SentimentStage {
            normalized,
            resolutions,
        })
    }

    /// Train the run's refiner on the reviews the gate accepts
    fn train_refiner(&self, scored: &[ScoredReview]) -> Arc<dyn Refiner> {
        let settings = &self.config.sentiment;
        if settings.refiner == RefinerKind::Disabled {
            return Arc::new(UnavailableRefiner::new("refiner disabled"));
        }

        let mut documents = Vec::new();
        let mut labels = Vec::new();
        for review in scored {
            let label = match self.gate.evaluate(review.compound) {
                GateDecision::Accepted(SentimentLabel::Positive) => BinarySentiment::Positive,
                GateDecision::Accepted(SentimentLabel::Negative) => BinarySentiment::Negative,
                _ => continue,
            };
            documents.push(review.tokens.clone());
            labels.push(label);
        }

        match NaiveBayesRefiner::train(
            &documents,
            &labels,
            settings.nb_alpha,
            settings.min_training_examples,
        ) {
            Ok(refiner) => {
                info!(
                    examples = documents.len(),
                    vocabulary = refiner.classifier().vocab_size(),
                    "Refiner trained"
                );
                Arc::new(refiner)
            }
            Err(e) => {
                warn!(error = %e, "Refiner unavailable, gated reviews use threshold fallback");
                Arc::new(UnavailableRefiner::new(e.to_string()))
            }
        }
    }

    /// Aspects per review id; reviews with empty normalized text get none
    fn extract_aspects(
        &self,
        reviews: &[Review],
        normalized: &[NormalizedText],
    ) -> HashMap<String, AspectOutcome> {
        let Some(extractor) = &self.aspect_extractor else {
            return HashMap::new();
        };

        let (ids, texts): (Vec<&str>, Vec<&str>) = reviews
            .iter()
            .zip(normalized)
            .filter(|(_, norm)| !norm.is_empty())
            .map(|(review, _)| (review.id.as_str(), review.text.as_str()))
            .unzip();

        let outcomes = extract_all(extractor.as_ref(), &texts, self.config.aspects.batch_size);
        ids.into_iter()
            .map(String::from)
            .zip(outcomes)
            .collect()
    }
}

/// Keep the first review per id
///
/// Later repeats are returned as [`IngestError::DuplicateId`], with `line`
/// holding the 1-based position in `reviews`.
fn drop_duplicate_ids(reviews: &[Review]) -> (Cow<'_, [Review]>, Vec<IngestError>) {
    let mut seen = HashSet::with_capacity(reviews.len());
    let duplicates: Vec<usize> = reviews
        .iter()
        .enumerate()
        .filter(|&(_, review)| !seen.insert(review.id.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    if duplicates.is_empty() {
        return (Cow::Borrowed(reviews), Vec::new());
    }

    let errors: Vec<IngestError> = duplicates
        .iter()
        .map(|&idx| IngestError::DuplicateId {
            line: idx as u64 + 1,
            id: reviews[idx].id.clone(),
        })
        .collect();
    for error in &errors {
        warn!(error = %error, "Skipping review");
    }

    let dropped: HashSet<usize> = duplicates.into_iter().collect();
    let kept = reviews
        .iter()
        .enumerate()
        .filter(|(idx, _)| !dropped.contains(idx))
        .map(|(_, review)| review.clone())
        .collect();
    (Cow::Owned(kept), errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::sentiment::{RefinedLabel, RefinerInput, SentimentSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Labels everything Positive and counts calls per review
    struct CountingRefiner {
        calls: AtomicUsize,
    }

    impl Refiner for CountingRefiner {
        fn name(&self) -> &str {
            "counting"
        }

        fn classify(&self, batch: &[RefinerInput<'_>]) -> std::result::Result<Vec<RefinedLabel>, ModelError> {
            self.calls.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(batch
                .iter()
                .map(|_| RefinedLabel {
                    label: BinarySentiment::Positive,
                    confidence: 0.9,
                })
                .collect())
        }
    }

    fn reviews() -> Vec<Review> {
        vec![
            Review::new("r1", "Excellent service, amazing and fast delivery").with_rating(5),
            Review::new("r2", "Booked cylinder yesterday").with_rating(3),
            Review::new("r3", "Worst app, OTP failed, terrible and useless").with_rating(1),
            Review::new("r4", "!!! ???"),
        ]
    }

    #[test]
    fn test_run_keeps_every_review() {
        let refiner = Arc::new(CountingRefiner {
            calls: AtomicUsize::new(0),
        });
        let pipeline = Pipeline::new(Config::default()).with_refiner(refiner.clone());

        let output = pipeline.run(&reviews()).unwrap();

        let ids: Vec<&str> = output.records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3", "r4"]);
        assert_eq!(output.records[0].label(), SentimentLabel::Positive);
        assert_eq!(output.records[0].sentiment.source, SentimentSource::RuleBased);
        assert_eq!(output.records[2].label(), SentimentLabel::Negative);
        assert_eq!(output.records[1].sentiment.source, SentimentSource::Refined);
        // r4 normalizes to nothing and never reaches the refiner
        assert_eq!(refiner.calls.load(Ordering::SeqCst), 1);

        let empty = &output.records[3];
        assert_eq!(empty.label(), SentimentLabel::Neutral);
        assert_eq!(empty.sentiment.source, SentimentSource::Fallback);
        assert!(empty.topic.is_none());
        assert!(empty.aspects.is_empty());
        assert!(!empty.aspects_degraded);
    }

    #[test]
    fn test_without_refiner_degrades_gated_reviews() {
        let pipeline = Pipeline::new(Config::default()).without_refiner();
        let output = pipeline.run(&reviews()).unwrap();

        let gated = &output.records[1];
        assert_eq!(gated.label(), SentimentLabel::Neutral);
        assert!(gated.sentiment_degraded());
        assert_eq!(output.summary.sentiment_degraded, 2);
        assert_eq!(output.evaluation.match_rate, 1.0);
    }

    #[test]
    fn test_trained_refiner_falls_back_without_both_classes() {
        let pipeline = Pipeline::new(Config::default());
        let output = pipeline.run(&reviews()).unwrap();

        // One confident example per class is below the training minimum
        assert!(output.records[1].sentiment_degraded());
    }

    #[test]
    fn test_aspects_disabled() {
        let mut config = Config::default();
        config.aspects.enabled = false;
        let output = Pipeline::new(config).without_refiner().run(&reviews()).unwrap();

        assert!(output.records.iter().all(|r| r.aspects.is_empty() && !r.aspects_degraded));
    }

    #[test]
    fn test_drop_duplicate_ids_keeps_first() {
        let reviews = vec![
            Review::new("a", "first"),
            Review::new("b", "other"),
            Review::new("a", "second"),
        ];

        let (kept, errors) = drop_duplicate_ids(&reviews);

        let texts: Vec<&str> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "other"]);
        assert_eq!(
            errors,
            vec![IngestError::DuplicateId {
                line: 3,
                id: "a".into()
            }]
        );
        assert!(matches!(drop_duplicate_ids(&reviews[..2]).0, Cow::Borrowed(_)));
    }

    #[test]
    fn test_evaluation_counts_rated_reviews() {
        let output = Pipeline::new(Config::default())
            .without_refiner()
            .run(&reviews())
            .unwrap();

        assert_eq!(output.evaluation.n_total, 4);
        assert_eq!(output.evaluation.n_rated, 3);
    }
}
