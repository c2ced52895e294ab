//! # Hybrid Sentiment Resolver
//!
//! Routes every scored review through the confidence gate. Accepted reviews
//! keep their rule-based label; the rest are sent to the refiner in bounded
//! batches on a dedicated worker pool. A batch the refiner cannot handle
//! falls back to the compound-threshold label and is flagged degraded.

use super::gate::{ConfidenceGate, GateDecision, SentimentSource};
use super::label::SentimentLabel;
use super::refiner::{Refiner, RefinerInput};
use crate::error::{PipelineError, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Default number of reviews per refiner call
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// A review after normalization and rule-based scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReview {
    pub id: String,
    pub text: String,
    pub tokens: Vec<String>,
    pub compound: f64,
}

/// Final sentiment of one review
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub label: SentimentLabel,
    pub compound: f64,
    pub source: SentimentSource,
    /// Confidence reported by the refiner, when it was consulted successfully
    pub refiner_confidence: Option<f64>,
}

impl Resolution {
    /// True when the refinement step was skipped
    pub fn is_degraded(&self) -> bool {
        self.source == SentimentSource::Fallback
    }
}

/// Gate + refiner combined into one decision procedure
#[derive(Debug, Clone)]
pub struct HybridResolver {
    gate: ConfidenceGate,
    batch_size: usize,
    workers: usize,
}

impl Default for HybridResolver {
    fn default() -> Self {
        Self::new(ConfidenceGate::default(), DEFAULT_BATCH_SIZE, 0)
    }
}

impl HybridResolver {
    /// Create a resolver
    ///
    /// `workers == 0` sizes the pool to the number of logical CPUs. A zero
    /// batch size is treated as one.
    pub fn new(gate: ConfidenceGate, batch_size: usize, workers: usize) -> Self {
        Self {
            gate,
            batch_size: batch_size.max(1),
            workers,
        }
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolve a whole run, keyed by review id
    ///
    /// The refiner sees each gated review with tokens exactly once. A gated
    /// review whose normalized text is empty takes the threshold fallback
    /// directly. Only a failure to build the worker pool is returned as an
    /// error.
    pub fn resolve(
        &self,
        reviews: &[ScoredReview],
        refiner: &dyn Refiner,
    ) -> Result<HashMap<String, Resolution>> {
        let mut resolved = HashMap::with_capacity(reviews.len());
        let mut pending: Vec<&ScoredReview> = Vec::new();
        let mut empty = 0usize;

        for review in reviews {
            match self.gate.evaluate(review.compound) {
                GateDecision::Accepted(label) => {
                    resolved.insert(
                        review.id.clone(),
                        Resolution {
                            label,
                            compound: review.compound,
                            source: SentimentSource::RuleBased,
                            refiner_confidence: None,
                        },
                    );
                }
                GateDecision::NeedsRefinement if review.tokens.is_empty() => {
                    resolved.insert(review.id.clone(), self.fallback(review.compound));
                    empty += 1;
                }
                GateDecision::NeedsRefinement => pending.push(review),
            }
        }

        if empty > 0 {
            debug!(reviews = empty, "Empty normalized text, refiner skipped");
        }
        debug!(
            accepted = resolved.len() - empty,
            pending = pending.len(),
            "Confidence gate applied"
        );

        if pending.is_empty() {
            return Ok(resolved);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;

        let batches: Vec<Vec<(String, Resolution)>> = pool.install(|| {
            pending
                .par_chunks(self.batch_size)
                .map(|chunk| self.resolve_batch(chunk, refiner))
                .collect()
        });

        for (id, resolution) in batches.into_iter().flatten() {
            resolved.insert(id, resolution);
        }

        Ok(resolved)
    }

    /// Resolve one refiner batch, falling back for the whole batch on error
    fn resolve_batch(
        &self,
        chunk: &[&ScoredReview],
        refiner: &dyn Refiner,
    ) -> Vec<(String, Resolution)> {
        let inputs: Vec<RefinerInput<'_>> = chunk
            .iter()
            .map(|review| RefinerInput {
                id: &review.id,
                text: &review.text,
                tokens: &review.tokens,
            })
            .collect();

        match refiner.classify(&inputs) {
            Ok(labels) if labels.len() == chunk.len() => chunk
                .iter()
                .zip(labels)
                .map(|(review, refined)| {
                    (
                        review.id.clone(),
                        Resolution {
                            label: refined.label.into(),
                            compound: review.compound,
                            source: SentimentSource::Refined,
                            refiner_confidence: Some(refined.confidence),
                        },
                    )
                })
                .collect(),
            Ok(labels) => {
                warn!(
                    refiner = refiner.name(),
                    expected = chunk.len(),
                    got = labels.len(),
                    "Refiner returned a short batch, using threshold fallback"
                );
                self.fallback_batch(chunk)
            }
            Err(e) => {
                warn!(
                    refiner = refiner.name(),
                    batch = chunk.len(),
                    error = %e,
                    "Refiner failed, using threshold fallback"
                );
                self.fallback_batch(chunk)
            }
        }
    }

    fn fallback_batch(&self, chunk: &[&ScoredReview]) -> Vec<(String, Resolution)> {
        chunk
            .iter()
            .map(|review| (review.id.clone(), self.fallback(review.compound)))
            .collect()
    }

    /// Degraded resolution from the compound score alone
    pub fn fallback(&self, compound: f64) -> Resolution {
        Resolution {
            label: self.gate.label_for(compound),
            compound,
            source: SentimentSource::Fallback,
            refiner_confidence: None,
        }
    }
}
