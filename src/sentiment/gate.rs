//! # Confidence Gate
//!
//! Decides whether a rule-based compound score is trusted as-is or has to be
//! sent to the refiner.

use super::label::SentimentLabel;
use serde::{Deserialize, Serialize};

/// Default gate: compounds strictly above this magnitude are accepted
pub const DEFAULT_GATE_THRESHOLD: f64 = 0.60;

/// Default labeling threshold for compound scores
pub const DEFAULT_LABEL_THRESHOLD: f64 = 0.05;

/// Outcome of the gate for one scored review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The rule-based label is final
    Accepted(SentimentLabel),
    /// The review has to go through the refiner
    NeedsRefinement,
}

/// Where the final label of a review came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentSource {
    /// Accepted by the gate, label mapped from the compound score
    RuleBased,
    /// Label returned by the refiner
    Refined,
    /// Refiner was unavailable; label mapped from the compound score
    Fallback,
}

impl SentimentSource {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentSource::RuleBased => "rule_based",
            SentimentSource::Refined => "refined",
            SentimentSource::Fallback => "fallback",
        }
    }
}

/// Confidence gate with its labeling thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    /// Magnitude a compound must exceed to be accepted
    threshold: f64,
    /// Symmetric threshold used to label a compound
    label_threshold: f64,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new(DEFAULT_GATE_THRESHOLD, DEFAULT_LABEL_THRESHOLD)
    }
}

impl ConfidenceGate {
    /// Create a gate with explicit thresholds
    pub fn new(threshold: f64, label_threshold: f64) -> Self {
        Self {
            threshold,
            label_threshold,
        }
    }

    /// Gate threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Labeling threshold
    pub fn label_threshold(&self) -> f64 {
        self.label_threshold
    }

    /// Label a compound score directly
    pub fn label_for(&self, compound: f64) -> SentimentLabel {
        SentimentLabel::from_compound(compound, self.label_threshold)
    }

    /// Route a compound score
    ///
    /// The comparison is strict: a compound whose magnitude equals the
    /// threshold goes to refinement.
    pub fn evaluate(&self, compound: f64) -> GateDecision {
        if compound.abs() > self.threshold {
            GateDecision::Accepted(self.label_for(compound))
        } else {
            GateDecision::NeedsRefinement
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_scores_are_accepted() {
        let gate = ConfidenceGate::default();
        assert_eq!(gate.evaluate(0.8), GateDecision::Accepted(SentimentLabel::Positive));
        assert_eq!(gate.evaluate(-0.7), GateDecision::Accepted(SentimentLabel::Negative));
    }

    #[test]
    fn test_boundary_is_strict() {
        let gate = ConfidenceGate::default();
        assert_eq!(gate.evaluate(0.60), GateDecision::NeedsRefinement);
        assert_eq!(gate.evaluate(-0.60), GateDecision::NeedsRefinement);
        assert_eq!(
            gate.evaluate(0.6000001),
            GateDecision::Accepted(SentimentLabel::Positive)
        );
        assert_eq!(
            gate.evaluate(-0.6000001),
            GateDecision::Accepted(SentimentLabel::Negative)
        );
    }

    #[test]
    fn test_weak_scores_need_refinement() {
        let gate = ConfidenceGate::default();
        assert_eq!(gate.evaluate(0.02), GateDecision::NeedsRefinement);
        assert_eq!(gate.evaluate(0.0), GateDecision::NeedsRefinement);
    }

    #[test]
    fn test_label_for() {
        let gate = ConfidenceGate::default();
        assert_eq!(gate.label_for(0.02), SentimentLabel::Neutral);
        assert_eq!(gate.label_for(0.3), SentimentLabel::Positive);
        assert_eq!(gate.label_for(-0.3), SentimentLabel::Negative);
    }
}
