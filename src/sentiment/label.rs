//! Sentiment labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final sentiment label of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// All labels in report order
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    /// Map a compound score to a label using symmetric thresholds
    ///
    /// `>= threshold` is Positive, `<= -threshold` is Negative, anything in
    /// between is Neutral.
    pub fn from_compound(compound: f64, threshold: f64) -> Self {
        if compound >= threshold {
            SentimentLabel::Positive
        } else if compound <= -threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Positive => "Positive",
        }
    }

    /// Position in [`SentimentLabel::ALL`]
    pub fn index(&self) -> usize {
        match self {
            SentimentLabel::Negative => 0,
            SentimentLabel::Neutral => 1,
            SentimentLabel::Positive => 2,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-class output of the refiner
///
/// The refiner has no neutral class, so this type cannot express one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinarySentiment {
    Negative,
    Positive,
}

impl From<BinarySentiment> for SentimentLabel {
    fn from(value: BinarySentiment) -> Self {
        match value {
            BinarySentiment::Negative => SentimentLabel::Negative,
            BinarySentiment::Positive => SentimentLabel::Positive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_compound_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.05, 0.05), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(-0.05, 0.05), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_compound(0.049, 0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(0.0, 0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.9, 0.05), SentimentLabel::Negative);
    }

    #[test]
    fn test_binary_never_neutral() {
        assert_eq!(SentimentLabel::from(BinarySentiment::Positive), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from(BinarySentiment::Negative), SentimentLabel::Negative);
    }

    #[test]
    fn test_index_matches_all() {
        for (i, label) in SentimentLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }
}
