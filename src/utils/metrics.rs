//! Classification metrics against star ratings
//!
//! Ratings are bucketed into a noisy ground truth (1-2 Negative, 3 Neutral,
//! 4-5 Positive). The bucketing exists only for reporting and never feeds
//! back into the sentiment decision.

use crate::sentiment::SentimentLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ground-truth label of a star rating
pub fn rating_bucket(rating: u8) -> Option<SentimentLabel> {
    match rating {
        1 | 2 => Some(SentimentLabel::Negative),
        3 => Some(SentimentLabel::Neutral),
        4 | 5 => Some(SentimentLabel::Positive),
        _ => None,
    }
}

/// One review as seen by the evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSample {
    pub rating: Option<u8>,
    /// Final label of the hybrid resolver
    pub predicted: SentimentLabel,
    /// Label from the compound thresholds alone
    pub rule_based: SentimentLabel,
}

/// Per-class precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// 3x3 confusion matrix, rows = rating bucket, columns = predicted label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; 3]; 3],
}

impl ConfusionMatrix {
    pub fn add(&mut self, actual: SentimentLabel, predicted: SentimentLabel) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    pub fn get(&self, actual: SentimentLabel, predicted: SentimentLabel) -> usize {
        self.counts[actual.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Diagonal share; 0 for an empty matrix
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..3).map(|i| self.counts[i][i]).sum();
        correct as f64 / total as f64
    }

    /// precision = TP / (TP + FP)
    pub fn precision(&self, class: SentimentLabel) -> f64 {
        let c = class.index();
        let predicted: usize = (0..3).map(|row| self.counts[row][c]).sum();
        ratio(self.counts[c][c], predicted)
    }

    /// recall = TP / (TP + FN)
    pub fn recall(&self, class: SentimentLabel) -> f64 {
        let c = class.index();
        ratio(self.counts[c][c], self.support(class))
    }

    /// F1 = 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self, class: SentimentLabel) -> f64 {
        let precision = self.precision(class);
        let recall = self.recall(class);
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    /// Number of samples whose actual label is `class`
    pub fn support(&self, class: SentimentLabel) -> usize {
        self.counts[class.index()].iter().sum()
    }

    pub fn class_metrics(&self, class: SentimentLabel) -> ClassMetrics {
        ClassMetrics {
            precision: self.precision(class),
            recall: self.recall(class),
            f1_score: self.f1_score(class),
            support: self.support(class),
        }
    }

    /// Rows as nested vectors in [`SentimentLabel::ALL`] order
    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        self.counts.iter().map(|row| row.to_vec()).collect()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Contents of the metrics artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub labels: Vec<String>,
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Agreement with the rating bucket, over rated reviews
    pub accuracy: f64,
    /// Agreement between the final label and the compound-threshold label
    pub match_rate: f64,
    /// Keyed by lowercase label plus "macro avg" and "weighted avg"
    pub classification_report: BTreeMap<String, ClassMetrics>,
    /// Reviews with a usable rating
    pub n_rated: usize,
    pub n_total: usize,
}

impl EvaluationReport {
    /// Build the report from every review of a run
    pub fn from_samples(samples: &[EvaluationSample]) -> Self {
        let mut matrix = ConfusionMatrix::default();
        for sample in samples {
            if let Some(actual) = sample.rating.and_then(rating_bucket) {
                matrix.add(actual, sample.predicted);
            }
        }

        let matches = samples
            .iter()
            .filter(|s| s.predicted == s.rule_based)
            .count();

        let mut classification_report = BTreeMap::new();
        let per_class: Vec<ClassMetrics> = SentimentLabel::ALL
            .iter()
            .map(|&label| matrix.class_metrics(label))
            .collect();
        for (label, metrics) in SentimentLabel::ALL.iter().zip(&per_class) {
            classification_report.insert(label.as_str().to_lowercase(), *metrics);
        }

        let n_rated = matrix.total();
        let n_classes = per_class.len() as f64;
        classification_report.insert(
            "macro avg".to_string(),
            ClassMetrics {
                precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n_classes,
                recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n_classes,
                f1_score: per_class.iter().map(|m| m.f1_score).sum::<f64>() / n_classes,
                support: n_rated,
            },
        );
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if n_rated == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|m| f(m) * m.support as f64)
                    .sum::<f64>()
                    / n_rated as f64
            }
        };
        classification_report.insert(
            "weighted avg".to_string(),
            ClassMetrics {
                precision: weighted(|m| m.precision),
                recall: weighted(|m| m.recall),
                f1_score: weighted(|m| m.f1_score),
                support: n_rated,
            },
        );

        Self {
            labels: SentimentLabel::ALL
                .iter()
                .map(|l| l.as_str().to_string())
                .collect(),
            confusion_matrix: matrix.to_rows(),
            accuracy: matrix.accuracy(),
            match_rate: ratio(matches, samples.len()),
            classification_report,
            n_rated,
            n_total: samples.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use SentimentLabel::*;

    fn sample(rating: Option<u8>, predicted: SentimentLabel, rule_based: SentimentLabel) -> EvaluationSample {
        EvaluationSample {
            rating,
            predicted,
            rule_based,
        }
    }

    #[test]
    fn test_rating_buckets() {
        assert_eq!(rating_bucket(1), Some(Negative));
        assert_eq!(rating_bucket(2), Some(Negative));
        assert_eq!(rating_bucket(3), Some(Neutral));
        assert_eq!(rating_bucket(5), Some(Positive));
        assert_eq!(rating_bucket(0), None);
        assert_eq!(rating_bucket(6), None);
    }

    #[test]
    fn test_confusion_matrix_metrics() {
        let mut matrix = ConfusionMatrix::default();
        matrix.add(Positive, Positive);
        matrix.add(Positive, Positive);
        matrix.add(Positive, Negative);
        matrix.add(Negative, Negative);

        assert_eq!(matrix.total(), 4);
        assert_abs_diff_eq!(matrix.accuracy(), 0.75);
        assert_abs_diff_eq!(matrix.precision(Positive), 1.0);
        assert_abs_diff_eq!(matrix.recall(Positive), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(matrix.precision(Negative), 0.5);
        assert_eq!(matrix.support(Neutral), 0);
        assert_eq!(matrix.f1_score(Neutral), 0.0);
    }

    #[test]
    fn test_report_from_samples() {
        let samples = vec![
            sample(Some(5), Positive, Positive),
            sample(Some(3), Positive, Neutral),
            sample(Some(1), Negative, Negative),
            sample(None, Negative, Negative),
        ];

        let report = EvaluationReport::from_samples(&samples);

        assert_eq!(report.labels, vec!["Negative", "Neutral", "Positive"]);
        assert_eq!(report.n_rated, 3);
        assert_eq!(report.n_total, 4);
        assert_abs_diff_eq!(report.accuracy, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(report.match_rate, 0.75);
        assert_eq!(report.confusion_matrix[1], vec![0, 0, 1]);
        assert_eq!(report.classification_report["positive"].support, 1);
        assert!(report.classification_report.contains_key("weighted avg"));
    }

    #[test]
    fn test_report_json_uses_sklearn_keys() {
        let report = EvaluationReport::from_samples(&[sample(Some(4), Positive, Positive)]);
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["classification_report"]["positive"]["f1-score"].is_number());
        assert_eq!(json["confusion_matrix"][2][2], 1);
    }

    #[test]
    fn test_empty_report() {
        let report = EvaluationReport::from_samples(&[]);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.match_rate, 0.0);
        assert_eq!(report.n_total, 0);
    }
}
