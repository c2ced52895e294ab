//! Quality measures for fitted topic models

use ndarray::Array2;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Topic model evaluation over a document-term matrix
#[derive(Debug, Clone)]
pub struct Evaluator {
    /// Document-term matrix for co-occurrence counts
    dtm: Array2<f64>,
    /// Column term -> index
    vocabulary: HashMap<String, usize>,
}

impl Evaluator {
    /// Create an evaluator for the corpus a model was fitted on
    pub fn new(dtm: Array2<f64>, terms: &[String]) -> Self {
        let vocabulary = terms
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        Self { dtm, vocabulary }
    }

    /// UMass coherence of a topic's top words
    ///
    /// Uses document co-occurrence. Higher (less negative) values indicate
    /// more coherent topics. `None` when fewer than two words are known.
    pub fn umass_coherence(&self, top_words: &[String]) -> Option<f64> {
        let word_indices: Vec<usize> = top_words
            .iter()
            .filter_map(|w| self.vocabulary.get(w).copied())
            .collect();

        if word_indices.len() < 2 {
            return None;
        }

        let doc_count = |col: usize| self.dtm.column(col).iter().filter(|&&x| x > 0.0).count();
        let epsilon = 1.0;
        let mut coherence = 0.0;
        let mut pair_count = 0;

        for (i, &w1) in word_indices.iter().enumerate() {
            for &w2 in word_indices.iter().skip(i + 1) {
                let d_w2 = doc_count(w2) as f64;
                if d_w2 == 0.0 {
                    continue;
                }
                let d_both = self
                    .dtm
                    .outer_iter()
                    .filter(|row| row[w1] > 0.0 && row[w2] > 0.0)
                    .count() as f64;

                coherence += ((d_both + epsilon) / d_w2).ln();
                pair_count += 1;
            }
        }

        if pair_count > 0 {
            Some(coherence / pair_count as f64)
        } else {
            None
        }
    }

    /// Share of unique words across all topics' top words
    ///
    /// 1.0 means no two topics share a top word.
    pub fn topic_diversity(topics: &[Vec<String>]) -> f64 {
        let all_words: Vec<&str> = topics.iter().flatten().map(|s| s.as_str()).collect();
        if all_words.is_empty() {
            return 0.0;
        }
        let unique_words: HashSet<&str> = all_words.iter().copied().collect();
        unique_words.len() as f64 / all_words.len() as f64
    }

    /// Jaccard similarity between two topics' word sets
    pub fn topic_overlap(topic1: &[String], topic2: &[String]) -> f64 {
        let set1: HashSet<&str> = topic1.iter().map(|s| s.as_str()).collect();
        let set2: HashSet<&str> = topic2.iter().map(|s| s.as_str()).collect();

        let union = set1.union(&set2).count();
        if union == 0 {
            return 0.0;
        }
        set1.intersection(&set2).count() as f64 / union as f64
    }

    /// Mean Jaccard overlap over all topic pairs
    pub fn mean_pairwise_overlap(topics: &[Vec<String>]) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0;
        for i in 0..topics.len() {
            for j in (i + 1)..topics.len() {
                total += Self::topic_overlap(&topics[i], &topics[j]);
                pairs += 1;
            }
        }
        if pairs == 0 {
            0.0
        } else {
            total / pairs as f64
        }
    }
}

/// Summary statistics for a fitted topic model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub n_topics: usize,
    /// Documents the model was fitted on
    pub n_documents: usize,
    pub vocabulary_size: usize,
    pub avg_coherence: Option<f64>,
    pub diversity: f64,
    pub mean_overlap: f64,
    pub topic_coherences: Vec<Option<f64>>,
}

impl ModelSummary {
    /// Summarize a model from its topics' top words
    pub fn from_topics(topics: &[Vec<String>], evaluator: &Evaluator) -> Self {
        let topic_coherences: Vec<Option<f64>> = topics
            .iter()
            .map(|words| evaluator.umass_coherence(words))
            .collect();

        let values: Vec<f64> = topic_coherences.iter().filter_map(|&c| c).collect();
        let avg_coherence = if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        };

        Self {
            n_topics: topics.len(),
            n_documents: evaluator.dtm.nrows(),
            vocabulary_size: evaluator.dtm.ncols(),
            avg_coherence,
            diversity: Evaluator::topic_diversity(topics),
            mean_overlap: Evaluator::mean_pairwise_overlap(topics),
            topic_coherences,
        }
    }

    /// Log the summary under a model name
    pub fn log(&self, model: &str) {
        info!(
            model,
            n_topics = self.n_topics,
            n_documents = self.n_documents,
            vocabulary = self.vocabulary_size,
            avg_coherence = self.avg_coherence,
            diversity = self.diversity,
            mean_overlap = self.mean_overlap,
            "Topic model summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_topic_diversity() {
        let distinct = vec![words(&["otp", "login"]), words(&["cylinder", "delivery"])];
        assert_eq!(Evaluator::topic_diversity(&distinct), 1.0);

        let shared = vec![words(&["otp", "login"]), words(&["otp", "refund"])];
        assert_abs_diff_eq!(Evaluator::topic_diversity(&shared), 0.75);
        assert_eq!(Evaluator::topic_diversity(&[]), 0.0);
    }

    #[test]
    fn test_topic_overlap() {
        let overlap = Evaluator::topic_overlap(&words(&["otp", "login"]), &words(&["otp", "refund"]));
        assert_abs_diff_eq!(overlap, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_umass_coherence_prefers_cooccurring_words() {
        let dtm = Array2::from_shape_vec(
            (4, 3),
            vec![1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        )
        .unwrap();
        let evaluator = Evaluator::new(dtm, &words(&["otp", "login", "cylinder"]));

        let together = evaluator.umass_coherence(&words(&["otp", "login"])).unwrap();
        let apart = evaluator.umass_coherence(&words(&["login", "cylinder"])).unwrap();
        assert!(together > apart);
        assert_eq!(evaluator.umass_coherence(&words(&["otp", "unknown"])), None);
    }

    #[test]
    fn test_model_summary() {
        let dtm = Array2::from_shape_vec((2, 2), vec![1.0, 1.0, 1.0, 0.0]).unwrap();
        let evaluator = Evaluator::new(dtm, &words(&["a", "b"]));
        let summary = ModelSummary::from_topics(&[words(&["a", "b"]), words(&["b", "a"])], &evaluator);

        assert_eq!(summary.n_topics, 2);
        assert_eq!(summary.n_documents, 2);
        assert_eq!(summary.diversity, 0.5);
        assert_eq!(summary.mean_overlap, 1.0);
        assert!(summary.avg_coherence.is_some());
    }
}
