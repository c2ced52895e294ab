//! Multinomial naive Bayes refiner
//!
//! A self-trained stand-in for a pretrained transformer: it learns from the
//! reviews the confidence gate accepted as clearly Positive or Negative and
//! classifies the ambiguous rest.

use super::label::BinarySentiment;
use super::refiner::{RefinedLabel, Refiner, RefinerInput};
use crate::error::ModelError;
use std::collections::{HashMap, HashSet};

/// Multinomial naive Bayes classifier over two classes
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    /// Log prior per class
    class_log_priors: HashMap<BinarySentiment, f64>,
    /// Log P(word|class) per class
    word_log_probs: HashMap<BinarySentiment, HashMap<String, f64>>,
    /// Vocabulary size seen during training
    vocab_size: usize,
    /// Laplace smoothing
    alpha: f64,
}

impl NaiveBayesClassifier {
    /// Train the classifier
    ///
    /// # Arguments
    /// * `documents` - Tokenized documents
    /// * `labels` - Class of each document
    /// * `alpha` - Laplace smoothing
    pub fn fit(
        documents: &[Vec<String>],
        labels: &[BinarySentiment],
        alpha: f64,
    ) -> Result<Self, ModelError> {
        if documents.len() != labels.len() {
            return Err(ModelError::Unavailable(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }

        let mut class_counts: HashMap<BinarySentiment, usize> = HashMap::new();
        for label in labels {
            *class_counts.entry(*label).or_insert(0) += 1;
        }

        let vocabulary: HashSet<&String> = documents.iter().flatten().collect();
        let vocab_size = vocabulary.len() as f64;
        let total_docs = labels.len() as f64;

        let mut class_word_counts: HashMap<BinarySentiment, HashMap<&String, usize>> =
            HashMap::new();
        let mut class_total_words: HashMap<BinarySentiment, usize> = HashMap::new();

        for (doc, label) in documents.iter().zip(labels.iter()) {
            let word_counts = class_word_counts.entry(*label).or_default();
            let total = class_total_words.entry(*label).or_insert(0);
            for word in doc {
                *word_counts.entry(word).or_insert(0) += 1;
                *total += 1;
            }
        }

        let mut class_log_priors = HashMap::new();
        let mut word_log_probs = HashMap::new();

        for (class, count) in &class_counts {
            class_log_priors.insert(*class, (*count as f64 / total_docs).ln());

            let total_words = class_total_words.get(class).copied().unwrap_or(0) as f64;
            let word_counts = class_word_counts.get(class);
            let mut probs = HashMap::with_capacity(vocabulary.len());

            for word in &vocabulary {
                let count = word_counts
                    .and_then(|counts| counts.get(*word))
                    .copied()
                    .unwrap_or(0) as f64;
                // P(word|class) = (count + alpha) / (total + alpha * vocab_size)
                let prob = (count + alpha) / (total_words + alpha * vocab_size);
                probs.insert((*word).clone(), prob.ln());
            }

            word_log_probs.insert(*class, probs);
        }

        Ok(Self {
            class_log_priors,
            word_log_probs,
            vocab_size: vocabulary.len(),
            alpha,
        })
    }

    /// Posterior probability of each class for a document
    pub fn predict_proba(&self, document: &[String]) -> HashMap<BinarySentiment, f64> {
        let mut scores: HashMap<BinarySentiment, f64> = HashMap::new();

        for (class, log_prior) in &self.class_log_priors {
            let mut log_prob = *log_prior;
            if let Some(word_probs) = self.word_log_probs.get(class) {
                for word in document {
                    // Unknown words carry no evidence
                    if let Some(&log_word_prob) = word_probs.get(word) {
                        log_prob += log_word_prob;
                    }
                }
            }
            scores.insert(*class, log_prob);
        }

        // Softmax back into probabilities
        let max_score = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
        let sum_exp: f64 = scores.values().map(|s| (s - max_score).exp()).sum();
        for score in scores.values_mut() {
            *score = (*score - max_score).exp() / sum_exp;
        }

        scores
    }

    /// Predict the most likely class with its probability
    ///
    /// Exact ties resolve to Negative.
    pub fn predict(&self, document: &[String]) -> Option<(BinarySentiment, f64)> {
        let probs = self.predict_proba(document);
        let negative = probs.get(&BinarySentiment::Negative).copied();
        let positive = probs.get(&BinarySentiment::Positive).copied();

        match (negative, positive) {
            (Some(n), Some(p)) if p > n => Some((BinarySentiment::Positive, p)),
            (Some(n), Some(_)) => Some((BinarySentiment::Negative, n)),
            (Some(n), None) => Some((BinarySentiment::Negative, n)),
            (None, Some(p)) => Some((BinarySentiment::Positive, p)),
            (None, None) => None,
        }
    }

    /// Vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Smoothing parameter
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// Refiner backed by a naive Bayes classifier trained on gate-accepted reviews
#[derive(Debug, Clone)]
pub struct NaiveBayesRefiner {
    classifier: NaiveBayesClassifier,
}

impl NaiveBayesRefiner {
    /// Train the refiner
    ///
    /// Fails with [`ModelError::Unavailable`] unless both classes have at
    /// least `min_examples` documents.
    pub fn train(
        documents: &[Vec<String>],
        labels: &[BinarySentiment],
        alpha: f64,
        min_examples: usize,
    ) -> Result<Self, ModelError> {
        for class in [BinarySentiment::Negative, BinarySentiment::Positive] {
            let count = labels.iter().filter(|l| **l == class).count();
            if count < min_examples.max(1) {
                return Err(ModelError::Unavailable(format!(
                    "only {} {:?} training examples (need {})",
                    count,
                    class,
                    min_examples.max(1)
                )));
            }
        }

        let classifier = NaiveBayesClassifier::fit(documents, labels, alpha)?;
        Ok(Self { classifier })
    }

    /// Underlying classifier
    pub fn classifier(&self) -> &NaiveBayesClassifier {
        &self.classifier
    }
}

impl Refiner for NaiveBayesRefiner {
    fn name(&self) -> &str {
        "naive_bayes"
    }

    fn classify(&self, batch: &[RefinerInput<'_>]) -> Result<Vec<RefinedLabel>, ModelError> {
        batch
            .iter()
            .map(|input| {
                self.classifier
                    .predict(input.tokens)
                    .map(|(label, confidence)| RefinedLabel { label, confidence })
                    .ok_or_else(|| ModelError::Resource("classifier has no classes".into()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    fn training_set() -> (Vec<Vec<String>>, Vec<BinarySentiment>) {
        let documents = vec![
            doc("great delivery fast booking"),
            doc("excellent service smooth payment"),
            doc("love booking easy"),
            doc("payment failed money deducted"),
            doc("otp not received login failed"),
            doc("worst service delivery late"),
        ];
        let labels = vec![
            BinarySentiment::Positive,
            BinarySentiment::Positive,
            BinarySentiment::Positive,
            BinarySentiment::Negative,
            BinarySentiment::Negative,
            BinarySentiment::Negative,
        ];
        (documents, labels)
    }

    #[test]
    fn test_predicts_training_vocabulary() {
        let (documents, labels) = training_set();
        let refiner = NaiveBayesRefiner::train(&documents, &labels, 1.0, 1).unwrap();

        let positive = refiner.classifier().predict(&doc("smooth easy booking")).unwrap();
        let negative = refiner.classifier().predict(&doc("otp failed")).unwrap();

        assert_eq!(positive.0, BinarySentiment::Positive);
        assert_eq!(negative.0, BinarySentiment::Negative);
        assert!(positive.1 > 0.5 && positive.1 <= 1.0);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (documents, labels) = training_set();
        let classifier = NaiveBayesClassifier::fit(&documents, &labels, 1.0).unwrap();
        let probs = classifier.predict_proba(&doc("delivery payment"));
        let total: f64 = probs.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_class_is_unavailable() {
        let documents = vec![doc("great"), doc("good")];
        let labels = vec![BinarySentiment::Positive, BinarySentiment::Positive];
        let result = NaiveBayesRefiner::train(&documents, &labels, 1.0, 1);
        assert!(matches!(result, Err(ModelError::Unavailable(_))));
    }

    #[test]
    fn test_classify_batch_keeps_order() {
        let (documents, labels) = training_set();
        let refiner = NaiveBayesRefiner::train(&documents, &labels, 1.0, 1).unwrap();
        let a = doc("excellent smooth");
        let b = doc("worst late");
        let batch = [
            RefinerInput { id: "a", text: "", tokens: &a },
            RefinerInput { id: "b", text: "", tokens: &b },
        ];

        let out = refiner.classify(&batch).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, BinarySentiment::Positive);
        assert_eq!(out[1].label, BinarySentiment::Negative);
    }
}
