//! Latent Dirichlet Allocation (LDA)
//!
//! LDA is a generative probabilistic model for topic modeling. This
//! implementation fits with collapsed Gibbs sampling over a weighted
//! document-term matrix: every nonzero cell is one token carrying its
//! weight, so TF-IDF rows can be modeled directly. New documents are folded
//! in with a deterministic EM pass against the fitted topic-word
//! distribution.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during LDA computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LdaError {
    #[error("Matrix dimensions mismatch: expected {expected} terms, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Model not fitted yet")]
    NotFitted,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("Corpus has no terms to model")]
    EmptyCorpus,

    #[error("Computation error: {0}")]
    ComputationError(String),
}

/// Topic representation with words and probabilities
#[derive(Debug, Clone, PartialEq)]
pub struct LdaTopic {
    /// Topic index
    pub index: usize,
    /// Top words with their probabilities
    pub top_words: Vec<(String, f64)>,
    /// Share of the corpus weight assigned to this topic
    pub prevalence: f64,
}

/// LDA model configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LdaConfig {
    /// Number of topics
    pub n_topics: usize,
    /// Document-topic prior (alpha)
    pub alpha: f64,
    /// Topic-word prior (beta/eta)
    pub beta: f64,
    /// Number of Gibbs sweeps
    pub n_iterations: usize,
    /// Sweeps discarded before samples are averaged into the estimates
    pub burn_in: usize,
    /// EM iterations when folding in a new document
    pub inference_iterations: usize,
    /// Random seed for reproducibility
    pub random_seed: Option<u64>,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 4,
            alpha: 0.1,
            beta: 0.01,
            n_iterations: 300,
            burn_in: 50,
            inference_iterations: 50,
            random_seed: None,
        }
    }
}

impl LdaConfig {
    /// Create a new configuration with specified number of topics
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    /// Set alpha (document-topic prior)
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set beta (topic-word prior)
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set number of Gibbs sweeps
    pub fn n_iterations(mut self, n: usize) -> Self {
        self.n_iterations = n;
        self
    }

    /// Set burn-in period
    pub fn burn_in(mut self, n: usize) -> Self {
        self.burn_in = n;
        self
    }

    /// Set fold-in iterations
    pub fn inference_iterations(mut self, n: usize) -> Self {
        self.inference_iterations = n;
        self
    }

    /// Set random seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// Sufficient statistics of the sampler
struct GibbsCounts {
    /// n_docs x n_topics
    doc_topic: Array2<f64>,
    /// n_topics x n_words
    topic_word: Array2<f64>,
    /// n_topics
    topic: Array1<f64>,
}

impl GibbsCounts {
    fn from_assignments(
        doc_tokens: &[Vec<(usize, f64)>],
        assignments: &[Vec<usize>],
        n_topics: usize,
        n_words: usize,
    ) -> Self {
        let mut counts = Self {
            doc_topic: Array2::zeros((doc_tokens.len(), n_topics)),
            topic_word: Array2::zeros((n_topics, n_words)),
            topic: Array1::zeros(n_topics),
        };
        for (doc_idx, tokens) in doc_tokens.iter().enumerate() {
            for (&(word_idx, weight), &topic) in tokens.iter().zip(&assignments[doc_idx]) {
                counts.add(doc_idx, word_idx, topic, weight);
            }
        }
        counts
    }

    fn add(&mut self, doc_idx: usize, word_idx: usize, topic: usize, weight: f64) {
        self.doc_topic[[doc_idx, topic]] += weight;
        self.topic_word[[topic, word_idx]] += weight;
        self.topic[topic] += weight;
    }

    /// Smoothed topic-word distribution of this state
    fn topic_word_estimate(&self, beta: f64, beta_sum: f64) -> Array2<f64> {
        let (n_topics, n_words) = self.topic_word.dim();
        let mut topic_words = Array2::zeros((n_topics, n_words));
        for topic in 0..n_topics {
            let denom = self.topic[topic] + beta_sum;
            for word_idx in 0..n_words {
                topic_words[[topic, word_idx]] = (self.topic_word[[topic, word_idx]] + beta) / denom;
            }
        }
        topic_words
    }

    fn remove(&mut self, doc_idx: usize, word_idx: usize, topic: usize, weight: f64) {
        // Weighted counts drift below zero by rounding
        self.doc_topic[[doc_idx, topic]] = (self.doc_topic[[doc_idx, topic]] - weight).max(0.0);
        self.topic_word[[topic, word_idx]] = (self.topic_word[[topic, word_idx]] - weight).max(0.0);
        self.topic[topic] = (self.topic[topic] - weight).max(0.0);
    }
}

/// Latent Dirichlet Allocation model
#[derive(Debug, Clone)]
pub struct LdaModel {
    /// Model configuration
    config: LdaConfig,
    /// Topic-word distribution: n_topics x n_words
    topic_words: Option<Array2<f64>>,
    /// Corpus weight assigned to each topic
    topic_weights: Option<Array1<f64>>,
    /// Column terms
    terms: Vec<String>,
}

impl LdaModel {
    /// Create a new LDA model
    pub fn new(config: LdaConfig) -> Result<Self, LdaError> {
        if config.n_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if config.alpha <= 0.0 {
            return Err(LdaError::InvalidParameter("alpha must be positive".into()));
        }
        if config.beta <= 0.0 {
            return Err(LdaError::InvalidParameter("beta must be positive".into()));
        }

        Ok(Self {
            config,
            topic_words: None,
            topic_weights: None,
            terms: Vec::new(),
        })
    }

    /// Create a model with default hyperparameters
    pub fn simple(n_topics: usize) -> Result<Self, LdaError> {
        Self::new(LdaConfig::new(n_topics))
    }

    /// Fit the model using weighted Gibbs sampling
    ///
    /// # Arguments
    /// * `dtm` - Document-term matrix (documents x terms), non-negative weights
    /// * `terms` - Column terms
    pub fn fit(&mut self, dtm: &Array2<f64>, terms: Vec<String>) -> Result<(), LdaError> {
        let n_docs = dtm.nrows();
        let n_words = dtm.ncols();
        let n_topics = self.config.n_topics;

        if terms.len() != n_words {
            return Err(LdaError::DimensionMismatch {
                expected: terms.len(),
                got: n_words,
            });
        }
        if n_docs == 0 || n_words == 0 {
            return Err(LdaError::EmptyCorpus);
        }
        if dtm.iter().any(|&w| w < 0.0 || !w.is_finite()) {
            return Err(LdaError::InvalidParameter(
                "document-term weights must be finite and non-negative".into(),
            ));
        }

        let doc_tokens: Vec<Vec<(usize, f64)>> = dtm.outer_iter().map(nonzero_cells).collect();
        if doc_tokens.iter().all(|tokens| tokens.is_empty()) {
            return Err(LdaError::EmptyCorpus);
        }

        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut assignments: Vec<Vec<usize>> = doc_tokens
            .iter()
            .map(|tokens| tokens.iter().map(|_| rng.gen_range(0..n_topics)).collect())
            .collect();
        let mut counts = GibbsCounts::from_assignments(&doc_tokens, &assignments, n_topics, n_words);

        let alpha = self.config.alpha;
        let beta = self.config.beta;
        let beta_sum = beta * n_words as f64;
        let mut probs = vec![0.0; n_topics];
        let mut topic_words: Array2<f64> = Array2::zeros((n_topics, n_words));
        let mut samples = 0usize;

        for iter in 0..self.config.n_iterations {
            for (doc_idx, tokens) in doc_tokens.iter().enumerate() {
                for (pos, &(word_idx, weight)) in tokens.iter().enumerate() {
                    let old_topic = assignments[doc_idx][pos];
                    counts.remove(doc_idx, word_idx, old_topic, weight);

                    let mut total = 0.0;
                    for (topic, prob) in probs.iter_mut().enumerate() {
                        *prob = (counts.doc_topic[[doc_idx, topic]] + alpha)
                            * (counts.topic_word[[topic, word_idx]] + beta)
                            / (counts.topic[topic] + beta_sum);
                        total += *prob;
                    }

                    let new_topic = sample_index(&probs, total, &mut rng);
                    counts.add(doc_idx, word_idx, new_topic, weight);
                    assignments[doc_idx][pos] = new_topic;
                }
            }

            if iter >= self.config.burn_in {
                topic_words += &counts.topic_word_estimate(beta, beta_sum);
                samples += 1;
            }
        }

        // Rebuild from assignments to drop accumulated rounding
        let counts = GibbsCounts::from_assignments(&doc_tokens, &assignments, n_topics, n_words);
        let final_log_likelihood = log_likelihood(&counts, alpha, beta, beta_sum);

        if samples == 0 {
            topic_words = counts.topic_word_estimate(beta, beta_sum);
            samples = 1;
        }
        topic_words /= samples as f64;

        debug!(
            n_docs,
            n_words,
            n_topics,
            samples,
            final_log_likelihood,
            "LDA fitted"
        );

        self.topic_words = Some(topic_words);
        self.topic_weights = Some(counts.topic);
        self.terms = terms;

        Ok(())
    }

    /// Topic-word distribution (rows sum to 1)
    pub fn get_topic_words(&self) -> Result<&Array2<f64>, LdaError> {
        self.topic_words.as_ref().ok_or(LdaError::NotFitted)
    }

    /// Column terms of the fitted model
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Get topics with top words
    ///
    /// Words are ordered by probability, ties by column index.
    pub fn get_topics(&self, n_words: usize) -> Result<Vec<LdaTopic>, LdaError> {
        let topic_words = self.get_topic_words()?;
        let topic_weights = self.topic_weights.as_ref().ok_or(LdaError::NotFitted)?;
        let total_weight: f64 = topic_weights.sum();

        let topics = topic_words
            .outer_iter()
            .enumerate()
            .map(|(topic_idx, row)| {
                let mut word_probs: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
                word_probs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                word_probs.truncate(n_words);

                let top_words = word_probs
                    .into_iter()
                    .filter_map(|(idx, prob)| self.terms.get(idx).map(|t| (t.clone(), prob)))
                    .collect();

                let prevalence = if total_weight > 0.0 {
                    topic_weights[topic_idx] / total_weight
                } else {
                    0.0
                };

                LdaTopic {
                    index: topic_idx,
                    top_words,
                    prevalence,
                }
            })
            .collect();

        Ok(topics)
    }

    /// Infer the topic distribution of one document
    ///
    /// Returns `Ok(None)` when the document has no weight on any modeled
    /// term. Otherwise the distribution sums to 1.
    pub fn infer(&self, doc: ArrayView1<f64>) -> Result<Option<Array1<f64>>, LdaError> {
        let topic_words = self.get_topic_words()?;
        if doc.len() != topic_words.ncols() {
            return Err(LdaError::DimensionMismatch {
                expected: topic_words.ncols(),
                got: doc.len(),
            });
        }

        let cells = nonzero_cells(doc);
        if cells.is_empty() {
            return Ok(None);
        }

        let n_topics = self.config.n_topics;
        let alpha = self.config.alpha;
        let doc_weight: f64 = cells.iter().map(|(_, w)| w).sum();
        let mut theta = Array1::from_elem(n_topics, 1.0 / n_topics as f64);
        let mut expected = Array1::<f64>::zeros(n_topics);

        for _ in 0..self.config.inference_iterations.max(1) {
            expected.fill(0.0);
            for &(word_idx, weight) in &cells {
                let column = topic_words.column(word_idx);
                let norm: f64 = theta.iter().zip(column.iter()).map(|(t, p)| t * p).sum();
                if norm <= 0.0 {
                    continue;
                }
                for topic in 0..n_topics {
                    expected[topic] += weight * theta[topic] * column[topic] / norm;
                }
            }
            let denom = doc_weight + n_topics as f64 * alpha;
            theta = expected.mapv(|n| (n + alpha) / denom);
        }

        // Renormalize against rounding so the vector sums to 1
        let sum = theta.sum();
        if !(sum.is_finite() && sum > 0.0) {
            return Err(LdaError::ComputationError(
                "topic distribution did not normalize".into(),
            ));
        }
        theta.mapv_inplace(|v| v / sum);

        Ok(Some(theta))
    }

    /// Infer topic distributions for every row of a document-term matrix
    pub fn transform(&self, dtm: &Array2<f64>) -> Result<Vec<Option<Array1<f64>>>, LdaError> {
        dtm.axis_iter(Axis(0)).map(|row| self.infer(row)).collect()
    }

    /// Perplexity of a (held-out) document-term matrix
    ///
    /// Each document is folded in first. Lower is better.
    pub fn perplexity(&self, dtm: &Array2<f64>) -> Result<f64, LdaError> {
        let topic_words = self.get_topic_words()?;

        let mut log_likelihood = 0.0;
        let mut total_weight = 0.0;

        for row in dtm.outer_iter() {
            let Some(theta) = self.infer(row)? else {
                continue;
            };
            for (word_idx, weight) in nonzero_cells(row) {
                let prob = theta.dot(&topic_words.column(word_idx));
                log_likelihood += weight * prob.ln();
                total_weight += weight;
            }
        }

        if total_weight <= 0.0 {
            return Err(LdaError::ComputationError(
                "no modeled terms in evaluation corpus".into(),
            ));
        }

        Ok((-log_likelihood / total_weight).exp())
    }

    /// Get configuration
    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    /// Number of topics
    pub fn n_topics(&self) -> usize {
        self.config.n_topics
    }
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

fn nonzero_cells(row: ArrayView1<f64>) -> Vec<(usize, f64)> {
    row.iter()
        .enumerate()
        .filter(|(_, &w)| w > 0.0)
        .map(|(idx, &w)| (idx, w))
        .collect()
}

fn sample_index(probs: &[f64], total: f64, rng: &mut StdRng) -> usize {
    let threshold = rng.gen::<f64>() * total;
    let mut cumsum = 0.0;
    for (idx, &prob) in probs.iter().enumerate() {
        cumsum += prob;
        if cumsum >= threshold {
            return idx;
        }
    }
    probs.len() - 1
}

fn log_likelihood(counts: &GibbsCounts, alpha: f64, beta: f64, beta_sum: f64) -> f64 {
    let n_topics = counts.topic.len();
    let mut ll = 0.0;

    for topic in 0..n_topics {
        let denom = counts.topic[topic] + beta_sum;
        for &count in counts.topic_word.row(topic) {
            if count > 0.0 {
                ll += count * ((count + beta) / denom).ln();
            }
        }
    }

    for row in counts.doc_topic.outer_iter() {
        let denom = row.sum() + n_topics as f64 * alpha;
        for &count in row {
            if count > 0.0 {
                ll += count * ((count + alpha) / denom).ln();
            }
        }
    }

    ll
}

/// Display implementation for LdaTopic
impl std::fmt::Display for LdaTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Topic {}: (prevalence: {:.2}%) [",
            self.index + 1,
            self.prevalence * 100.0
        )?;
        for (i, (word, prob)) in self.top_words.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.3}", word, prob)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn create_test_data() -> (Array2<f64>, Vec<String>) {
        // Topic A: otp, login, password
        // Topic B: cylinder, delivery, late
        let matrix = Array2::from_shape_vec(
            (6, 6),
            vec![
                3.0, 2.0, 2.0, 0.0, 0.0, 0.0, //
                2.0, 3.0, 1.0, 0.0, 0.0, 0.0, //
                1.0, 2.0, 3.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 3.0, 2.0, 2.0, //
                0.0, 0.0, 0.0, 2.0, 3.0, 1.0, //
                0.0, 0.0, 0.0, 1.0, 2.0, 3.0, //
            ],
        )
        .unwrap();

        let terms = ["otp", "login", "password", "cylinder", "delivery", "late"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        (matrix, terms)
    }

    fn dominant_topics(lda: &LdaModel) -> Vec<usize> {
        let (matrix, _) = create_test_data();
        lda.transform(&matrix)
            .unwrap()
            .into_iter()
            .map(|theta| argmax(theta.unwrap().view()))
            .collect()
    }

    fn fitted(n_topics: usize) -> LdaModel {
        let (matrix, terms) = create_test_data();
        let config = LdaConfig::new(n_topics)
            .n_iterations(200)
            .burn_in(50)
            .random_seed(42);
        let mut lda = LdaModel::new(config).unwrap();
        lda.fit(&matrix, terms).unwrap();
        lda
    }

    #[test]
    fn test_lda_creation() {
        assert!(LdaModel::simple(5).is_ok());
        assert_eq!(LdaModel::simple(0).unwrap_err(), LdaError::InvalidTopicCount);
        assert!(LdaModel::new(LdaConfig::new(2).alpha(0.0)).is_err());
    }

    #[test]
    fn test_fit_rejects_empty_corpus() {
        let mut lda = LdaModel::simple(2).unwrap();
        let empty = Array2::<f64>::zeros((3, 2));
        let result = lda.fit(&empty, vec!["a".into(), "b".into()]);
        assert_eq!(result, Err(LdaError::EmptyCorpus));
        assert_eq!(lda.get_topic_words().unwrap_err(), LdaError::NotFitted);
    }

    #[test]
    fn test_fit_rejects_term_mismatch() {
        let (matrix, _) = create_test_data();
        let mut lda = LdaModel::simple(2).unwrap();
        let result = lda.fit(&matrix, vec!["only".into()]);
        assert!(matches!(result, Err(LdaError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_dominant_topics_separate_groups() {
        let lda = fitted(2);
        let dominant = dominant_topics(&lda);

        assert_eq!(dominant.len(), 6);
        assert_eq!(dominant[0], dominant[1]);
        assert_eq!(dominant[1], dominant[2]);
        assert_eq!(dominant[3], dominant[4]);
        assert_eq!(dominant[4], dominant[5]);
        assert_ne!(dominant[0], dominant[3]);
    }

    #[test]
    fn test_topic_word_rows_are_distributions() {
        let lda = fitted(2);
        for row in lda.get_topic_words().unwrap().outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        let topics = lda.get_topics(3).unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].top_words.len(), 3);
    }

    #[test]
    fn test_burn_in_covering_whole_run_uses_final_state() {
        let (matrix, terms) = create_test_data();
        let config = LdaConfig::new(2).n_iterations(20).burn_in(20).random_seed(7);
        let mut lda = LdaModel::new(config).unwrap();
        lda.fit(&matrix, terms).unwrap();

        for row in lda.get_topic_words().unwrap().outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_infer_sums_to_one() {
        let lda = fitted(2);
        let doc = array![0.0, 0.5, 0.5, 0.0, 0.0, 0.1];
        let theta = lda.infer(doc.view()).unwrap().unwrap();

        assert_eq!(theta.len(), 2);
        assert_abs_diff_eq!(theta.sum(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_infer_matches_training_group() {
        let lda = fitted(2);
        let dominant = dominant_topics(&lda);
        let login_doc = array![1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let theta = lda.infer(login_doc.view()).unwrap().unwrap();

        assert_eq!(argmax(theta.view()), dominant[0]);
    }

    #[test]
    fn test_empty_document_has_no_topic() {
        let lda = fitted(2);
        let empty = Array1::<f64>::zeros(6);
        assert_eq!(lda.infer(empty.view()).unwrap(), None);
    }

    #[test]
    fn test_infer_before_fit_fails() {
        let lda = LdaModel::simple(2).unwrap();
        let doc = array![1.0];
        assert_eq!(lda.infer(doc.view()), Err(LdaError::NotFitted));
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(array![0.25, 0.25, 0.25, 0.25].view()), 0);
        assert_eq!(argmax(array![0.1, 0.45, 0.45].view()), 1);
        assert_eq!(argmax(array![0.1, 0.2, 0.7].view()), 2);
    }

    #[test]
    fn test_perplexity_is_finite() {
        let (matrix, _) = create_test_data();
        let lda = fitted(2);
        let perplexity = lda.perplexity(&matrix).unwrap();
        assert!(perplexity.is_finite());
        assert!(perplexity >= 1.0);
    }

    #[test]
    fn test_fit_is_reproducible_with_seed() {
        let a = fitted(2);
        let b = fitted(2);
        assert_eq!(a.get_topic_words().unwrap(), b.get_topic_words().unwrap());
    }
}
