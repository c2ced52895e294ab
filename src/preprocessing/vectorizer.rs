//! TF-IDF vectorization for topic modeling
//!
//! Converts normalized token sequences into a document-term matrix over
//! unigrams and bigrams, with document-frequency pruning and a capped
//! vocabulary.

use hashbrown::{HashMap, HashSet};
use ndarray::Array2;

/// TF-IDF vectorizer over n-grams
///
/// Term frequency is the raw count, IDF is `ln((1 + N) / (1 + df)) + 1`
/// and rows are L2-normalized.
///
/// Pruning happens in this order: document frequency bounds, then the
/// vocabulary cap keeps the terms with the highest corpus frequency
/// (ties broken alphabetically). The final vocabulary is sorted
/// alphabetically so column indices are stable across runs.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    /// Term -> column index
    vocabulary: HashMap<String, usize>,
    /// Column index -> term
    inverse_vocabulary: Vec<String>,
    /// Number of documents seen during fitting
    n_documents: usize,
    /// Minimum number of documents a term must appear in
    min_df: usize,
    /// Maximum share of documents a term may appear in
    max_df: f64,
    /// Vocabulary cap
    max_features: Option<usize>,
    /// Smallest and largest n-gram length
    ngram_range: (usize, usize),
    /// IDF of each retained term
    idf_values: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Create a vectorizer with permissive defaults (unigrams, no pruning)
    pub fn new() -> Self {
        Self {
            vocabulary: HashMap::new(),
            inverse_vocabulary: Vec::new(),
            n_documents: 0,
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            ngram_range: (1, 1),
            idf_values: Vec::new(),
        }
    }

    /// Set minimum document frequency (absolute count)
    pub fn min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Set maximum document frequency (share of documents)
    pub fn max_df(mut self, ratio: f64) -> Self {
        self.max_df = ratio;
        self
    }

    /// Set maximum vocabulary size
    pub fn max_features(mut self, max: usize) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Set the n-gram range, both ends inclusive
    pub fn ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    /// Expand a token sequence into its n-gram terms
    ///
    /// Multi-word terms join their tokens with a single space.
    pub fn analyze(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if tokens.len() < n {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Fit the vocabulary and IDF weights
    pub fn fit(&mut self, tokenized_docs: &[Vec<String>]) {
        self.n_documents = tokenized_docs.len();

        let mut term_doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_total_freq: HashMap<String, usize> = HashMap::new();

        for doc in tokenized_docs {
            let terms = self.analyze(doc);
            let unique_terms: HashSet<&String> = terms.iter().collect();
            for term in unique_terms {
                *term_doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            for term in terms {
                *term_total_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.max_df * self.n_documents as f64;
        let mut filtered_terms: Vec<(String, usize, usize)> = term_doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df && (*df as f64) <= max_doc_count)
            .map(|(term, df)| {
                let total = term_total_freq.get(&term).copied().unwrap_or(0);
                (term, df, total)
            })
            .collect();

        // Highest corpus frequency first for the vocabulary cap
        filtered_terms.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        if let Some(max) = self.max_features {
            filtered_terms.truncate(max);
        }

        filtered_terms.sort_by(|a, b| a.0.cmp(&b.0));

        self.vocabulary.clear();
        self.inverse_vocabulary.clear();
        self.idf_values.clear();

        let n = self.n_documents as f64;
        for (idx, (term, df, _)) in filtered_terms.into_iter().enumerate() {
            self.vocabulary.insert(term.clone(), idx);
            self.inverse_vocabulary.push(term);
            self.idf_values.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }
    }

    /// Transform tokenized documents into a TF-IDF matrix
    ///
    /// Returns a matrix of shape (n_documents, vocabulary_size). Terms outside
    /// the fitted vocabulary are ignored, so a document can map to an all-zero
    /// row. An unfitted vectorizer has an empty vocabulary.
    pub fn transform(&self, tokenized_docs: &[Vec<String>]) -> Array2<f64> {
        let n_features = self.vocabulary.len();
        let mut matrix = Array2::zeros((tokenized_docs.len(), n_features));

        for (doc_idx, doc) in tokenized_docs.iter().enumerate() {
            let mut term_counts: HashMap<usize, usize> = HashMap::new();
            for term in self.analyze(doc) {
                if let Some(&term_idx) = self.vocabulary.get(&term) {
                    *term_counts.entry(term_idx).or_insert(0) += 1;
                }
            }

            for (term_idx, count) in term_counts {
                matrix[[doc_idx, term_idx]] = count as f64 * self.idf_values[term_idx];
            }

            let mut row = matrix.row_mut(doc_idx);
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        matrix
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, tokenized_docs: &[Vec<String>]) -> Array2<f64> {
        self.fit(tokenized_docs);
        self.transform(tokenized_docs)
    }

    /// Terms in column order
    pub fn terms(&self) -> &[String] {
        &self.inverse_vocabulary
    }
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}
