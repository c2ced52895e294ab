//! Configuration management
//!
//! Every section has defaults matching the reference run, so a TOML file only
//! needs the keys it overrides.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Text normalization word lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Terms kept even though they look like stop words
    pub protected_terms: Vec<String>,
    /// Domain stop words (brand and app names)
    pub custom_stop_words: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            protected_terms: crate::preprocessing::normalizer::PROTECTED_TERMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            custom_stop_words: crate::preprocessing::normalizer::CUSTOM_STOP_WORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Which refiner handles low-confidence reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinerKind {
    /// Naive Bayes trained on the gate-accepted reviews of the run
    NaiveBayes,
    /// No refiner; every gated review takes the degraded fallback
    Disabled,
}

/// Hybrid sentiment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Compounds with a magnitude strictly above this are accepted
    pub gate_threshold: f64,
    /// Symmetric compound threshold for Positive / Negative
    pub label_threshold: f64,
    /// Reviews per refiner call
    pub batch_size: usize,
    /// Refiner worker threads (0 = one per CPU)
    pub workers: usize,
    pub refiner: RefinerKind,
    /// Laplace smoothing of the naive Bayes refiner
    pub nb_alpha: f64,
    /// Minimum accepted reviews per class to train the refiner
    pub min_training_examples: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            gate_threshold: 0.60,
            label_threshold: 0.05,
            batch_size: 32,
            workers: 0,
            refiner: RefinerKind::NaiveBayes,
            nb_alpha: 1.0,
            min_training_examples: 5,
        }
    }
}

/// Topic modeling settings, shared by the negative and non-negative models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    /// Vocabulary cap
    pub max_features: usize,
    /// Minimum number of documents containing a term
    pub min_df: usize,
    /// Maximum share of documents containing a term
    pub max_df: f64,
    pub ngram_min: usize,
    pub ngram_max: usize,
    /// Topic count when `auto_select` is off
    pub n_topics: usize,
    /// Pick the topic count by held-out perplexity
    pub auto_select: bool,
    pub min_topics: usize,
    pub max_topics: usize,
    pub holdout_fraction: f64,
    pub selection_tolerance: f64,
    pub alpha: f64,
    pub beta: f64,
    pub n_iterations: usize,
    pub burn_in: usize,
    pub inference_iterations: usize,
    /// Keywords reported per topic
    pub n_keywords: usize,
    pub seed: u64,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_df: 5,
            max_df: 0.7,
            ngram_min: 1,
            ngram_max: 2,
            n_topics: 4,
            auto_select: false,
            min_topics: 2,
            max_topics: 10,
            holdout_fraction: 0.2,
            selection_tolerance: 0.05,
            alpha: 0.1,
            beta: 0.01,
            n_iterations: 300,
            burn_in: 50,
            inference_iterations: 50,
            n_keywords: 10,
            seed: 42,
        }
    }
}

/// Aspect extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectsConfig {
    pub enabled: bool,
    /// Texts per extractor call
    pub batch_size: usize,
    /// Aspect name -> trigger words
    pub vocabulary: BTreeMap<String, Vec<String>>,
}

impl Default for AspectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 32,
            vocabulary: crate::aspects::default_vocabulary(),
        }
    }
}

/// Output file names inside the output directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub enriched_file: String,
    pub aspects_file: String,
    pub topic_keywords_file: String,
    pub metrics_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enriched_file: "df_final_enriched.csv".to_string(),
            aspects_file: "aspect_sentiments.csv".to_string(),
            topic_keywords_file: "topic_keywords.json".to_string(),
            metrics_file: "confusion_matrix_data.json".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub normalizer: NormalizerConfig,
    pub sentiment: SentimentConfig,
    pub topics: TopicsConfig,
    pub aspects: AspectsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file or use default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create default configuration file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        Config::default().save(path)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let s = &self.sentiment;
        if !(0.0..=1.0).contains(&s.gate_threshold) {
            return Err(invalid("sentiment.gate_threshold must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&s.label_threshold) {
            return Err(invalid("sentiment.label_threshold must be in [0, 1]"));
        }
        if s.batch_size == 0 {
            return Err(invalid("sentiment.batch_size must be positive"));
        }
        if s.nb_alpha <= 0.0 {
            return Err(invalid("sentiment.nb_alpha must be positive"));
        }

        let t = &self.topics;
        if t.max_features == 0 {
            return Err(invalid("topics.max_features must be positive"));
        }
        if !(t.max_df > 0.0 && t.max_df <= 1.0) {
            return Err(invalid("topics.max_df must be in (0, 1]"));
        }
        if t.ngram_min == 0 || t.ngram_min > t.ngram_max {
            return Err(invalid("topics.ngram_min must be in 1..=ngram_max"));
        }
        if t.n_topics == 0 {
            return Err(invalid("topics.n_topics must be positive"));
        }
        if t.min_topics == 0 || t.min_topics > t.max_topics {
            return Err(invalid("topics.min_topics must be in 1..=max_topics"));
        }
        if t.alpha <= 0.0 || t.beta <= 0.0 {
            return Err(invalid("topics.alpha and topics.beta must be positive"));
        }

        if self.aspects.batch_size == 0 {
            return Err(invalid("aspects.batch_size must be positive"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> PipelineError {
    PipelineError::InvalidConfig(message.to_string())
}
