//! # Topic Assigner
//!
//! One parametrized component trained once per polarity subset: the reviews
//! resolved as Negative get their own model, everything else shares a
//! second one. Each instance owns its TF-IDF vocabulary and LDA model.

use super::lda::{argmax, LdaConfig, LdaError, LdaModel};
use super::selection::{select_topic_count, SelectionConfig, TopicCountSelection};
use crate::preprocessing::vectorizer::TfIdfVectorizer;
use crate::sentiment::SentimentLabel;
use crate::utils::config::TopicsConfig;
use crate::utils::evaluation::{Evaluator, ModelSummary};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Polarity subset a topic model is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicSubset {
    Negative,
    NonNegative,
}

impl TopicSubset {
    /// Subset a resolved label belongs to
    pub fn for_label(label: SentimentLabel) -> Self {
        match label {
            SentimentLabel::Negative => TopicSubset::Negative,
            SentimentLabel::Neutral | SentimentLabel::Positive => TopicSubset::NonNegative,
        }
    }

    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicSubset::Negative => "negative",
            TopicSubset::NonNegative => "non_negative",
        }
    }
}

/// Topic of one review
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAssignment {
    /// Argmax of `probabilities`, 0-based
    pub topic_id: usize,
    /// Distribution over the subset model's topics
    pub probabilities: Vec<f64>,
    pub subset: TopicSubset,
}

impl TopicAssignment {
    /// Display label, 1-based
    pub fn label(&self) -> String {
        format!("Topic {}", self.topic_id + 1)
    }
}

/// TF-IDF + LDA model for one polarity subset
#[derive(Debug, Clone)]
pub struct TopicAssigner {
    subset: TopicSubset,
    vectorizer: TfIdfVectorizer,
    model: LdaModel,
    keywords: Vec<Vec<String>>,
    summary: ModelSummary,
}

impl TopicAssigner {
    /// Train on the normalized documents of one subset
    ///
    /// Fails with [`LdaError::EmptyCorpus`] when no term survives the
    /// document-frequency pruning.
    pub fn train(
        subset: TopicSubset,
        documents: &[Vec<String>],
        config: &TopicsConfig,
    ) -> Result<Self, LdaError> {
        let mut vectorizer = build_vectorizer(config);
        let dtm = vectorizer.fit_transform(documents);
        let terms = vectorizer.terms().to_vec();

        if terms.is_empty() {
            return Err(LdaError::EmptyCorpus);
        }

        let base = base_lda_config(config);
        let n_topics = if config.auto_select {
            select_topic_count(&dtm, &terms, &base, &selection_config(config))?.selected
        } else {
            config.n_topics
        };

        let mut model = LdaModel::new(LdaConfig { n_topics, ..base })?;
        model.fit(&dtm, terms.clone())?;

        let keywords: Vec<Vec<String>> = model
            .get_topics(config.n_keywords)?
            .into_iter()
            .map(|topic| topic.top_words.into_iter().map(|(word, _)| word).collect())
            .collect();

        let summary = ModelSummary::from_topics(&keywords, &Evaluator::new(dtm, &terms));
        summary.log(subset.as_str());
        info!(
            subset = subset.as_str(),
            n_topics,
            documents = documents.len(),
            vocabulary = terms.len(),
            "Topic model trained"
        );

        Ok(Self {
            subset,
            vectorizer,
            model,
            keywords,
            summary,
        })
    }

    /// Assign a topic to one normalized document
    ///
    /// `Ok(None)` when no token maps to the model vocabulary.
    pub fn assign(&self, tokens: &[String]) -> Result<Option<TopicAssignment>, LdaError> {
        if tokens.is_empty() {
            return Ok(None);
        }
        let row = self.vectorizer.transform(&[tokens.to_vec()]);
        let theta: Option<Array1<f64>> = self.model.infer(row.row(0))?;

        Ok(theta.map(|probabilities| TopicAssignment {
            topic_id: argmax(probabilities.view()),
            probabilities: probabilities.to_vec(),
            subset: self.subset,
        }))
    }

    pub fn subset(&self) -> TopicSubset {
        self.subset
    }

    pub fn n_topics(&self) -> usize {
        self.model.n_topics()
    }

    /// Top words of every topic, in topic order
    pub fn keywords(&self) -> &[Vec<String>] {
        &self.keywords
    }

    /// Top words of one topic
    pub fn topic_keywords(&self, topic_id: usize) -> Option<&[String]> {
        self.keywords.get(topic_id).map(|k| k.as_slice())
    }

    pub fn summary(&self) -> &ModelSummary {
        &self.summary
    }

    pub fn model(&self) -> &LdaModel {
        &self.model
    }
}

/// Run the topic count search on one subset without fitting a final model
pub fn search_topic_count(
    documents: &[Vec<String>],
    config: &TopicsConfig,
) -> Result<TopicCountSelection, LdaError> {
    let mut vectorizer = build_vectorizer(config);
    let dtm = vectorizer.fit_transform(documents);
    let terms = vectorizer.terms().to_vec();
    if terms.is_empty() {
        return Err(LdaError::EmptyCorpus);
    }
    select_topic_count(&dtm, &terms, &base_lda_config(config), &selection_config(config))
}

fn build_vectorizer(config: &TopicsConfig) -> TfIdfVectorizer {
    TfIdfVectorizer::new()
        .min_df(config.min_df)
        .max_df(config.max_df)
        .max_features(config.max_features)
        .ngram_range(config.ngram_min, config.ngram_max)
}

fn base_lda_config(config: &TopicsConfig) -> LdaConfig {
    LdaConfig::new(config.n_topics)
        .alpha(config.alpha)
        .beta(config.beta)
        .n_iterations(config.n_iterations)
        .burn_in(config.burn_in)
        .inference_iterations(config.inference_iterations)
        .random_seed(config.seed)
}

fn selection_config(config: &TopicsConfig) -> SelectionConfig {
    SelectionConfig {
        min_topics: config.min_topics,
        max_topics: config.max_topics,
        holdout_fraction: config.holdout_fraction,
        tolerance: config.selection_tolerance,
        seed: config.seed,
    }
}

/// Keyword artifact: 1-based topic number -> top words, per subset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicKeywordMap {
    pub negative_topics: BTreeMap<usize, Vec<String>>,
    pub positive_topics: BTreeMap<usize, Vec<String>>,
}

/// The two subset models of a run
///
/// A subset whose model could not be trained assigns no topics.
#[derive(Debug, Clone, Default)]
pub struct TopicModels {
    pub negative: Option<TopicAssigner>,
    pub non_negative: Option<TopicAssigner>,
}

impl TopicModels {
    /// Train both subset models
    ///
    /// A failed subset is logged and left without a model.
    pub fn train(documents: &[(SentimentLabel, &[String])], config: &TopicsConfig) -> Self {
        let mut models = Self::default();
        for subset in [TopicSubset::Negative, TopicSubset::NonNegative] {
            let subset_docs: Vec<Vec<String>> = documents
                .iter()
                .filter(|(label, _)| TopicSubset::for_label(*label) == subset)
                .map(|(_, tokens)| tokens.to_vec())
                .collect();

            let trained = match TopicAssigner::train(subset, &subset_docs, config) {
                Ok(assigner) => Some(assigner),
                Err(e) => {
                    warn!(
                        subset = subset.as_str(),
                        documents = subset_docs.len(),
                        error = %e,
                        "Topic model not trained, subset gets no topics"
                    );
                    None
                }
            };

            match subset {
                TopicSubset::Negative => models.negative = trained,
                TopicSubset::NonNegative => models.non_negative = trained,
            }
        }
        models
    }

    /// Model responsible for a resolved label
    pub fn for_label(&self, label: SentimentLabel) -> Option<&TopicAssigner> {
        match TopicSubset::for_label(label) {
            TopicSubset::Negative => self.negative.as_ref(),
            TopicSubset::NonNegative => self.non_negative.as_ref(),
        }
    }

    /// Assign a topic with the model of the review's subset
    pub fn assign(
        &self,
        label: SentimentLabel,
        tokens: &[String],
    ) -> Result<Option<TopicAssignment>, LdaError> {
        match self.for_label(label) {
            Some(assigner) => assigner.assign(tokens),
            None => Ok(None),
        }
    }

    /// Keyword artifact with 1-based topic numbers
    pub fn keyword_map(&self) -> TopicKeywordMap {
        let numbered = |assigner: Option<&TopicAssigner>| {
            assigner
                .map(|a| {
                    a.keywords()
                        .iter()
                        .enumerate()
                        .map(|(i, words)| (i + 1, words.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        TopicKeywordMap {
            negative_topics: numbered(self.negative.as_ref()),
            positive_topics: numbered(self.non_negative.as_ref()),
        }
    }
}
