//! Topic count selection by held-out perplexity
//!
//! Each candidate K is fitted on a training split and scored on the held-out
//! rest. The elbow is the smallest K whose perplexity is within a relative
//! tolerance of the best score, so extra topics have to pay for themselves.

use super::lda::{LdaConfig, LdaError, LdaModel};
use ndarray::{Array2, Axis};
use rand::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Perplexity of one candidate topic count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerplexityScore {
    pub n_topics: usize,
    pub perplexity: f64,
}

/// Result of a topic count search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCountSelection {
    /// Scores in increasing K order
    pub scores: Vec<PerplexityScore>,
    /// Chosen topic count
    pub selected: usize,
}

/// Search settings
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub min_topics: usize,
    pub max_topics: usize,
    /// Share of documents held out for scoring
    pub holdout_fraction: f64,
    /// Relative distance to the best perplexity still accepted as the elbow
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_topics: 2,
            max_topics: 10,
            holdout_fraction: 0.2,
            tolerance: 0.05,
            seed: 42,
        }
    }
}

/// Choose the topic count for a document-term matrix
///
/// `base` supplies every LDA hyperparameter except the topic count. Rows
/// without any weight are ignored.
pub fn select_topic_count(
    dtm: &Array2<f64>,
    terms: &[String],
    base: &LdaConfig,
    selection: &SelectionConfig,
) -> Result<TopicCountSelection, LdaError> {
    if selection.min_topics == 0 || selection.min_topics > selection.max_topics {
        return Err(LdaError::InvalidParameter(format!(
            "invalid topic range {}..={}",
            selection.min_topics, selection.max_topics
        )));
    }
    if !(selection.holdout_fraction > 0.0 && selection.holdout_fraction < 1.0) {
        return Err(LdaError::InvalidParameter(
            "holdout fraction must be in (0, 1)".into(),
        ));
    }

    let mut rows: Vec<usize> = dtm
        .outer_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&w| w > 0.0))
        .map(|(idx, _)| idx)
        .collect();

    if rows.len() < 2 {
        return Err(LdaError::EmptyCorpus);
    }

    let mut rng = StdRng::seed_from_u64(selection.seed);
    rows.shuffle(&mut rng);

    let n_holdout = ((rows.len() as f64 * selection.holdout_fraction).round() as usize)
        .clamp(1, rows.len() - 1);
    let (holdout_rows, train_rows) = rows.split_at(n_holdout);

    let train = dtm.select(Axis(0), train_rows);
    let holdout = dtm.select(Axis(0), holdout_rows);

    let mut scores = Vec::new();
    for n_topics in selection.min_topics..=selection.max_topics {
        let config = LdaConfig {
            n_topics,
            ..base.clone()
        };
        let mut model = LdaModel::new(config)?;
        model.fit(&train, terms.to_vec())?;
        let perplexity = model.perplexity(&holdout)?;
        debug!(n_topics, perplexity, "Held-out perplexity");
        scores.push(PerplexityScore {
            n_topics,
            perplexity,
        });
    }

    let selected = elbow(&scores, selection.tolerance).unwrap_or(selection.min_topics);
    info!(
        selected,
        train = train_rows.len(),
        holdout = holdout_rows.len(),
        "Topic count selected"
    );

    Ok(TopicCountSelection { scores, selected })
}

/// Smallest K whose perplexity is within `tolerance` of the minimum
pub fn elbow(scores: &[PerplexityScore], tolerance: f64) -> Option<usize> {
    let best = scores
        .iter()
        .map(|s| s.perplexity)
        .filter(|p| p.is_finite())
        .min_by(|a, b| a.total_cmp(b))?;

    scores
        .iter()
        .filter(|s| s.perplexity.is_finite())
        .find(|s| s.perplexity <= best * (1.0 + tolerance))
        .map(|s| s.n_topics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(n_topics: usize, perplexity: f64) -> PerplexityScore {
        PerplexityScore {
            n_topics,
            perplexity,
        }
    }

    #[test]
    fn test_elbow_prefers_smaller_k_within_tolerance() {
        let scores = vec![
            score(2, 120.0),
            score(3, 101.0),
            score(4, 100.0),
            score(5, 99.0),
        ];
        assert_eq!(elbow(&scores, 0.05), Some(3));
        assert_eq!(elbow(&scores, 0.0), Some(5));
    }

    #[test]
    fn test_elbow_ignores_non_finite() {
        let scores = vec![score(2, f64::NAN), score(3, 50.0)];
        assert_eq!(elbow(&scores, 0.05), Some(3));
        assert_eq!(elbow(&[], 0.05), None);
    }

    #[test]
    fn test_select_topic_count_scores_every_k() {
        let mut values = Vec::new();
        for i in 0..20 {
            if i % 2 == 0 {
                values.extend_from_slice(&[2.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
            } else {
                values.extend_from_slice(&[0.0, 0.0, 0.0, 1.0, 2.0, 1.0]);
            }
        }
        let dtm = Array2::from_shape_vec((20, 6), values).unwrap();
        let terms: Vec<String> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let base = LdaConfig::default().n_iterations(50).burn_in(10).random_seed(7);
        let selection = SelectionConfig {
            min_topics: 1,
            max_topics: 3,
            ..Default::default()
        };

        let result = select_topic_count(&dtm, &terms, &base, &selection).unwrap();

        assert_eq!(result.scores.len(), 3);
        assert_eq!(
            result.scores.iter().map(|s| s.n_topics).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!((1..=3).contains(&result.selected));
    }

    #[test]
    fn test_select_rejects_bad_range() {
        let dtm = Array2::<f64>::ones((4, 2));
        let terms = vec!["a".to_string(), "b".to_string()];
        let selection = SelectionConfig {
            min_topics: 5,
            max_topics: 2,
            ..Default::default()
        };
        let result = select_topic_count(&dtm, &terms, &LdaConfig::default(), &selection);
        assert!(matches!(result, Err(LdaError::InvalidParameter(_))));
    }
}
