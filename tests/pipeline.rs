use review_insights::aspects::{AspectExtractor, AspectSentimentPair};
use review_insights::data::{Review, ReviewLoader};
use review_insights::error::ModelError;
use review_insights::pipeline::Pipeline;
use review_insights::sentiment::{
    BinarySentiment, RefinedLabel, Refiner, RefinerInput, SentimentLabel, SentimentSource,
};
use review_insights::utils::Config;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const HEADER: &str = "reviewId,content,score,at,thumbsUpCount,appVersion,replyContent,repliedAt";

/// Positive for even-length texts, Negative otherwise
struct ParityRefiner;

impl Refiner for ParityRefiner {
    fn name(&self) -> &str {
        "parity"
    }

    fn classify(&self, batch: &[RefinerInput<'_>]) -> Result<Vec<RefinedLabel>, ModelError> {
        Ok(batch
            .iter()
            .map(|input| RefinedLabel {
                label: if input.text.len() % 2 == 0 {
                    BinarySentiment::Positive
                } else {
                    BinarySentiment::Negative
                },
                confidence: 0.75,
            })
            .collect())
    }
}

/// Reports an "otp" aspect; any batch containing "EXPLODE" fails
struct OtpExtractor;

impl AspectExtractor for OtpExtractor {
    fn name(&self) -> &str {
        "otp"
    }

    fn extract(&self, texts: &[&str]) -> Result<Vec<Vec<AspectSentimentPair>>, ModelError> {
        if texts.iter().any(|t| t.contains("EXPLODE")) {
            return Err(ModelError::Resource("batch failed".into()));
        }
        Ok(texts
            .iter()
            .map(|t| {
                if t.to_lowercase().contains("otp") {
                    vec![AspectSentimentPair::new("otp", SentimentLabel::Negative)]
                } else {
                    Vec::new()
                }
            })
            .collect())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.topics.n_iterations = 60;
    config.topics.burn_in = 10;
    config.aspects.batch_size = 4;
    config
}

/// 12 negative, 12 positive, one neutral, one empty, one failing aspect batch
fn write_reviews(path: &Path) {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..6 {
        lines.push(format!(
            "n{:02}a,\"Worst app, otp not received, login failed\",1,2024-03-{:02} 10:00:00,0,7.1.0,,",
            i,
            i + 1
        ));
        lines.push(format!(
            "n{:02}b,\"Terrible delivery, cylinder late, refund failed\",2,2024-03-{:02} 11:00:00,0,7.1.0,,",
            i,
            i + 1
        ));
        lines.push(format!(
            "p{:02}a,\"Excellent booking, fast payment, great app\",5,2024-03-{:02} 12:00:00,4,7.2.0,,",
            i,
            i + 1
        ));
        lines.push(format!(
            "p{:02}b,\"Amazing delivery, cylinder arrived quickly, good service\",4,2024-03-{:02} 13:00:00,2,7.2.0,,",
            i,
            i + 1
        ));
    }
    lines.push("q01,Booked cylinder yesterday,3,2024-03-20 09:00:00,0,7.2.0,,".to_string());
    lines.push("q02,,,2024-03-21 09:00:00,0,7.2.0,,".to_string());
    lines.push(",missing id,5,2024-03-22 09:00:00,0,7.2.0,,".to_string());
    lines.push("n00a,duplicate,1,2024-03-22 09:00:00,0,7.2.0,,".to_string());
    std::fs::write(path, lines.join("\n") + "\n").unwrap();
}

fn pipeline() -> Pipeline {
    Pipeline::new(test_config())
        .with_refiner(Arc::new(ParityRefiner))
        .with_aspect_extractor(Arc::new(OtpExtractor))
}

fn read_enriched(path: &Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}

#[test]
fn test_end_to_end_artifacts() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("reviews.csv");
    write_reviews(&input);

    let (output, paths) = pipeline().run_file(&input, dir.path().join("out")).unwrap();

    assert_eq!(output.records.len(), 26);
    assert_eq!(output.summary.skipped_rows, 2);

    let rows = read_enriched(&paths.enriched);
    assert_eq!(rows.len(), 26);
    let ids: Vec<&str> = rows.iter().map(|r| r["reviewId"].as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let by_id: HashMap<&str, &HashMap<String, String>> =
        rows.iter().map(|r| (r["reviewId"].as_str(), r)).collect();

    let positive = by_id["p00a"];
    assert_eq!(positive["sentiment_label"], "Positive");
    assert_eq!(positive["sentiment_source"], "rule_based");
    assert_eq!(positive["date"], "2024-03-01");

    let negative = by_id["n00a"];
    assert_eq!(negative["sentiment_label"], "Negative");
    assert_eq!(negative["content"], "Worst app, otp not received, login failed");
    assert!(negative["topic_label"].starts_with("Topic "));
    assert!(!negative["topic_keywords"].is_empty());

    let neutral = by_id["q01"];
    assert_eq!(neutral["sentiment_source"], "refined");
    assert_eq!(neutral["sentiment_degraded"], "false");
    assert!(["Positive", "Negative"].contains(&neutral["sentiment_label"].as_str()));

    let empty = by_id["q02"];
    assert_eq!(empty["content"], "");
    assert_eq!(empty["rating"], "");
    assert_eq!(empty["topic_id"], "");
    assert_eq!(empty["topic_label"], "");
    assert_eq!(empty["aspects_degraded"], "false");

    let keywords: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.topic_keywords).unwrap()).unwrap();
    assert_eq!(keywords["negative_topics"].as_object().unwrap().len(), 4);
    assert!(keywords["negative_topics"]["1"].is_array());
    assert!(keywords["positive_topics"]["4"].is_array());

    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.metrics).unwrap()).unwrap();
    assert_eq!(metrics["labels"][0], "Negative");
    assert_eq!(metrics["n_rated"], 25);
    assert!(metrics["classification_report"]["negative"]["f1-score"].is_number());

    let aspects = std::fs::read_to_string(&paths.aspects).unwrap();
    assert!(aspects.starts_with("Aspect,Sentiment,Review_Text,Rating,Date,App_Version"));
    assert_eq!(aspects.lines().count(), 1 + 6);
}

#[test]
fn test_failed_aspect_batch_is_degraded_not_fatal() {
    let reviews = vec![
        Review::new("a", "otp fine"),
        Review::new("b", "EXPLODE otp"),
        Review::new("c", "otp again"),
    ];
    let mut config = test_config();
    config.aspects.batch_size = 2;

    let output = Pipeline::new(config)
        .with_refiner(Arc::new(ParityRefiner))
        .with_aspect_extractor(Arc::new(OtpExtractor))
        .run(&reviews)
        .unwrap();

    let degraded: Vec<bool> = output.records.iter().map(|r| r.aspects_degraded).collect();
    assert_eq!(degraded, vec![true, true, false]);
    assert!(output.records[0].aspects.is_empty());
    assert_eq!(output.records[2].aspects.len(), 1);
    assert_eq!(output.summary.aspects_degraded, 2);
}

#[test]
fn test_degraded_mode_without_refiner() {
    let reviews = vec![
        Review::new("1", "Excellent booking, fast payment, great app"),
        Review::new("2", "Booked cylinder yesterday"),
        Review::new("3", "Worst app, otp not received, login failed"),
    ];

    let output = Pipeline::new(test_config())
        .without_refiner()
        .run(&reviews)
        .unwrap();

    let labels: Vec<SentimentLabel> = output.records.iter().map(|r| r.label()).collect();
    assert_eq!(
        labels,
        vec![
            SentimentLabel::Positive,
            SentimentLabel::Neutral,
            SentimentLabel::Negative
        ]
    );
    assert_eq!(output.records[1].sentiment.source, SentimentSource::Fallback);
    assert!(output.records[1].sentiment_degraded());
    assert!(!output.records[0].sentiment_degraded());
}

#[test]
fn test_refiner_result_maps_to_final_label() {
    let reviews = vec![
        Review::new("1", "Excellent booking, fast payment, great app"),
        Review::new("2", "Booked cylinder yesterday!"),
        Review::new("3", "Worst app, otp not received, login failed"),
    ];

    let output = pipeline().run(&reviews).unwrap();

    assert_eq!(output.records[0].label(), SentimentLabel::Positive);
    assert_eq!(output.records[1].sentiment.source, SentimentSource::Refined);
    assert_eq!(output.records[1].label(), SentimentLabel::Positive);
    assert_eq!(output.records[1].sentiment.refiner_confidence, Some(0.75));
    assert_eq!(output.records[2].label(), SentimentLabel::Negative);
}

#[test]
fn test_runs_are_idempotent() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("reviews.csv");
    write_reviews(&input);

    let (first, first_paths) = pipeline().run_file(&input, dir.path().join("a")).unwrap();
    let (second, second_paths) = pipeline().run_file(&input, dir.path().join("b")).unwrap();

    assert_eq!(first.records, second.records);
    for (a, b) in [
        (&first_paths.enriched, &second_paths.enriched),
        (&first_paths.aspects, &second_paths.aspects),
        (&first_paths.topic_keywords, &second_paths.topic_keywords),
        (&first_paths.metrics, &second_paths.metrics),
    ] {
        assert_eq!(
            std::fs::read_to_string(a).unwrap(),
            std::fs::read_to_string(b).unwrap()
        );
    }
}

#[test]
fn test_loader_reports_skipped_rows() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("reviews.csv");
    write_reviews(&input);

    let report = ReviewLoader::load(&input).unwrap();
    assert_eq!(report.reviews.len(), 26);
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn test_duplicate_ids_keep_first_review_and_its_sentiment() {
    let reviews = vec![
        Review::new("x", "Excellent amazing great service"),
        Review::new("x", "Worst terrible horrible useless"),
        Review::new("y", "Booked cylinder yesterday"),
    ];

    let output = Pipeline::new(test_config())
        .without_refiner()
        .run(&reviews)
        .unwrap();

    assert_eq!(output.records.len(), 2);
    assert_eq!(output.summary.skipped_rows, 1);

    let kept = &output.records[0];
    assert_eq!(kept.id(), "x");
    assert_eq!(kept.review.text, "Excellent amazing great service");
    assert_eq!(kept.label(), SentimentLabel::Positive);
    assert!(kept.sentiment.compound > 0.6);
}
