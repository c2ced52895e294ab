//! Review analytics CLI
//!
//! Usage:
//! ```bash
//! cargo run -- --help
//! cargo run -- run --input reviews.csv --output out/
//! cargo run -- score "OTP not received, worst app"
//! cargo run -- select-topics --input reviews.csv --min-k 2 --max-k 8
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use review_insights::{
    data::ReviewLoader,
    pipeline::Pipeline,
    preprocessing::TextNormalizer,
    sentiment::{ConfidenceGate, GateDecision, ValenceLexicon},
    utils::Config,
};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG_FILE: &str = "review-insights.toml";

#[derive(Parser)]
#[command(name = "review-insights")]
#[command(version = "0.1.0")]
#[command(about = "Hybrid sentiment, topics and aspects for app-store reviews", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); without it `review-insights.toml` in the
    /// working directory is tried, then built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging, overriding the configured level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the artifacts
    Run {
        /// Review export (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Skip the refiner; low-confidence reviews use the threshold fallback
        #[arg(long)]
        no_refiner: bool,
    },

    /// Score a single text
    Score {
        /// Text to score
        text: String,
    },

    /// Held-out perplexity per topic count for both polarity subsets
    SelectTopics {
        /// Review export (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Smallest topic count to try
        #[arg(long)]
        min_k: Option<usize>,

        /// Largest topic count to try
        #[arg(long)]
        max_k: Option<usize>,
    },

    /// Write the default configuration
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default(DEFAULT_CONFIG_FILE),
    };

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        match config.logging.level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            input,
            output,
            no_refiner,
        } => run_pipeline(config, &input, &output, no_refiner),
        Commands::Score { text } => run_score(&config, &text),
        Commands::SelectTopics {
            input,
            min_k,
            max_k,
        } => run_select_topics(config, &input, min_k, max_k),
        Commands::InitConfig { path } => {
            Config::create_default(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Default configuration written to {}", path.display());
            Ok(())
        }
    }
}

fn run_pipeline(config: Config, input: &Path, output: &Path, no_refiner: bool) -> Result<()> {
    let mut pipeline = Pipeline::new(config);
    if no_refiner {
        pipeline = pipeline.without_refiner();
    }

    let (result, paths) = pipeline
        .run_file(input, output)
        .with_context(|| format!("Pipeline failed for {}", input.display()))?;

    let summary = &result.summary;
    println!("\nReviews processed: {}", summary.records);
    println!("Rows skipped:      {}", summary.skipped_rows);
    println!(
        "Sentiment:         {} negative / {} neutral / {} positive",
        summary.negative, summary.neutral, summary.positive
    );
    println!(
        "Resolution:        {} rule-based / {} refined / {} degraded",
        summary.rule_based, summary.refined, summary.sentiment_degraded
    );
    println!(
        "Accuracy vs rating: {:.1}% over {} rated reviews",
        result.evaluation.accuracy * 100.0,
        result.evaluation.n_rated
    );

    println!("\nArtifacts:");
    for path in [&paths.enriched, &paths.aspects, &paths.topic_keywords, &paths.metrics] {
        println!("  {}", path.display());
    }

    Ok(())
}

fn run_score(config: &Config, text: &str) -> Result<()> {
    let normalizer = TextNormalizer::with_word_lists(
        config.normalizer.protected_terms.iter().cloned(),
        config.normalizer.custom_stop_words.iter().cloned(),
    );
    let lexicon = ValenceLexicon::new();
    let gate = ConfidenceGate::new(
        config.sentiment.gate_threshold,
        config.sentiment.label_threshold,
    );

    let normalized = normalizer.normalize(text);
    let score = lexicon.score(&normalized.tokens);

    println!("Tokens:   {:?}", normalized.tokens);
    println!("Compound: {:.4}", score.compound);
    for (word, valence) in &score.matched {
        let sign = if *valence > 0.0 { "+" } else { "" };
        println!("  {} ({}{:.2})", word, sign, valence);
    }
    match gate.evaluate(score.compound) {
        GateDecision::Accepted(label) => println!("Gate:     accepted -> {}", label),
        GateDecision::NeedsRefinement => println!(
            "Gate:     needs refinement (fallback label {})",
            gate.label_for(score.compound)
        ),
    }

    Ok(())
}

fn run_select_topics(
    mut config: Config,
    input: &Path,
    min_k: Option<usize>,
    max_k: Option<usize>,
) -> Result<()> {
    if let Some(min_k) = min_k {
        config.topics.min_topics = min_k;
    }
    if let Some(max_k) = max_k {
        config.topics.max_topics = max_k;
    }
    config.validate().context("Invalid topic range")?;

    let report = ReviewLoader::load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    info!(reviews = report.reviews.len(), "Selecting topic counts");

    let pipeline = Pipeline::new(config);
    for (subset, result) in pipeline.select_topic_counts(&report.reviews)? {
        println!("\n{} subset", subset.as_str());
        match result {
            Ok(selection) => {
                println!("{:>4} {:>12}", "K", "perplexity");
                for score in &selection.scores {
                    let marker = if score.n_topics == selection.selected { " <" } else { "" };
                    println!("{:>4} {:>12.2}{}", score.n_topics, score.perplexity, marker);
                }
                println!("Selected K = {}", selection.selected);
            }
            Err(e) => println!("No selection: {}", e),
        }
    }

    Ok(())
}
