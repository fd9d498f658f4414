//! Anchors: rule-based local explanations for black-box classifiers.
//!
//! Loads a CSV dataset, fits a logistic model to the target column and
//! prints the anchor explaining the model's prediction for one row.

use anchors_core::dataset::encode_labels;
use anchors_core::{AppConfig, Dataset, PerturbationKind, SearchStrategy};
use anchors_model::{Classifier, LogisticRegression};
use anchors_search::AnchorExplainer;
use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "anchors")]
#[command(about = "Explain a classifier's prediction with a high-precision rule")]
#[command(version)]
struct Cli {
    /// CSV file with a header row and numeric columns
    #[arg(long)]
    data: PathBuf,

    /// Name of the label column
    #[arg(long)]
    target: String,

    /// Feature columns to use (defaults to every non-target column)
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Index of the row to explain
    #[arg(long, default_value_t = 0)]
    row: usize,

    /// Search strategy: brute_force, greedy or bandit (overrides config)
    #[arg(long, env = "ANCHORS__SEARCH__STRATEGY")]
    strategy: Option<SearchStrategy>,

    /// Perturbation family: uniform, gaussian or empirical (overrides config)
    #[arg(long, env = "ANCHORS__PERTURBATION__KIND")]
    perturbation: Option<PerturbationKind>,

    /// Minimum precision an anchor must reach (overrides config)
    #[arg(long, env = "ANCHORS__SEARCH__PRECISION_THRESHOLD")]
    threshold: Option<f64>,

    /// Number of perturbation samples (overrides config)
    #[arg(long, env = "ANCHORS__PERTURBATION__SAMPLES")]
    samples: Option<usize>,

    /// RNG seed for reproducible runs (overrides config)
    #[arg(long, env = "ANCHORS__PERTURBATION__SEED")]
    seed: Option<u64>,

    /// Optional TOML/YAML/JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the explanation report to this path as well as stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anchors=info,anchors_search=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if let Some(strategy) = cli.strategy {
        config.search.strategy = strategy;
    }
    if let Some(kind) = cli.perturbation {
        config.perturbation.kind = kind;
    }
    if let Some(threshold) = cli.threshold {
        config.search.precision_threshold = threshold;
    }
    if let Some(samples) = cli.samples {
        config.perturbation.samples = samples;
    }
    if cli.seed.is_some() {
        config.perturbation.seed = cli.seed;
    }
    config.validate()?;

    info!(
        strategy = %config.search.strategy,
        perturbation = %config.perturbation.kind,
        threshold = config.search.precision_threshold,
        samples = config.perturbation.samples,
        "Configuration loaded"
    );

    let raw = Dataset::from_csv_path(&cli.data)
        .with_context(|| format!("reading {}", cli.data.display()))?;
    let (mut features, labels) = raw.split_target(&cli.target)?;
    if !cli.features.is_empty() {
        features = features.select(&cli.features)?;
    }
    let (encoded, classes) = encode_labels(&labels)?;

    let model = LogisticRegression::fit(features.values(), &encoded, &config.model)?;
    info!(
        rows = features.n_rows(),
        features = features.n_features(),
        classes = classes.len(),
        accuracy = model.accuracy(features.values(), &encoded),
        "Model trained"
    );

    let instance = features.row(cli.row).with_context(|| {
        format!(
            "row {} out of range, dataset has {} rows",
            cli.row,
            features.n_rows()
        )
    })?;
    let predicted = model.predict(instance);
    let label = classes
        .get(predicted)
        .copied()
        .with_context(|| format!("model predicted class {predicted} with no label"))?;
    info!(row = cli.row, class = predicted, label = label, "Explaining prediction");

    let mut rng = match config.perturbation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let explainer = AnchorExplainer::new(config)?;
    let explanation = explainer.explain(&model, &features, instance, &mut rng)?;

    if !explanation.feasible {
        warn!("No anchor reached the precision threshold; reporting the best candidate");
    }
    info!(%explanation, "Explanation ready");

    println!("{}", explanation.to_json()?);
    if let Some(path) = cli.report {
        explanation.write_json(&path)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}
