use serde::Deserialize;
use std::path::Path;

use crate::error::{AnchorError, AnchorResult};
use crate::types::{PerturbationKind, SearchStrategy};

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `ANCHORS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub perturbation: PerturbationConfig,
    #[serde(default)]
    pub brute_force: BruteForceConfig,
    #[serde(default)]
    pub bandit: BanditConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub strategy: SearchStrategy,
    #[serde(default = "default_precision_threshold")]
    pub precision_threshold: f64,
    #[serde(default = "default_max_predicates")]
    pub max_predicates: usize,
    #[serde(default = "default_max_cuts_per_feature")]
    pub max_cuts_per_feature: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerturbationConfig {
    #[serde(default)]
    pub kind: PerturbationKind,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BruteForceConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BanditConfig {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_exploration")]
    pub exploration: f64,
    #[serde(default = "default_penalty")]
    pub penalty: f64,
    #[serde(default = "default_patience")]
    pub patience: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default)]
    pub l2: f64,
}

// Default functions
fn default_precision_threshold() -> f64 {
    0.95
}
fn default_max_predicates() -> usize {
    4
}
fn default_max_cuts_per_feature() -> usize {
    32
}
fn default_samples() -> usize {
    1000
}
fn default_scale() -> f64 {
    1.0
}
fn default_workers() -> usize {
    4
}
fn default_max_candidates() -> usize {
    250_000
}
fn default_rounds() -> usize {
    200
}
fn default_exploration() -> f64 {
    2.0
}
fn default_penalty() -> f64 {
    0.5
}
fn default_patience() -> usize {
    3
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_epochs() -> usize {
    500
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            precision_threshold: default_precision_threshold(),
            max_predicates: default_max_predicates(),
            max_cuts_per_feature: default_max_cuts_per_feature(),
        }
    }
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            kind: PerturbationKind::default(),
            samples: default_samples(),
            scale: default_scale(),
            seed: None,
        }
    }
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_candidates: default_max_candidates(),
        }
    }
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            exploration: default_exploration(),
            penalty: default_penalty(),
            patience: default_patience(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            l2: 0.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(path: Option<&Path>) -> AnchorResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("ANCHORS")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no search can run with.
    pub fn validate(&self) -> AnchorResult<()> {
        let threshold = self.search.precision_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(AnchorError::InvalidConfig(format!(
                "precision_threshold must lie in (0, 1], got {threshold}"
            )));
        }
        if self.search.max_predicates == 0 {
            return Err(AnchorError::InvalidConfig(
                "max_predicates must be at least 1".to_string(),
            ));
        }
        if self.search.max_cuts_per_feature == 0 {
            return Err(AnchorError::InvalidConfig(
                "max_cuts_per_feature must be at least 1".to_string(),
            ));
        }
        if self.perturbation.samples == 0 {
            return Err(AnchorError::InvalidConfig(
                "perturbation samples must be at least 1".to_string(),
            ));
        }
        if !(self.perturbation.scale > 0.0) {
            return Err(AnchorError::InvalidConfig(format!(
                "perturbation scale must be positive, got {}",
                self.perturbation.scale
            )));
        }
        if self.brute_force.workers == 0 {
            return Err(AnchorError::InvalidConfig(
                "brute_force workers must be at least 1".to_string(),
            ));
        }
        if self.bandit.rounds == 0 {
            return Err(AnchorError::InvalidConfig(
                "bandit rounds must be at least 1".to_string(),
            ));
        }
        if self.bandit.penalty < 0.0 || self.bandit.exploration < 0.0 {
            return Err(AnchorError::InvalidConfig(
                "bandit penalty and exploration must be non-negative".to_string(),
            ));
        }
        if self.model.epochs == 0 || !(self.model.learning_rate > 0.0) {
            return Err(AnchorError::InvalidConfig(
                "model epochs and learning_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
