//! Anchor search engine: perturbation sampling, precision/coverage
//! metrics, cut-point grids, and three candidate-search strategies
//! (brute force, sequential greedy, UCB1 bandit) behind one explainer.

pub mod bandit;
pub mod brute_force;
pub mod cut_points;
pub mod explainer;
pub mod greedy;
pub mod metrics;
pub mod perturbation;

pub use bandit::{BanditOutcome, BanditSearch};
pub use brute_force::{BruteForceOutcome, BruteForceSearch};
pub use cut_points::CutGrid;
pub use explainer::{AnchorExplainer, Explanation, StrategyDetail};
pub use greedy::{GreedyOutcome, GreedySearch};
pub use metrics::{AnchorMetrics, SampleSet};
pub use perturbation::PerturbationDistribution;
