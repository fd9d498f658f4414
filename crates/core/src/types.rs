//! Shared enums referenced by configuration and by the search crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnchorError;

/// Candidate-search strategy used to construct an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Full enumeration of every cut-point box containing the instance.
    BruteForce,
    /// Sequential greedy tightening, one predicate per step.
    #[default]
    Greedy,
    /// UCB1 over outward moves of the box sides.
    Bandit,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BruteForce => write!(f, "brute_force"),
            Self::Greedy => write!(f, "greedy"),
            Self::Bandit => write!(f, "bandit"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "brute_force" | "bruteforce" => Ok(Self::BruteForce),
            "greedy" => Ok(Self::Greedy),
            "bandit" | "ucb" => Ok(Self::Bandit),
            other => Err(AnchorError::InvalidConfig(format!(
                "unknown search strategy '{other}'"
            ))),
        }
    }
}

/// Perturbation distribution family used to sample synthetic neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationKind {
    /// Independent uniform draws over each feature's observed range.
    #[default]
    Uniform,
    /// Independent normal draws centred on the local instance.
    Gaussian,
    /// Bootstrap resampling of dataset rows.
    Empirical,
}

impl fmt::Display for PerturbationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Gaussian => write!(f, "gaussian"),
            Self::Empirical => write!(f, "empirical"),
        }
    }
}

impl FromStr for PerturbationKind {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "gaussian" | "normal" => Ok(Self::Gaussian),
            "empirical" | "bootstrap" => Ok(Self::Empirical),
            other => Err(AnchorError::InvalidConfig(format!(
                "unknown perturbation kind '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse_aliases() {
        assert_eq!("brute-force".parse::<SearchStrategy>().unwrap(), SearchStrategy::BruteForce);
        assert_eq!("Greedy".parse::<SearchStrategy>().unwrap(), SearchStrategy::Greedy);
        assert_eq!("ucb".parse::<SearchStrategy>().unwrap(), SearchStrategy::Bandit);
        assert!("annealing".parse::<SearchStrategy>().is_err());
    }

    #[test]
    fn test_strategy_display_matches_serde() {
        for strategy in [
            SearchStrategy::BruteForce,
            SearchStrategy::Greedy,
            SearchStrategy::Bandit,
        ] {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{strategy}\""));
        }
    }

    #[test]
    fn test_perturbation_kind_parse() {
        assert_eq!("normal".parse::<PerturbationKind>().unwrap(), PerturbationKind::Gaussian);
        assert!("laplace".parse::<PerturbationKind>().is_err());
    }
}
