//! End-to-end flow: parse a CSV, fit a model, explain a row with every
//! strategy, and check the anchor against the training data.

use anchors_core::dataset::encode_labels;
use anchors_core::{AppConfig, Dataset, PerturbationKind, SearchStrategy};
use anchors_model::{Classifier, LogisticRegression};
use anchors_search::{AnchorExplainer, StrategyDetail};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Two well separated clusters; label 1 for the cluster at high `income`.
fn csv() -> String {
    let mut text = String::from("age,income,approved\n");
    for i in 0..40 {
        let jitter = (i % 7) as f64 * 0.5;
        text.push_str(&format!("{},{},0\n", 25.0 + jitter, 20.0 + jitter));
        text.push_str(&format!("{},{},1\n", 45.0 + jitter, 80.0 + jitter));
    }
    text
}

fn fitted() -> (Dataset, LogisticRegression) {
    let raw = Dataset::from_csv_str(&csv()).unwrap();
    let (features, labels) = raw.split_target("approved").unwrap();
    let (encoded, classes) = encode_labels(&labels).unwrap();
    assert_eq!(classes, vec![0.0, 1.0]);
    let model =
        LogisticRegression::fit(features.values(), &encoded, &AppConfig::default().model).unwrap();
    (features, model)
}

#[test]
fn test_explain_each_strategy() {
    let (features, model) = fitted();
    let instance = features.row(1).unwrap().to_owned();
    assert_eq!(model.predict(instance.view()), 1);

    for strategy in [
        SearchStrategy::BruteForce,
        SearchStrategy::Greedy,
        SearchStrategy::Bandit,
    ] {
        let mut config = AppConfig::default();
        config.search.strategy = strategy;
        config.search.precision_threshold = 0.9;
        config.search.max_cuts_per_feature = 12;
        config.perturbation.kind = PerturbationKind::Uniform;
        config.perturbation.samples = 1500;

        let explainer = AnchorExplainer::new(config).unwrap();
        let explanation = explainer
            .explain(&model, &features, instance.view(), &mut StdRng::seed_from_u64(21))
            .unwrap();

        assert!(explanation.feasible, "{strategy}: {explanation}");
        assert_eq!(explanation.target_class, 1);
        assert!(explanation.bounds.contains(instance.view()));

        // Every training row the anchor admits is predicted as the target class.
        let admitted = explanation.anchor.filter(&features).unwrap();
        assert!(admitted.n_rows() > 0);
        for row in admitted.values().rows() {
            assert_eq!(model.predict(row), 1);
        }

        match (&explanation.detail, strategy) {
            (StrategyDetail::BruteForce { grid }, SearchStrategy::BruteForce) => {
                assert!(!grid.is_empty())
            }
            (StrategyDetail::Greedy { steps }, SearchStrategy::Greedy) => {
                assert_eq!(steps.len(), explanation.anchor.len())
            }
            (StrategyDetail::Bandit { arms, .. }, SearchStrategy::Bandit) => {
                assert_eq!(arms.len(), 4)
            }
            (detail, strategy) => panic!("{strategy} produced {detail:?}"),
        }
    }
}

#[test]
fn test_missing_feature_halts() {
    let raw = Dataset::from_csv_str(&csv()).unwrap();
    let err = raw.select(&["age", "tenure"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Feature columns not present in dataset: tenure"
    );
}

#[test]
fn test_explanation_round_trips_through_json_file() {
    let (features, model) = fitted();
    let mut config = AppConfig::default();
    config.perturbation.kind = PerturbationKind::Gaussian;
    config.perturbation.samples = 800;
    config.search.precision_threshold = 0.9;

    let explainer = AnchorExplainer::new(config).unwrap();
    let explanation = explainer
        .explain(&model, &features, features.row(0).unwrap(), &mut StdRng::seed_from_u64(4))
        .unwrap();

    let path = std::env::temp_dir().join(format!("anchors-explanation-{}.json", std::process::id()));
    explanation.write_json(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["target_class"], 0);
    assert_eq!(value["samples"], 800);
    assert_eq!(value["anchor"]["predicates"].as_array().unwrap().len(), explanation.anchor.len());
}
