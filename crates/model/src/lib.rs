//! Black-box classifiers explained by the anchor search: the model
//! contract plus a trainable logistic model and synthetic decision
//! regions for demonstrations.

pub mod classifier;
pub mod logistic;
pub mod synthetic;

pub use classifier::{Classifier, FnClassifier};
pub use logistic::LogisticRegression;
pub use synthetic::{RadialClassifier, ThresholdClassifier};
