pub mod config;
pub mod dataset;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use dataset::Dataset;
pub use error::{AnchorError, AnchorResult};
pub use types::{PerturbationKind, SearchStrategy};
