use thiserror::Error;

pub type AnchorResult<T> = Result<T, AnchorError>;

#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("Feature columns not present in dataset: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AnchorError {
    fn from(err: config::ConfigError) -> Self {
        AnchorError::InvalidConfig(err.to_string())
    }
}
