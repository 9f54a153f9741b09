//! Error types for volume generation.

use thiserror::Error;

/// Errors that can occur while generating volumes.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Aggregation name outside `count`, `sum`, `mean`.
    #[error("unknown aggregation '{0}', expected one of: count, sum, mean")]
    UnknownAggregation(String),

    /// Grid sizing failed.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Slice duration is zero or negative.
    #[error("invalid slice duration: {0}")]
    InvalidDuration(String),

    /// Failed to load records.
    #[error("failed to load records: {0}")]
    Load(String),

    /// Failed to encode a slice.
    #[error("failed to encode slice: {0}")]
    Encode(String),

    /// Failed to persist a slice.
    #[error("failed to write slice: {0}")]
    Write(String),

    /// Grid or time primitive error.
    #[error(transparent)]
    Grid(#[from] grid_common::GridError),
}

impl GeneratorError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Load error.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }
}

impl From<serde_json::Error> for GeneratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Load(err.to_string())
    }
}

impl From<serde_yaml::Error> for GeneratorError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;
