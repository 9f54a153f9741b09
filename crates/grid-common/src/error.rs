//! Error types for grid and time primitives.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while constructing grids, bounding boxes and time specs.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid time zone: {0}")]
    InvalidTimeZone(String),
}
