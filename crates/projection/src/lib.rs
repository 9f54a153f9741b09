//! Coordinate transformations used before spatial binning.
//!
//! Implements map projections from scratch without external dependencies.

pub mod mercator;

pub use mercator::project_latitude;
