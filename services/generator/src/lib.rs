//! Command-line runner for point-volume generation.
//!
//! Loads a YAML layer configuration and a JSON recordset, runs the
//! generator and reports a per-subset summary.

pub mod report;
pub mod run;
pub mod sink;

pub use report::{RunReport, SubsetLine};
pub use run::{run, RunOptions};
pub use sink::LoggingSink;
