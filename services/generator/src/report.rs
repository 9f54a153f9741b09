//! Serializable run summary.

use std::collections::{BTreeMap, BTreeSet};

use grid_common::format_timestamp;
use serde::Serialize;
use volume_generator::{GenerationSummary, SubsetReport};

/// Summary of a full run, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub layer_id: String,
    pub x_size: usize,
    pub y_size: usize,
    pub records: usize,
    pub categories: BTreeMap<String, BTreeSet<String>>,
    pub subsets: Vec<SubsetLine>,
}

/// One subset of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SubsetLine {
    pub label: String,
    pub records: usize,
    /// Bucket starts of the exported slices
    pub timestamps: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SubsetReport> for SubsetLine {
    fn from(report: &SubsetReport) -> Self {
        Self {
            label: report.label.clone(),
            records: report.records,
            timestamps: report
                .slices
                .iter()
                .map(|s| format_timestamp(&s.timestamp))
                .collect(),
            min: report.min,
            max: report.max,
            error: report.error.clone(),
        }
    }
}

impl RunReport {
    pub fn new(layer_id: &str, records: usize, summary: &GenerationSummary) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            x_size: summary.x_size,
            y_size: summary.y_size,
            records,
            categories: summary.categories.clone(),
            subsets: summary.subsets.iter().map(SubsetLine::from).collect(),
        }
    }

    pub fn failed(&self) -> usize {
        self.subsets.iter().filter(|s| s.error.is_some()).count()
    }
}
