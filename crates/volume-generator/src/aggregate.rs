//! Per-cell reduction of binned points.
//!
//! NaN is the missing marker: a cell with no observations has a count of
//! zero, but its weighted sum and mean are undefined rather than zero.

use serde::{Deserialize, Serialize};

use crate::binning::BinCounts;
use crate::error::{GeneratorError, Result};
use crate::types::ValueType;

/// Statistic computed for every cell of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Aggregation {
    /// Number of points; weights are ignored.
    #[default]
    Count,
    /// Sum of point weights.
    Sum,
    /// Mean of point weights.
    Mean,
}

impl Aggregation {
    /// Parse an aggregation by name.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            _ => Err(GeneratorError::UnknownAggregation(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }

    /// Whether the aggregation reads record weights.
    pub fn uses_weights(&self) -> bool {
        !matches!(self, Self::Count)
    }

    /// Reduce binned points into quantized cell values.
    ///
    /// `weights` holds one weight per in-bounds point, aligned with
    /// `bins.index`; it is ignored for [`Aggregation::Count`].
    pub fn apply(&self, bins: &BinCounts, weights: &[f64], value_type: ValueType) -> Vec<f64> {
        let raw = match self {
            Self::Count => bins.counts.iter().map(|&c| c as f64).collect(),
            Self::Sum => weighted_sum(&bins.index, bins.area, &bins.counts, weights, value_type),
            Self::Mean => weighted_mean(&bins.index, bins.area, &bins.counts, weights),
        };
        raw.into_iter().map(|v| value_type.quantize(v)).collect()
    }
}

impl TryFrom<String> for Aggregation {
    type Error = GeneratorError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Aggregation> for String {
    fn from(value: Aggregation) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Histogram of weights over `index`.
fn weight_histogram(index: &[usize], area: usize, weights: &[f64]) -> Vec<f64> {
    debug_assert_eq!(index.len(), weights.len());
    let mut totals = vec![0.0f64; area];
    for (&cell, &weight) in index.iter().zip(weights) {
        totals[cell] += weight;
    }
    totals
}

/// Sum of weights per cell.
///
/// Empty cells are NaN when `value_type` can represent it; integer outputs
/// keep 0 there.
pub fn weighted_sum(
    index: &[usize],
    area: usize,
    counts: &[u64],
    weights: &[f64],
    value_type: ValueType,
) -> Vec<f64> {
    let mut totals = weight_histogram(index, area, weights);
    if value_type.is_float() {
        for (total, &count) in totals.iter_mut().zip(counts) {
            if count == 0 {
                *total = f64::NAN;
            }
        }
    }
    totals
}

/// Mean weight per cell; `0 / 0` leaves empty cells NaN.
pub fn weighted_mean(index: &[usize], area: usize, counts: &[u64], weights: &[f64]) -> Vec<f64> {
    weight_histogram(index, area, weights)
        .into_iter()
        .zip(counts)
        .map(|(total, &count)| total / count as f64)
        .collect()
}
