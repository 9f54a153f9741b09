//! Ordered collections of aggregated slices.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// One time bucket's aggregated grid, row-major, `x_size * y_size` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub timestamp: DateTime<Utc>,
    pub cells: Vec<f64>,
}

impl Slice {
    /// Number of cells holding a value (not NaN).
    pub fn defined_cells(&self) -> usize {
        self.cells.iter().filter(|v| !v.is_nan()).count()
    }

    /// Whether at least one cell holds a value.
    pub fn has_data(&self) -> bool {
        self.cells.iter().any(|v| !v.is_nan())
    }

    /// Min and max over defined cells.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// All slices of one subset, keyed by bucket start, with a running value range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volume {
    slices: BTreeMap<DateTime<Utc>, Slice>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Volume {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slice and fold its defined cells into the running min/max.
    ///
    /// A slice already stored for the same timestamp is replaced.
    pub fn add_slice(&mut self, timestamp: DateTime<Utc>, cells: Vec<f64>) {
        let slice = Slice { timestamp, cells };
        if let Some((lo, hi)) = slice.range() {
            self.min = Some(self.min.map_or(lo, |m| m.min(lo)));
            self.max = Some(self.max.map_or(hi, |m| m.max(hi)));
        }
        self.slices.insert(timestamp, slice);
    }

    /// Smallest defined cell value across all slices.
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Largest defined cell value across all slices.
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Slices in timestamp order.
    pub fn slices(&self) -> impl Iterator<Item = &Slice> {
        self.slices.values()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.slices.keys()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}
