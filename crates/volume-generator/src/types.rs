//! Core types for volume generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, Result};

/// A single geotagged, timestamped observation.
///
/// `categories` is aligned with the owning [`RecordSet`]'s
/// `category_columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Record {
    /// Create an unweighted record without categories.
    pub fn new(timestamp: DateTime<Utc>, lon: f64, lat: f64) -> Self {
        Self {
            timestamp,
            lon,
            lat,
            weight: None,
            categories: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_categories<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = values.into_iter().map(Into::into).collect();
        self
    }

    /// Weight used by weighted aggregations; a missing weight counts as NaN.
    pub fn weight_or_nan(&self) -> f64 {
        self.weight.unwrap_or(f64::NAN)
    }
}

/// A tabular set of records sharing one list of category columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub category_columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Create an empty set with the given category columns.
    pub fn new(category_columns: Vec<String>) -> Self {
        Self {
            category_columns,
            records: Vec::new(),
        }
    }

    /// Build a set, checking every record carries one value per column.
    pub fn from_records(category_columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        let mut set = Self::new(category_columns);
        set.records.reserve(records.len());
        for record in records {
            set.push(record)?;
        }
        Ok(set)
    }

    /// Append a record.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if record.categories.len() != self.category_columns.len() {
            return Err(GeneratorError::load(format!(
                "record has {} category values, expected {}",
                record.categories.len(),
                self.category_columns.len()
            )));
        }
        self.records.push(record);
        Ok(())
    }

    /// Derived set with the same columns and different records.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            category_columns: self.category_columns.clone(),
            records,
        }
    }

    /// Position of a category column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.category_columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Numeric width slices are quantized to before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Float32,
    Float64,
    Int32,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int32 => "int32",
        }
    }

    /// Whether the type can carry the NaN missing marker.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Bytes per cell in an encoded slice.
    pub fn byte_width(&self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Round a value through this type's precision.
    ///
    /// NaN survives for float types; integer types truncate toward zero and
    /// saturate, so NaN becomes 0.
    #[inline]
    pub fn quantize(&self, value: f64) -> f64 {
        match self {
            Self::Float32 => f64::from(value as f32),
            Self::Float64 => value,
            Self::Int32 => f64::from(value as i32),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
