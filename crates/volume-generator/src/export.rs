//! Export boundary: slice encoding, local persistence and progress delivery.

use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use grid_common::GeoBounds;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeneratorError, Result};
use crate::generator::GenerationSummary;
use crate::types::ValueType;

/// Metadata shared by every slice of a run, plus the slice timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceMetadata {
    /// ISO 8601 bucket duration, e.g. `PT15M`
    pub slice_duration: String,
    pub timezone: String,
    pub layer_id: String,
    pub x_size: usize,
    pub y_size: usize,
    pub value_type: ValueType,
    pub geo_bounds: GeoBounds,
    /// Bucket start in UTC, `YYYY-MM-DDTHH:MM:SSZ`
    pub timestamp: String,
}

/// Summary returned alongside an encoded payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceSummary {
    pub metadata: SliceMetadata,
    pub defined_cells: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// An encoded slice ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSlice {
    pub timestamp: DateTime<Utc>,
    pub summary: SliceSummary,
    pub bytes: Bytes,
}

/// Turns a slice's cells into a payload.
pub trait SliceEncoder: Send + Sync {
    fn encode(&self, cells: &[f64], metadata: &SliceMetadata) -> Result<(SliceSummary, Bytes)>;
}

/// Plain little-endian cell dump in the configured value type.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSliceEncoder;

impl SliceEncoder for RawSliceEncoder {
    fn encode(&self, cells: &[f64], metadata: &SliceMetadata) -> Result<(SliceSummary, Bytes)> {
        let expected = metadata.x_size * metadata.y_size;
        if cells.len() != expected {
            return Err(GeneratorError::Encode(format!(
                "slice has {} cells, grid is {}x{}",
                cells.len(),
                metadata.x_size,
                metadata.y_size
            )));
        }

        let mut defined_cells = 0;
        let mut range: Option<(f64, f64)> = None;
        for &v in cells.iter().filter(|v| !v.is_nan()) {
            defined_cells += 1;
            range = Some(range.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))));
        }

        let summary = SliceSummary {
            metadata: metadata.clone(),
            defined_cells,
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
        };
        Ok((summary, encode_cells(cells, metadata.value_type)))
    }
}

/// Serialize cells as little-endian values of `value_type`.
pub fn encode_cells(cells: &[f64], value_type: ValueType) -> Bytes {
    let mut buf = BytesMut::with_capacity(cells.len() * value_type.byte_width());
    for &v in cells {
        match value_type {
            ValueType::Float32 => buf.put_f32_le(v as f32),
            ValueType::Float64 => buf.put_f64_le(v),
            ValueType::Int32 => buf.put_i32_le(v as i32),
        }
    }
    buf.freeze()
}

/// Persists raw slices.
pub trait SliceWriter: Send + Sync {
    fn write(
        &self,
        cells: &[f64],
        value_type: ValueType,
        layer_id: &str,
        subset_label: &str,
        timestamp: &DateTime<Utc>,
    ) -> Result<()>;
}

/// Writes `<root>/<layer_id>/<subset_label>/<timestamp>.raw`.
#[derive(Debug, Clone)]
pub struct RawFileWriter {
    root: PathBuf,
}

impl RawFileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a slice is written to.
    ///
    /// `layer_id` and every `/`-separated part of `subset_label` must be a
    /// plain name: no `.` or `..`, no `\`, no NUL. The result always stays
    /// under the root.
    pub fn slice_path(
        &self,
        layer_id: &str,
        subset_label: &str,
        timestamp: &DateTime<Utc>,
    ) -> Result<PathBuf> {
        let mut path = self.root.join(checked_part(layer_id)?);
        for part in subset_label.split('/').filter(|p| !p.is_empty()) {
            path.push(checked_part(part)?);
        }
        path.push(format!("{}.raw", timestamp.format("%Y%m%dT%H%M%SZ")));
        Ok(path)
    }
}

fn checked_part(part: &str) -> Result<&str> {
    let unsafe_part = part.is_empty()
        || part == "."
        || part == ".."
        || part.contains(['/', '\\', '\0']);
    if unsafe_part {
        return Err(GeneratorError::Write(format!(
            "'{}' is not a valid path component",
            part
        )));
    }
    Ok(part)
}

impl SliceWriter for RawFileWriter {
    fn write(
        &self,
        cells: &[f64],
        value_type: ValueType,
        layer_id: &str,
        subset_label: &str,
        timestamp: &DateTime<Utc>,
    ) -> Result<()> {
        let path = self.slice_path(layer_id, subset_label, timestamp)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| GeneratorError::Write(format!("{}: {}", dir.display(), e)))?;
        }
        std::fs::write(&path, encode_cells(cells, value_type))
            .map_err(|e| GeneratorError::Write(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), cells = cells.len(), "Wrote raw slice");
        Ok(())
    }
}

/// Receives results as subsets complete.
///
/// `on_subset` calls are made from the orchestrating thread in subset order.
pub trait ProgressSink {
    fn on_subset(&self, _label: &str, _slices: &[EncodedSlice]) {}

    fn on_finish(&self, _summary: &GenerationSummary) {}
}

/// Sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {}
