//! Orchestration of a generation run.
//!
//! ```text
//! RecordSet
//!    │
//!    ├─► filter time intervals ─► project latitudes ─► fold days (optional)
//!    │
//!    ├─► decompose into subsets (additive tuples / named groups)
//!    │
//!    └─► per subset:
//!          group_by_time ─► bin_count + aggregate per bucket ─► Volume
//!             │
//!             └─► encode non-empty slices, write locally, notify sink
//! ```
//!
//! Subsets are independent: a failure while exporting one subset is recorded
//! in its report and never stops the others.

use chrono::{DateTime, Utc};
use grid_common::{format_timestamp, GridGeometry};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregation;
use crate::binning::bin_count;
use crate::bucketing::{filter_time_intervals, fold_to_reference_day, group_by_time};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::export::{
    EncodedSlice, NullSink, ProgressSink, RawSliceEncoder, SliceEncoder, SliceMetadata,
    SliceWriter,
};
use crate::sizing::GeometrySizer;
use crate::subsets::{
    default_groups, CategoryExtractor, CategoryOptions, DeclaredCategories, Decomposition,
    PathLabeler, Subset, SubsetLabeler,
};
use crate::types::{Record, RecordSet};
use crate::volume::Volume;

/// Outcome of one subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetReport {
    pub label: String,
    /// Records the subset was built from.
    pub records: usize,
    /// Encoded non-empty slices, in time order.
    pub slices: Vec<EncodedSlice>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Export failure, if any.
    pub error: Option<String>,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub x_size: usize,
    pub y_size: usize,
    pub categories: CategoryOptions,
    pub subsets: Vec<SubsetReport>,
}

impl GenerationSummary {
    /// Reports that ended with an error.
    pub fn failures(&self) -> impl Iterator<Item = &SubsetReport> {
        self.subsets.iter().filter(|s| s.error.is_some())
    }
}

/// Builds per-subset volumes from point records.
///
/// Configuration and grid geometry are fixed at construction.
pub struct Generator {
    config: GeneratorConfig,
    grid: GridGeometry,
    encoder: Box<dyn SliceEncoder>,
    writer: Option<Box<dyn SliceWriter>>,
    labeler: Box<dyn SubsetLabeler>,
    extractor: Box<dyn CategoryExtractor>,
}

impl Generator {
    /// Validate `config` and size the grid.
    pub fn new(config: GeneratorConfig, sizer: &dyn GeometrySizer) -> Result<Self> {
        config.validate()?;
        let sizing = sizer.size_grid(&config.bbox, config.cell_size, config.resolution)?;
        let grid = GridGeometry::from_sizing(sizing, config.mercator_conversion)?;

        info!(
            layer_id = %config.layer_id,
            x_size = grid.x_size,
            y_size = grid.y_size,
            step = grid.step,
            "Sized grid"
        );

        Ok(Self {
            config,
            grid,
            encoder: Box::new(RawSliceEncoder),
            writer: None,
            labeler: Box::new(PathLabeler),
            extractor: Box::new(DeclaredCategories),
        })
    }

    pub fn with_encoder(mut self, encoder: impl SliceEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn with_writer(mut self, writer: impl SliceWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn with_labeler(mut self, labeler: impl SubsetLabeler + 'static) -> Self {
        self.labeler = Box::new(labeler);
        self
    }

    pub fn with_extractor(mut self, extractor: impl CategoryExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    /// Apply interval filtering, latitude projection and day folding.
    ///
    /// Returns a new recordset; `set` is not modified.
    pub fn prepare(&self, set: &RecordSet) -> RecordSet {
        let mut records = filter_time_intervals(&set.records, &self.config.time_intervals);

        if self.config.mercator_conversion {
            for record in &mut records {
                record.lat = projection::project_latitude(record.lat);
            }
        }

        if self.config.approximated {
            records = fold_to_reference_day(&records, &self.config.timezone);
        }

        set.with_records(records)
    }

    /// Aggregate one bucket's records into a slice.
    ///
    /// Returns `None` when no record falls inside the grid.
    pub fn calculate_slice(&self, records: &[&Record]) -> Option<Vec<f64>> {
        let lon: Vec<f64> = records.iter().map(|r| r.lon).collect();
        let lat: Vec<f64> = records.iter().map(|r| r.lat).collect();
        let bins = bin_count(&self.grid, &lon, &lat);
        if bins.in_bounds() == 0 {
            return None;
        }

        let aggregation = self.config.aggregation();
        let weights = if aggregation.uses_weights() {
            let all: Vec<f64> = records.iter().map(|r| r.weight_or_nan()).collect();
            bins.select(&all)
        } else {
            Vec::new()
        };

        Some(aggregation.apply(&bins, &weights, self.config.value_type))
    }

    /// Bucket `records` by time and aggregate every bucket.
    ///
    /// Records must already be prepared (see [`Generator::prepare`]).
    pub fn build_volume<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Result<Volume> {
        let buckets = group_by_time(
            records,
            self.config.slice_duration.duration(),
            &self.config.timezone,
        )?;

        let mut volume = Volume::new();
        for bucket in &buckets {
            match self.calculate_slice(&bucket.records) {
                Some(cells) => volume.add_slice(bucket.start, cells),
                None => debug!(
                    bucket = %format_timestamp(&bucket.start),
                    records = bucket.len(),
                    "Bucket has no points inside the grid"
                ),
            }
        }
        Ok(volume)
    }

    fn slice_metadata(&self, timestamp: &DateTime<Utc>) -> SliceMetadata {
        SliceMetadata {
            slice_duration: self.config.slice_duration.to_string(),
            timezone: self.config.timezone.to_string(),
            layer_id: self.config.layer_id.clone(),
            x_size: self.grid.x_size,
            y_size: self.grid.y_size,
            value_type: self.config.value_type,
            geo_bounds: self.config.bbox.geo_bounds(),
            timestamp: format_timestamp(timestamp),
        }
    }

    /// Encode every slice holding data and persist it when a writer is set.
    pub fn export_volume(&self, label: &str, volume: &Volume) -> Result<Vec<EncodedSlice>> {
        let mut encoded = Vec::with_capacity(volume.len());
        for slice in volume.slices().filter(|s| s.has_data()) {
            let metadata = self.slice_metadata(&slice.timestamp);
            let (summary, bytes) = self.encoder.encode(&slice.cells, &metadata)?;

            if let Some(writer) = &self.writer {
                writer.write(
                    &slice.cells,
                    self.config.value_type,
                    &self.config.layer_id,
                    label,
                    &slice.timestamp,
                )?;
            }

            encoded.push(EncodedSlice {
                timestamp: slice.timestamp,
                summary,
                bytes,
            });
        }
        Ok(encoded)
    }

    fn process_subset(&self, subset: &Subset, records: &[&Record], columns: &[String]) -> SubsetReport {
        let label = self.labeler.label(subset, columns);
        let mut report = SubsetReport {
            label,
            records: records.len(),
            slices: Vec::new(),
            min: None,
            max: None,
            error: None,
        };

        let outcome = self.build_volume(records.iter().copied()).and_then(|volume| {
            report.min = volume.min();
            report.max = volume.max();
            self.export_volume(&report.label, &volume)
        });

        match outcome {
            Ok(slices) => {
                info!(
                    subset = %report.label,
                    records = report.records,
                    slices = slices.len(),
                    "Subset complete"
                );
                report.slices = slices;
            }
            Err(e) => {
                warn!(subset = %report.label, error = %e, "Subset failed");
                report.error = Some(e.to_string());
            }
        }
        report
    }

    fn decomposition(&self, columns: &[String], options: &CategoryOptions) -> Decomposition {
        if self.config.additive {
            Decomposition::Additive
        } else if self.config.groups.is_empty() {
            Decomposition::NonAdditive(default_groups(columns, options))
        } else {
            Decomposition::NonAdditive(self.config.groups.clone())
        }
    }

    /// Run every subset, reporting to `sink` as each completes.
    pub fn generate_with(&self, set: &RecordSet, sink: &dyn ProgressSink) -> Result<GenerationSummary> {
        let data = self.prepare(set);
        let columns = self.extractor.columns(&data);
        let categories = self.extractor.options(&data, &columns);

        info!(
            layer_id = %self.config.layer_id,
            input = set.len(),
            kept = data.len(),
            categories = columns.len(),
            aggregation = %self.config.aggregation(),
            additive = self.config.additive,
            "Generating volumes"
        );

        let subsets = if data.is_empty() {
            Vec::new()
        } else {
            self.decomposition(&columns, &categories)
                .decompose(&data, &columns)
        };

        let reports = if self.config.parallel {
            let reports: Vec<SubsetReport> = subsets
                .par_iter()
                .map(|(subset, records)| self.process_subset(subset, records, &columns))
                .collect();
            for report in &reports {
                sink.on_subset(&report.label, &report.slices);
            }
            reports
        } else {
            subsets
                .iter()
                .map(|(subset, records)| {
                    let report = self.process_subset(subset, records, &columns);
                    sink.on_subset(&report.label, &report.slices);
                    report
                })
                .collect()
        };

        let summary = GenerationSummary {
            x_size: self.grid.x_size,
            y_size: self.grid.y_size,
            categories,
            subsets: reports,
        };
        sink.on_finish(&summary);
        Ok(summary)
    }

    /// Run every subset without a progress sink.
    pub fn generate(&self, set: &RecordSet) -> Result<GenerationSummary> {
        self.generate_with(set, &NullSink)
    }

    /// Aggregation in effect for this generator.
    pub fn aggregation(&self) -> Aggregation {
        self.config.aggregation()
    }
}
