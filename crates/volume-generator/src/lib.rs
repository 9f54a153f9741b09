//! Spatio-temporal binning of point records into aggregated grid volumes.
//!
//! Point records (timestamp, longitude, latitude, optional weight and
//! category values) are split into subsets by category, bucketed by time,
//! and binned into a fixed regular grid. Each bucket becomes one slice of
//! per-cell counts, weighted sums or weighted means; the slices of a subset
//! form its volume.
//!
//! # Architecture
//!
//! ```text
//! RecordLoader ─► Generator::prepare ─► Decomposition
//!                                          │
//!                    ┌─────────────────────┘
//!                    ▼
//!   group_by_time ─► bin_count ─► Aggregation::apply ─► Volume
//!                                                        │
//!                 SliceEncoder / SliceWriter / ProgressSink ◄┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use volume_generator::{Generator, GeneratorConfig, JsonRecordLoader, RecordLoader, ResolutionSizer};
//!
//! let config = GeneratorConfig::from_yaml_file("layer.yaml".as_ref())?;
//! let generator = Generator::new(config, &ResolutionSizer)?;
//! let records = JsonRecordLoader.load_path("points.json".as_ref())?;
//! let summary = generator.generate(&records)?;
//! ```

pub mod aggregate;
pub mod binning;
pub mod bucketing;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod loader;
pub mod sizing;
pub mod subsets;
pub mod types;
pub mod volume;

// Re-export commonly used types at crate root
pub use aggregate::Aggregation;
pub use binning::{bin_count, clip_index, BinCounts};
pub use bucketing::{clip_time_intervals, filter_time_intervals, fold_to_reference_day, group_by_time, TimeBucket};
pub use config::GeneratorConfig;
pub use error::{GeneratorError, Result};
pub use export::{
    EncodedSlice, NullSink, ProgressSink, RawFileWriter, RawSliceEncoder, SliceEncoder,
    SliceMetadata, SliceSummary, SliceWriter,
};
pub use generator::{GenerationSummary, Generator, SubsetReport};
pub use loader::{JsonRecordLoader, RecordLoader};
pub use sizing::{FixedSizer, GeometrySizer, ResolutionSizer};
pub use subsets::{
    CategoryExtractor, CategoryOptions, DeclaredCategories, Decomposition, NamedGroup,
    PathLabeler, Subset, SubsetLabeler,
};
pub use types::{Record, RecordSet, ValueType};
pub use volume::{Slice, Volume};
