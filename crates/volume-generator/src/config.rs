//! Configuration for a generator instance.

use std::path::Path;

use grid_common::{BoundingBox, IsoDuration, TimeInterval, TimeZoneSpec};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::error::{GeneratorError, Result};
use crate::subsets::NamedGroup;
use crate::types::ValueType;

/// Immutable settings shared by every subset of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Area of interest.
    pub bbox: BoundingBox,

    /// Cell size in meters, handed to the grid sizer.
    pub cell_size: f64,

    /// Explicit `(x_size, y_size)` grid override.
    #[serde(default)]
    pub resolution: Option<(usize, usize)>,

    /// Layer identifier attached to exported slices.
    pub layer_id: String,

    /// Bucket duration, ISO 8601 (`PT15M`, `P1D`, ...).
    pub slice_duration: IsoDuration,

    /// Output numeric width.
    #[serde(default)]
    pub value_type: ValueType,

    /// Zone bucket boundaries are aligned in.
    #[serde(default, alias = "tz")]
    pub timezone: TimeZoneSpec,

    /// Fold every record onto one reference day before bucketing.
    #[serde(default)]
    pub approximated: bool,

    /// Only records inside at least one interval are kept.
    #[serde(default)]
    pub time_intervals: Vec<TimeInterval>,

    /// Project latitudes before binning.
    #[serde(default = "default_true")]
    pub mercator_conversion: bool,

    /// Per-cell statistic; absent means a plain count.
    #[serde(default)]
    pub weight_function: Option<Aggregation>,

    /// Disjoint partitions (true) or named groups (false).
    #[serde(default = "default_true")]
    pub additive: bool,

    /// Non-additive groups; generated from observed values when empty.
    #[serde(default)]
    pub groups: Vec<NamedGroup>,

    /// Process subsets on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl GeneratorConfig {
    /// Minimal configuration; everything else takes its default.
    pub fn new(
        bbox: BoundingBox,
        cell_size: f64,
        layer_id: impl Into<String>,
        slice_duration: IsoDuration,
    ) -> Self {
        Self {
            bbox,
            cell_size,
            resolution: None,
            layer_id: layer_id.into(),
            slice_duration,
            value_type: ValueType::default(),
            timezone: TimeZoneSpec::default(),
            approximated: false,
            time_intervals: Vec::new(),
            mercator_conversion: true,
            weight_function: None,
            additive: true,
            groups: Vec::new(),
            parallel: false,
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GeneratorError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Override selected fields from environment variables and re-validate.
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(val) = std::env::var("VOLUME_LAYER_ID") {
            self.layer_id = val;
        }

        if let Ok(val) = std::env::var("VOLUME_TIMEZONE") {
            self.timezone = TimeZoneSpec::parse(&val)?;
        }

        if let Ok(val) = std::env::var("VOLUME_PARALLEL") {
            self.parallel = val.to_lowercase() == "true" || val == "1";
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.bbox.validate()?;

        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(GeneratorError::config(format!(
                "cell_size must be > 0, got {}",
                self.cell_size
            )));
        }

        if let Some((x, y)) = self.resolution {
            if x == 0 || y == 0 {
                return Err(GeneratorError::config(format!(
                    "resolution must be positive, got {}x{}",
                    x, y
                )));
            }
        }

        if self.slice_duration.duration().num_milliseconds() <= 0 {
            return Err(GeneratorError::InvalidDuration(
                self.slice_duration.to_string(),
            ));
        }

        if self.layer_id.trim().is_empty() {
            return Err(GeneratorError::config("layer_id must not be empty"));
        }

        Ok(())
    }

    /// Aggregation applied per cell.
    pub fn aggregation(&self) -> Aggregation {
        self.weight_function.unwrap_or_default()
    }
}
