//! One generation run from files on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use volume_generator::{
    Generator, GeneratorConfig, JsonRecordLoader, RawFileWriter, RecordLoader, ResolutionSizer,
};

use crate::report::RunReport;
use crate::sink::LoggingSink;

/// Inputs of a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// YAML layer configuration
    pub config: PathBuf,
    /// JSON recordset
    pub input: PathBuf,
    /// Root directory for raw slices; nothing is written when absent
    pub output: Option<PathBuf>,
}

/// Load, generate and summarize.
pub fn run(options: &RunOptions) -> Result<RunReport> {
    let config = GeneratorConfig::from_yaml_file(&options.config)
        .with_context(|| format!("Failed to load config {}", options.config.display()))?
        .apply_env_overrides()
        .context("Invalid environment override")?;

    info!(
        layer_id = %config.layer_id,
        slice_duration = %config.slice_duration,
        timezone = %config.timezone,
        "Loaded configuration"
    );

    let set = JsonRecordLoader
        .load_path(&options.input)
        .with_context(|| format!("Failed to load records from {}", options.input.display()))?;
    info!(records = set.len(), columns = ?set.category_columns, "Loaded records");

    let layer_id = config.layer_id.clone();
    let mut generator =
        Generator::new(config, &ResolutionSizer).context("Failed to set up generator")?;
    if let Some(root) = &options.output {
        info!(root = %root.display(), "Writing raw slices");
        generator = generator.with_writer(RawFileWriter::new(root));
    }

    let summary = generator
        .generate_with(&set, &LoggingSink)
        .context("Generation failed")?;

    Ok(RunReport::new(&layer_id, set.len(), &summary))
}
