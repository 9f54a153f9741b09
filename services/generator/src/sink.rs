//! Progress sink that logs each finished subset.

use tracing::info;
use volume_generator::{EncodedSlice, GenerationSummary, ProgressSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl ProgressSink for LoggingSink {
    fn on_subset(&self, label: &str, slices: &[EncodedSlice]) {
        let bytes: usize = slices.iter().map(|s| s.bytes.len()).sum();
        info!(subset = %label, slices = slices.len(), bytes, "Subset exported");
    }

    fn on_finish(&self, summary: &GenerationSummary) {
        info!(
            subsets = summary.subsets.len(),
            failed = summary.failures().count(),
            "Generation finished"
        );
    }
}
