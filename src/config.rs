use std::path::PathBuf;

use crate::summary::ReportTemplate;

/// Rows inspected by the row-level validator.
pub const DEFAULT_PREVIEW_ROWS: usize = 50;
/// Largest feed file accepted by `loader::parse_path`.
pub const DEFAULT_MAX_CSV_SIZE_MB: u64 = 25;

/// Runtime knobs for the ingest-to-report pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Number of leading rows per feed checked by the row validator.
    pub preview_rows: usize,
    /// Upper bound on feed file size, in megabytes.
    pub max_csv_size_mb: u64,
    /// JSON file backing the mapping preset store.
    pub presets_path: PathBuf,
    /// Directory receiving exported tables and the summary document.
    pub output_dir: PathBuf,
    /// Template used for the generated summary draft.
    pub template: ReportTemplate,
    /// Fill project metadata from physical rows after normalization.
    pub enrich_projects: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_csv_size_mb: DEFAULT_MAX_CSV_SIZE_MB,
            presets_path: PathBuf::from("mapping_presets.json"),
            output_dir: PathBuf::from("."),
            template: ReportTemplate::default(),
            enrich_projects: false,
        }
    }
}
