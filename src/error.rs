use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures at the I/O edges of the pipeline.
///
/// Row-level parse issues, mapping gaps and KPI zero-guards are values, not
/// errors; they never show up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feed file '{}' is {size_mb:.1} MB, limit is {limit_mb} MB", path.display())]
    FileTooLarge {
        path: PathBuf,
        size_mb: f64,
        limit_mb: u64,
    },
    #[error("no mapping preset named '{0}'")]
    UnknownPreset(String),
    #[error("no uploaded data available")]
    NoUploadedData,
    #[error("invalid mapping override '{0}', expected FIELD=HEADER")]
    InvalidMappingOverride(String),
}
