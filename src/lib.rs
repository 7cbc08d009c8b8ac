//! Ingest physical and financial progress feeds, reconcile them into
//! per-project time series, and derive portfolio KPIs plus a token-resolved
//! executive summary.

pub mod config;
pub mod error;
pub mod kpi;
pub mod loader;
pub mod mapping;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod store;
pub mod summary;
pub mod types;
pub mod util;
pub mod validate;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use kpi::compute_kpis;
pub use mapping::{CanonicalField, FeedKind, FeedSchema, FieldMapping, MappingPreset, PresetStore};
pub use store::{DataContext, DataSource, Snapshot};
pub use summary::{generate_draft, resolve_tokens, token_values, ReportTemplate};
pub use types::{Cell, Kpi, ParseIssue, ParsedTable, ProgressPoint, Project, Row};
