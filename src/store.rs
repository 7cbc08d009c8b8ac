//! The active data source and its KPI snapshot.
//!
//! `DataContext` is owned by the composing application. Each source switch
//! builds a complete `Snapshot` first and then installs it with one pointer
//! swap under the write lock. Readers therefore never see a half-swapped
//! collection.

use crate::error::PipelineError;
use crate::kpi::compute_kpis;
use crate::types::{Kpi, ProgressPoint, Project};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Sample,
    Uploaded,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Sample => f.write_str("sample"),
            DataSource::Uploaded => f.write_str("uploaded"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub projects: Vec<Project>,
    pub points: Vec<ProgressPoint>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.points.is_empty()
    }
}

/// A dataset together with the KPIs computed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source: DataSource,
    pub data: Arc<Dataset>,
    pub kpi: Kpi,
}

impl Snapshot {
    fn build(source: DataSource, data: Arc<Dataset>) -> Self {
        let kpi = compute_kpis(&data.projects, &data.points);
        Self { source, data, kpi }
    }
}

static SAMPLE: Lazy<Arc<Dataset>> = Lazy::new(|| {
    Arc::new(Dataset {
        projects: vec![
            Project {
                name: Some("Sample Project 1".into()),
                length_km: Some(50.0),
                state: Some("MH".into()),
                ..Project::new("P1")
            },
            Project {
                name: Some("Sample Project 2".into()),
                length_km: Some(30.0),
                state: Some("GJ".into()),
                ..Project::new("P2")
            },
        ],
        points: vec![
            ProgressPoint {
                planned_physical_pct: Some(40.0),
                actual_physical_pct: Some(38.0),
                cumulative_planned: Some(100.0),
                cumulative_actual: Some(95.0),
                ..ProgressPoint::new("P1", "2025-07-01")
            },
            ProgressPoint {
                planned_physical_pct: Some(35.0),
                actual_physical_pct: Some(28.0),
                cumulative_planned: Some(80.0),
                cumulative_actual: Some(70.0),
                ..ProgressPoint::new("P2", "2025-07-01")
            },
        ],
    })
});

/// The built-in two-project sample portfolio.
pub fn sample_dataset() -> Arc<Dataset> {
    Arc::clone(&SAMPLE)
}

struct Inner {
    active: Arc<Snapshot>,
    uploaded: Option<Arc<Dataset>>,
}

pub struct DataContext {
    inner: RwLock<Inner>,
}

impl Default for DataContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DataContext {
    /// Starts on the sample source.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                active: Arc::new(Snapshot::build(DataSource::Sample, sample_dataset())),
                uploaded: None,
            }),
        }
    }

    /// The snapshot currently in effect.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner).active)
    }

    pub fn has_uploaded(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .uploaded
            .as_ref()
            .is_some_and(|d| !d.is_empty())
    }

    /// Store freshly normalized data as the uploaded source and make it active.
    pub fn set_uploaded(&self, projects: Vec<Project>, points: Vec<ProgressPoint>) -> Arc<Snapshot> {
        let data = Arc::new(Dataset { projects, points });
        let snap = Arc::new(Snapshot::build(DataSource::Uploaded, Arc::clone(&data)));
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.uploaded = Some(data);
            inner.active = Arc::clone(&snap);
        }
        info!(
            projects = snap.data.projects.len(),
            points = snap.data.points.len(),
            "switched to uploaded data"
        );
        snap
    }

    pub fn switch_to_sample(&self) -> Arc<Snapshot> {
        let snap = Arc::new(Snapshot::build(DataSource::Sample, sample_dataset()));
        self.inner.write().unwrap_or_else(PoisonError::into_inner).active = Arc::clone(&snap);
        info!("switched to sample data");
        snap
    }

    /// Re-activate the last uploaded dataset. Fails when nothing was uploaded.
    pub fn switch_to_uploaded(&self) -> Result<Arc<Snapshot>, PipelineError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let data = match &inner.uploaded {
            Some(d) if !d.is_empty() => Arc::clone(d),
            _ => return Err(PipelineError::NoUploadedData),
        };
        let snap = Arc::new(Snapshot::build(DataSource::Uploaded, data));
        inner.active = Arc::clone(&snap);
        drop(inner);
        info!("switched to uploaded data");
        Ok(snap)
    }
}
