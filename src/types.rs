use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tabled::Tabled;

/// A single cell of a parsed feed.
///
/// The CSV parser only ever produces `Text`; `Number` exists for rows built in
/// code (sample data, tests) and is accepted by the numeric coercion as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Whether the cell carries no usable text (numbers are never blank).
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Number(_) => false,
            Cell::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// One data row keyed by source header.
pub type Row = HashMap<String, Cell>;

/// A non-fatal problem found while parsing a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseIssue {
    /// Zero-based data row index, `None` when the issue is not tied to a row.
    pub row: Option<usize>,
    pub code: Option<String>,
    pub message: String,
}

/// Output of the tabular parser: rows, header list and every issue found.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub errors: Vec<ParseIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corridor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contractor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// One observation for a project on a date. Dates are compared as strings,
/// so they must be in a sortable form such as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub project_id: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_physical_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_physical_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_planned: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_source: Option<String>,
    /// Free-text milestone label from the physical feed. Not used by KPIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
}

impl ProgressPoint {
    pub fn new(project_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            date: date.into(),
            ..Self::default()
        }
    }
}

/// Portfolio KPIs computed from one project/point collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub total_projects: usize,
    pub weighted_physical_progress_pct: f64,
    pub financial_progress_pct: f64,
    #[serde(rename = "totalVarianceINR")]
    pub total_variance_inr: f64,
    pub variance_pct: f64,
    pub at_risk_projects: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProjectStatusRow {
    #[serde(rename = "ProjectID")]
    #[tabled(rename = "Project ID")]
    pub project_id: String,
    #[serde(rename = "LastUpdate")]
    #[tabled(rename = "Last Update")]
    pub latest_date: String,
    #[serde(rename = "Physical")]
    #[tabled(rename = "Physical")]
    pub physical_pct: String,
    #[serde(rename = "CumActual")]
    #[tabled(rename = "Cum. Actual")]
    pub cumulative_actual: String,
    #[serde(rename = "CumPlanned")]
    #[tabled(rename = "Cum. Planned")]
    pub cumulative_planned: String,
    #[serde(rename = "Variance")]
    #[tabled(rename = "Variance")]
    pub variance: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FinancialSeriesRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "CumulativeActual")]
    #[tabled(rename = "CumulativeActual")]
    pub cumulative_actual: String,
    #[serde(rename = "CumulativePlanned")]
    #[tabled(rename = "CumulativePlanned")]
    pub cumulative_planned: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PhysicalSeriesRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "ActualPct")]
    #[tabled(rename = "ActualPct")]
    pub actual: String,
    #[serde(rename = "PlannedPct")]
    #[tabled(rename = "PlannedPct")]
    pub planned: String,
}
