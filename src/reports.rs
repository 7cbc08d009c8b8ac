use crate::kpi::{is_at_risk, latest_by_project};
use crate::types::{
    FinancialSeriesRow, PhysicalSeriesRow, ProgressPoint, Project, ProjectStatusRow,
};
use crate::util::{format_inr, format_percent, MISSING};
use std::collections::{BTreeMap, HashMap};

/// Portfolio cumulative spend per date.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSeriesPoint {
    pub date: String,
    pub cumulative_actual: Option<f64>,
    pub cumulative_planned: Option<f64>,
}

/// Mean physical progress per date.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalSeriesPoint {
    pub date: String,
    pub actual: Option<f64>,
    pub planned: Option<f64>,
}

/// Latest figures for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStatus {
    pub project_id: String,
    pub latest_date: Option<String>,
    pub physical_pct: Option<f64>,
    pub cumulative_actual: Option<f64>,
    pub cumulative_planned: Option<f64>,
    pub variance: Option<f64>,
    pub at_risk: bool,
}

fn add(slot: &mut Option<f64>, v: Option<f64>) {
    if let Some(v) = v {
        *slot = Some(slot.unwrap_or(0.0) + v);
    }
}

pub fn financial_series(points: &[ProgressPoint]) -> Vec<FinancialSeriesPoint> {
    let mut by_date: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for p in points {
        if p.date.is_empty() {
            continue;
        }
        let e = by_date.entry(p.date.as_str()).or_default();
        add(&mut e.0, p.cumulative_actual);
        add(&mut e.1, p.cumulative_planned);
    }
    by_date
        .into_iter()
        .map(|(date, (actual, planned))| FinancialSeriesPoint {
            date: date.to_string(),
            cumulative_actual: actual,
            cumulative_planned: planned,
        })
        .collect()
}

pub fn physical_series(points: &[ProgressPoint]) -> Vec<PhysicalSeriesPoint> {
    #[derive(Default)]
    struct Acc {
        actual_sum: f64,
        actual_n: usize,
        planned_sum: f64,
        planned_n: usize,
    }
    let mut by_date: BTreeMap<&str, Acc> = BTreeMap::new();
    for p in points {
        if p.date.is_empty() {
            continue;
        }
        let e = by_date.entry(p.date.as_str()).or_default();
        if let Some(a) = p.actual_physical_pct {
            e.actual_sum += a;
            e.actual_n += 1;
        }
        if let Some(pl) = p.planned_physical_pct {
            e.planned_sum += pl;
            e.planned_n += 1;
        }
    }
    by_date
        .into_iter()
        .map(|(date, acc)| PhysicalSeriesPoint {
            date: date.to_string(),
            actual: (acc.actual_n > 0).then(|| acc.actual_sum / acc.actual_n as f64),
            planned: (acc.planned_n > 0).then(|| acc.planned_sum / acc.planned_n as f64),
        })
        .collect()
}

/// One row per project in project order, from its latest point.
pub fn project_status(projects: &[Project], points: &[ProgressPoint]) -> Vec<ProjectStatus> {
    let latest: HashMap<&str, &ProgressPoint> = latest_by_project(points)
        .into_iter()
        .map(|pt| (pt.project_id.as_str(), pt))
        .collect();
    projects
        .iter()
        .map(|pr| {
            let pt = latest.get(pr.id.as_str()).copied();
            let cumulative_actual = pt.and_then(|p| p.cumulative_actual);
            let cumulative_planned = pt.and_then(|p| p.cumulative_planned);
            let variance = match (cumulative_actual, cumulative_planned) {
                (Some(a), Some(p)) => Some(a - p),
                _ => None,
            };
            ProjectStatus {
                project_id: pr.id.clone(),
                latest_date: pt.map(|p| p.date.clone()),
                physical_pct: pt.and_then(|p| p.actual_physical_pct),
                cumulative_actual,
                cumulative_planned,
                variance,
                at_risk: pt.map_or(false, is_at_risk),
            }
        })
        .collect()
}

pub fn render_project_status(rows: &[ProjectStatus]) -> Vec<ProjectStatusRow> {
    rows.iter()
        .map(|r| ProjectStatusRow {
            project_id: r.project_id.clone(),
            latest_date: r.latest_date.clone().unwrap_or_else(|| MISSING.to_string()),
            physical_pct: format_percent(r.physical_pct, 1),
            cumulative_actual: format_inr(r.cumulative_actual),
            cumulative_planned: format_inr(r.cumulative_planned),
            variance: format_inr(r.variance),
            status: if r.at_risk { "At Risk" } else { "On Track" }.to_string(),
        })
        .collect()
}

pub fn render_financial_series(rows: &[FinancialSeriesPoint]) -> Vec<FinancialSeriesRow> {
    rows.iter()
        .map(|r| FinancialSeriesRow {
            date: r.date.clone(),
            cumulative_actual: format_inr(r.cumulative_actual),
            cumulative_planned: format_inr(r.cumulative_planned),
        })
        .collect()
}

pub fn render_physical_series(rows: &[PhysicalSeriesPoint]) -> Vec<PhysicalSeriesRow> {
    rows.iter()
        .map(|r| PhysicalSeriesRow {
            date: r.date.clone(),
            actual: format_percent(r.actual, 1),
            planned: format_percent(r.planned, 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(id: &str, date: &str) -> ProgressPoint {
        ProgressPoint::new(id, date)
    }

    #[test]
    fn financial_series_sums_present_values_by_date() {
        let points = vec![
            ProgressPoint { cumulative_actual: Some(10.0), cumulative_planned: Some(12.0), ..pt("P1", "2025-07-15") },
            ProgressPoint { cumulative_actual: Some(5.0), ..pt("P2", "2025-07-15") },
            ProgressPoint { cumulative_planned: Some(3.0), ..pt("P1", "2025-07-01") },
            ProgressPoint { cumulative_actual: Some(99.0), ..pt("P1", "") },
        ];
        let series = financial_series(&points);
        assert_eq!(
            series,
            vec![
                FinancialSeriesPoint { date: "2025-07-01".into(), cumulative_actual: None, cumulative_planned: Some(3.0) },
                FinancialSeriesPoint { date: "2025-07-15".into(), cumulative_actual: Some(15.0), cumulative_planned: Some(12.0) },
            ]
        );
    }

    #[test]
    fn physical_series_averages_available_values() {
        let points = vec![
            ProgressPoint { actual_physical_pct: Some(40.0), planned_physical_pct: Some(50.0), ..pt("P1", "2025-07-01") },
            ProgressPoint { actual_physical_pct: Some(20.0), ..pt("P2", "2025-07-01") },
            ProgressPoint { cumulative_actual: Some(1.0), ..pt("P2", "2025-07-02") },
        ];
        let series = physical_series(&points);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].actual, Some(30.0));
        assert_eq!(series[0].planned, Some(50.0));
        assert_eq!(series[1].actual, None);
        assert_eq!(series[1].planned, None);
    }

    #[test]
    fn project_status_uses_latest_point_and_flags_risk() {
        let projects = vec![Project::new("P1"), Project::new("P2")];
        let points = vec![
            ProgressPoint { actual_physical_pct: Some(20.0), planned_physical_pct: Some(40.0), ..pt("P1", "2025-07-15") },
            ProgressPoint { cumulative_actual: Some(95.0), cumulative_planned: Some(100.0), ..pt("P1", "2025-07-01") },
        ];
        let rows = project_status(&projects, &points);
        assert_eq!(rows[0].latest_date.as_deref(), Some("2025-07-15"));
        assert_eq!(rows[0].physical_pct, Some(20.0));
        assert_eq!(rows[0].variance, None);
        assert!(rows[0].at_risk);
        assert_eq!(rows[1].latest_date, None);
        assert!(!rows[1].at_risk);

        let rendered = render_project_status(&rows);
        assert_eq!(rendered[0].status, "At Risk");
        assert_eq!(rendered[0].physical_pct, "20.0%");
        assert_eq!(rendered[1].latest_date, "—");
        assert_eq!(rendered[1].variance, "—");
    }
}
