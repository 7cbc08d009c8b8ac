//! Portfolio KPIs over canonical projects and progress points.
//!
//! Every ratio goes through `safe_div`: an empty or sparse portfolio yields
//! zeros, never NaN.

use crate::types::{Kpi, ProgressPoint, Project};
use crate::util::safe_div;
use std::collections::HashMap;

/// A project is at risk when latest actual minus planned physical progress is
/// strictly below this many percentage points.
pub const AT_RISK_SLIPPAGE_PCT: f64 = -5.0;

/// Latest point per project, by date string. On equal dates the later point
/// in iteration order wins. Entries keep first-seen project order.
pub fn latest_by_project(points: &[ProgressPoint]) -> Vec<&ProgressPoint> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&ProgressPoint> = Vec::new();
    for pt in points {
        match slot.get(pt.project_id.as_str()) {
            Some(&i) => {
                if pt.date >= latest[i].date {
                    latest[i] = pt;
                }
            }
            None => {
                slot.insert(pt.project_id.as_str(), latest.len());
                latest.push(pt);
            }
        }
    }
    latest
}

/// Whether a latest point counts as at risk; missing percentages count as 0.
pub fn is_at_risk(pt: &ProgressPoint) -> bool {
    let diff = pt.actual_physical_pct.unwrap_or(0.0) - pt.planned_physical_pct.unwrap_or(0.0);
    diff < AT_RISK_SLIPPAGE_PCT
}

pub fn compute_kpis(projects: &[Project], points: &[ProgressPoint]) -> Kpi {
    let total_projects = projects.len();

    // Weighted by length; projects without a length (or unknown ids) weigh 1.
    let length_by_project: HashMap<&str, f64> = projects
        .iter()
        .map(|p| (p.id.as_str(), p.length_km.unwrap_or(1.0)))
        .collect();
    let mut weight_sum = 0.0;
    let mut weighted_actual = 0.0;
    for pt in points {
        if pt.actual_physical_pct.is_none() && pt.planned_physical_pct.is_none() {
            continue;
        }
        let w = length_by_project
            .get(pt.project_id.as_str())
            .copied()
            .unwrap_or(1.0);
        weight_sum += w;
        weighted_actual += pt.actual_physical_pct.unwrap_or(0.0) * w;
    }
    let weighted_physical_progress_pct = safe_div(weighted_actual, weight_sum);

    let latest = latest_by_project(points);
    let (cum_actual, cum_planned) = latest.iter().fold((0.0, 0.0), |(a, p), pt| {
        (
            a + pt.cumulative_actual.unwrap_or(0.0),
            p + pt.cumulative_planned.unwrap_or(0.0),
        )
    });
    let financial_progress_pct = safe_div(cum_actual, cum_planned) * 100.0;
    let total_variance_inr = cum_actual - cum_planned;
    let variance_pct = safe_div(total_variance_inr, cum_planned) * 100.0;
    let at_risk_projects = latest.iter().filter(|pt| is_at_risk(pt)).count();

    Kpi {
        total_projects,
        weighted_physical_progress_pct,
        financial_progress_pct,
        total_variance_inr,
        variance_pct,
        at_risk_projects,
    }
}
