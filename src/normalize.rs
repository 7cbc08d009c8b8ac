// Mapped feed rows -> canonical projects and progress points.
//
// Rows whose project id is blank after trimming are dropped without an error.
// Every other row emits exactly one point: physical rows first, then
// financial rows, each in input order.
use crate::mapping::{CanonicalField, FeedSchema, FieldMapping};
use crate::types::{Cell, ProgressPoint, Project, Row};
use crate::util::{coerce_cell, is_sortable_date};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Rows, mapping and schema for one feed.
#[derive(Debug, Clone, Copy)]
pub struct MappedFeed<'a> {
    pub schema: &'a FeedSchema,
    pub mapping: &'a FieldMapping,
    pub rows: &'a [Row],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub physical_rows: usize,
    pub financial_rows: usize,
    pub dropped_blank_ids: usize,
    pub unsortable_dates: usize,
    pub projects: usize,
    pub points: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub projects: Vec<Project>,
    pub points: Vec<ProgressPoint>,
    pub report: NormalizeReport,
}

pub fn normalize(physical: MappedFeed<'_>, financial: MappedFeed<'_>) -> Normalized {
    let mut out = Normalized::default();
    let mut seen: HashSet<String> = HashSet::new();
    out.report.physical_rows = physical.rows.len();
    out.report.financial_rows = financial.rows.len();

    for feed in [physical, financial] {
        for row in feed.rows {
            let Some(project_id) = project_id(feed.mapping, row) else {
                out.report.dropped_blank_ids += 1;
                continue;
            };
            if seen.insert(project_id.clone()) {
                out.projects.push(Project::new(project_id.clone()));
            }

            let date = feed
                .mapping
                .cell(row, CanonicalField::Date)
                .map(|c| c.to_string().trim().to_string())
                .unwrap_or_default();
            if !is_sortable_date(&date) {
                out.report.unsortable_dates += 1;
            }

            let mut point = ProgressPoint::new(project_id, date);
            for field in &feed.schema.point_fields {
                apply_point_field(&mut point, *field, feed.mapping.cell(row, *field));
            }
            out.points.push(point);
        }
    }

    out.report.projects = out.projects.len();
    out.report.points = out.points.len();
    if out.report.unsortable_dates > 0 {
        warn!(
            count = out.report.unsortable_dates,
            "points with non ISO-8601 dates; latest-point selection compares date strings"
        );
    }
    info!(
        projects = out.report.projects,
        points = out.report.points,
        dropped = out.report.dropped_blank_ids,
        "normalized feeds"
    );
    out
}

/// Fill absent project metadata from the feed's project fields. The first
/// non-empty value seen for a project wins; existing values are never
/// overwritten.
pub fn enrich_projects(projects: &mut [Project], feed: MappedFeed<'_>) -> usize {
    let index: HashMap<String, usize> = projects
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();
    let mut filled = 0usize;
    for row in feed.rows {
        let Some(id) = project_id(feed.mapping, row) else {
            continue;
        };
        let Some(&i) = index.get(&id) else {
            continue;
        };
        for field in &feed.schema.project_fields {
            if apply_project_field(&mut projects[i], *field, feed.mapping.cell(row, *field)) {
                filled += 1;
            }
        }
    }
    filled
}

fn project_id(mapping: &FieldMapping, row: &Row) -> Option<String> {
    let id = mapping.cell(row, CanonicalField::ProjectId)?.to_string();
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn text(cell: Option<&Cell>) -> Option<String> {
    cell.filter(|c| !c.is_blank()).map(|c| c.to_string())
}

fn apply_point_field(point: &mut ProgressPoint, field: CanonicalField, cell: Option<&Cell>) {
    match field {
        CanonicalField::PlannedPhysicalPct => point.planned_physical_pct = coerce_cell(cell),
        CanonicalField::ActualPhysicalPct => point.actual_physical_pct = coerce_cell(cell),
        CanonicalField::PlannedAmount => point.planned_amount = coerce_cell(cell),
        CanonicalField::ActualAmount => point.actual_amount = coerce_cell(cell),
        CanonicalField::CumulativePlanned => point.cumulative_planned = coerce_cell(cell),
        CanonicalField::CumulativeActual => point.cumulative_actual = coerce_cell(cell),
        CanonicalField::FundingSource => point.funding_source = text(cell),
        CanonicalField::Milestone => point.milestone = text(cell),
        _ => {}
    }
}

fn apply_project_field(project: &mut Project, field: CanonicalField, cell: Option<&Cell>) -> bool {
    fn fill<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
        if slot.is_none() && value.is_some() {
            *slot = value;
            true
        } else {
            false
        }
    }
    match field {
        CanonicalField::ProjectName => fill(&mut project.name, text(cell)),
        CanonicalField::State => fill(&mut project.state, text(cell)),
        CanonicalField::Corridor => fill(&mut project.corridor, text(cell)),
        CanonicalField::Contractor => fill(&mut project.contractor, text(cell)),
        CanonicalField::LengthKm => fill(&mut project.length_km, coerce_cell(cell)),
        _ => false,
    }
}
