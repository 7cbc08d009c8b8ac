//! Mapping and row checks that gate the "proceed" action.
//!
//! Validation is a pure projection of (schema, mapping, rows): it never
//! mutates parsed data, and the same inputs always produce the same issue list.

use crate::mapping::{CanonicalField, FeedKind, FeedSchema, FieldMapping};
use crate::types::{Cell, Row};
use crate::util::coerce_cell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A required field has no source header.
    MissingMapping,
    /// The row has no value for a required text field.
    Blank,
    /// The row's value is not a finite number, or is out of bounds.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub feed: FeedKind,
    /// Zero-based row index; `None` for mapping issues.
    pub row: Option<usize>,
    pub field: CanonicalField,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, self.kind) {
            (None, _) | (_, IssueKind::MissingMapping) => {
                write!(f, "{}: missing mapping for {}", self.feed, self.field)
            }
            (Some(row), IssueKind::Blank) => {
                write!(f, "{} row {}: {} blank", self.feed, row + 1, self.field)
            }
            (Some(row), IssueKind::Invalid) => {
                write!(f, "{} row {}: {} invalid", self.feed, row + 1, self.field)
            }
        }
    }
}

/// One issue per required field without a source header.
pub fn validate_mapping(schema: &FeedSchema, mapping: &FieldMapping) -> Vec<ValidationIssue> {
    schema
        .required
        .iter()
        .filter(|f| mapping.mapped(**f).is_none())
        .map(|f| ValidationIssue {
            feed: schema.kind,
            row: None,
            field: *f,
            kind: IssueKind::MissingMapping,
        })
        .collect()
}

/// Check the first `preview_rows` rows: blank project id, blank date, and the
/// schema's numeric rule.
pub fn validate_rows(
    schema: &FeedSchema,
    mapping: &FieldMapping,
    rows: &[Row],
    preview_rows: usize,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (idx, row) in rows.iter().take(preview_rows).enumerate() {
        for field in [CanonicalField::ProjectId, CanonicalField::Date] {
            let blank = read_mapped(mapping, row, field).map_or(true, |c| c.is_blank());
            if blank {
                issues.push(ValidationIssue {
                    feed: schema.kind,
                    row: Some(idx),
                    field,
                    kind: IssueKind::Blank,
                });
            }
        }

        let rule = schema.numeric_rule;
        let value = coerce_cell(read_mapped(mapping, row, rule.field));
        let ok = match (value, rule.bounds) {
            (None, _) => false,
            (Some(v), Some((lo, hi))) => v >= lo && v <= hi,
            (Some(_), None) => true,
        };
        if !ok {
            issues.push(ValidationIssue {
                feed: schema.kind,
                row: Some(idx),
                field: rule.field,
                kind: IssueKind::Invalid,
            });
        }
    }
    issues
}

/// A feed as seen by the validator: its schema, its mapping and its rows.
#[derive(Debug, Clone, Copy)]
pub struct FeedInput<'a> {
    pub schema: &'a FeedSchema,
    pub mapping: &'a FieldMapping,
    pub rows: &'a [Row],
}

/// Validate every feed in order: mapping issues, then row issues, per feed.
pub fn validate_feeds(feeds: &[FeedInput<'_>], preview_rows: usize) -> Vec<ValidationIssue> {
    feeds
        .iter()
        .flat_map(|feed| {
            let mut issues = validate_mapping(feed.schema, feed.mapping);
            issues.extend(validate_rows(feed.schema, feed.mapping, feed.rows, preview_rows));
            issues
        })
        .collect()
}

// Required fields are read through the explicit mapping only, so an unmapped
// field shows up as blank/invalid rows as well as a mapping issue.
fn read_mapped<'r>(
    mapping: &FieldMapping,
    row: &'r Row,
    field: CanonicalField,
) -> Option<&'r Cell> {
    mapping.mapped(field).and_then(|h| row.get(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Cell::from(*v)))
            .collect()
    }

    fn messages(issues: &[ValidationIssue]) -> Vec<String> {
        issues.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn unmapped_required_fields_are_reported_once_each() {
        let schema = FeedSchema::financial();
        let mut mapping = schema.identity_mapping();
        mapping.clear(CanonicalField::ActualAmount);
        mapping.set(CanonicalField::Date, "");
        assert_eq!(
            messages(&validate_mapping(&schema, &mapping)),
            vec![
                "Financial: missing mapping for Date",
                "Financial: missing mapping for ActualAmount"
            ]
        );
    }

    #[test]
    fn physical_rows_check_blank_and_range() {
        let schema = FeedSchema::physical();
        let mapping = schema.identity_mapping();
        let rows = vec![
            row(&[("ProjectID", "P1"), ("Date", "2025-07-01"), ("ActualPhysicalPct", "38")]),
            row(&[("ProjectID", " "), ("Date", ""), ("ActualPhysicalPct", "101")]),
            row(&[("ProjectID", "P3"), ("Date", "2025-07-01"), ("ActualPhysicalPct", "n/a")]),
            row(&[("ProjectID", "P4"), ("Date", "2025-07-01"), ("ActualPhysicalPct", "100")]),
        ];
        assert_eq!(
            messages(&validate_rows(&schema, &mapping, &rows, 50)),
            vec![
                "Physical row 2: ProjectID blank",
                "Physical row 2: Date blank",
                "Physical row 2: ActualPhysicalPct invalid",
                "Physical row 3: ActualPhysicalPct invalid",
            ]
        );
    }

    #[test]
    fn financial_amounts_are_unbounded() {
        let schema = FeedSchema::financial();
        let mapping = schema.identity_mapping();
        let rows = vec![
            row(&[("ProjectID", "P1"), ("Date", "2025-07-01"), ("ActualAmount", "-2,500")]),
            row(&[("ProjectID", "P1"), ("Date", "2025-07-01"), ("ActualAmount", "")]),
        ];
        assert_eq!(
            messages(&validate_rows(&schema, &mapping, &rows, 50)),
            vec!["Financial row 2: ActualAmount invalid"]
        );
    }

    #[test]
    fn row_checks_stop_at_preview_window() {
        let schema = FeedSchema::physical();
        let mapping = schema.identity_mapping();
        let rows: Vec<Row> = (0..60).map(|_| row(&[("ProjectID", "")])).collect();
        let issues = validate_rows(&schema, &mapping, &rows, 50);
        assert_eq!(issues.len(), 150);
        assert_eq!(issues.last().and_then(|i| i.row), Some(49));
    }

    #[test]
    fn feeds_are_reported_in_order_and_deterministically() {
        let phys = FeedSchema::physical();
        let fin = FeedSchema::financial();
        let phys_map = FieldMapping::default();
        let fin_map = fin.identity_mapping();
        let phys_rows = vec![row(&[("ProjectID", "P1")])];
        let fin_rows = vec![row(&[("ProjectID", "P1"), ("Date", "2025-07-01"), ("ActualAmount", "x")])];
        let feeds = [
            FeedInput { schema: &phys, mapping: &phys_map, rows: &phys_rows },
            FeedInput { schema: &fin, mapping: &fin_map, rows: &fin_rows },
        ];
        let first = validate_feeds(&feeds, 50);
        assert_eq!(first, validate_feeds(&feeds, 50));
        assert_eq!(
            messages(&first),
            vec![
                "Physical: missing mapping for ProjectID",
                "Physical: missing mapping for Date",
                "Physical: missing mapping for ActualPhysicalPct",
                "Physical row 1: ProjectID blank",
                "Physical row 1: Date blank",
                "Physical row 1: ActualPhysicalPct invalid",
                "Financial row 1: ActualAmount invalid",
            ]
        );
    }
}
