//! Executive-summary drafting and `{{Token}}` resolution.

use crate::types::Kpi;
use crate::util::{format_inr, format_percent, MISSING};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;

/// Token names accepted by `resolve_tokens`, in editor order.
pub const REPORT_TOKENS: [&str; 7] = [
    "ReportPeriod",
    "TotalProjects",
    "WeightedPhysicalProgress",
    "FinancialProgressPct",
    "TotalVarianceINR",
    "VariancePct",
    "ProjectsAtRisk",
];

/// Variance percentage beyond which the draft adds a narrative sentence.
pub const VARIANCE_NARRATIVE_PCT: f64 = 5.0;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("token pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportTemplate {
    #[default]
    MonthlyProgramSummary,
    QuarterlyFinancialReview,
    DeliveryRiskSnapshot,
}

impl ReportTemplate {
    pub fn label(self) -> &'static str {
        match self {
            ReportTemplate::MonthlyProgramSummary => "Monthly Program Summary",
            ReportTemplate::QuarterlyFinancialReview => "Quarterly Financial Review",
            ReportTemplate::DeliveryRiskSnapshot => "Delivery Risk Snapshot",
        }
    }
}

impl fmt::Display for ReportTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Draft body for `title`: metric lines use placeholders, narrative lines
/// depend on the KPI values.
pub fn generate_draft(kpi: &Kpi, title: &str) -> String {
    let mut lines: Vec<String> = vec![
        format!("# {}", title),
        String::new(),
        "Total Projects: {{TotalProjects}}".to_string(),
        "Weighted Physical Progress: {{WeightedPhysicalProgress}}".to_string(),
        "Financial Progress: {{FinancialProgressPct}}".to_string(),
        "Total Variance: {{TotalVarianceINR}} ({{VariancePct}})".to_string(),
        "Projects At Risk: {{ProjectsAtRisk}}".to_string(),
        String::new(),
    ];
    if kpi.variance_pct > VARIANCE_NARRATIVE_PCT {
        lines.push(
            "Significant adverse financial variance observed; corrective cashflow alignment is recommended."
                .to_string(),
        );
    } else if kpi.variance_pct < -VARIANCE_NARRATIVE_PCT {
        lines.push(
            "Favorable variance against plan; ensure planned commitments are balanced with delivery capacity."
                .to_string(),
        );
    }
    if kpi.at_risk_projects > 0 {
        lines.push(format!(
            "{} project(s) show persistent schedule slippage and require focused expediting.",
            kpi.at_risk_projects
        ));
    }
    lines.join("\n")
}

/// Display values for every report token.
pub fn token_values(kpi: &Kpi, template: ReportTemplate) -> HashMap<String, String> {
    [
        ("ReportPeriod", template.label().to_string()),
        ("TotalProjects", kpi.total_projects.to_string()),
        (
            "WeightedPhysicalProgress",
            format_percent(Some(kpi.weighted_physical_progress_pct), 1),
        ),
        (
            "FinancialProgressPct",
            format_percent(Some(kpi.financial_progress_pct), 1),
        ),
        ("TotalVarianceINR", format_inr(Some(kpi.total_variance_inr))),
        ("VariancePct", format_percent(Some(kpi.variance_pct), 1)),
        ("ProjectsAtRisk", kpi.at_risk_projects.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Replace each `{{ Name }}` with its value, or `—` when unknown. Values are
/// inserted literally and never re-scanned.
pub fn resolve_tokens(text: &str, values: &HashMap<String, String>) -> String {
    TOKEN_RE
        .replace_all(text, |caps: &Captures<'_>| {
            values
                .get(caps[1].trim())
                .cloned()
                .unwrap_or_else(|| MISSING.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_known_repeated_and_unknown_tokens() {
        let v = values(&[("TotalProjects", "2")]);
        assert_eq!(
            resolve_tokens("{{TotalProjects}} / {{ TotalProjects }} / {{Nope}} / {{}}", &v),
            "2 / 2 / — / —"
        );
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let v = values(&[("A", "x")]);
        assert_eq!(resolve_tokens("plain { text } here", &v), "plain { text } here");
        assert_eq!(resolve_tokens("", &v), "");
    }

    #[test]
    fn resolved_values_are_not_rescanned() {
        let v = values(&[("A", "{{B}}"), ("B", "nope")]);
        let once = resolve_tokens("{{A}}", &v);
        assert_eq!(once, "{{B}}");
        let plain = resolve_tokens("Total: 2", &v);
        assert_eq!(resolve_tokens(&plain, &v), plain);
    }

    #[test]
    fn draft_contains_placeholders_not_values() {
        let draft = generate_draft(&Kpi::default(), "Monthly Program Summary");
        assert!(draft.starts_with("# Monthly Program Summary\n"));
        assert!(draft.contains("Total Variance: {{TotalVarianceINR}} ({{VariancePct}})"));
        assert!(!draft.contains("variance against plan"));
        assert!(!draft.contains("slippage"));
    }

    #[test]
    fn favorable_variance_and_slippage_sentences() {
        let kpi = Kpi {
            variance_pct: -8.33,
            at_risk_projects: 1,
            ..Kpi::default()
        };
        let draft = generate_draft(&kpi, ReportTemplate::MonthlyProgramSummary.label());
        assert!(draft.contains("Favorable variance against plan"));
        assert!(draft.contains(
            "1 project(s) show persistent schedule slippage and require focused expediting."
        ));
    }

    #[test]
    fn adverse_variance_only_above_threshold() {
        let adverse = Kpi { variance_pct: 5.1, ..Kpi::default() };
        assert!(generate_draft(&adverse, "t").contains("Significant adverse financial variance"));
        let edge = Kpi { variance_pct: 5.0, ..Kpi::default() };
        let draft = generate_draft(&edge, "t");
        assert!(!draft.contains("adverse"));
        assert!(!draft.contains("Favorable"));
    }

    #[test]
    fn token_values_format_kpis() {
        let kpi = Kpi {
            total_projects: 2,
            weighted_physical_progress_pct: 34.25,
            financial_progress_pct: 100.0 * 165.0 / 180.0,
            total_variance_inr: -15.0,
            variance_pct: 100.0 * -15.0 / 180.0,
            at_risk_projects: 1,
        };
        let v = token_values(&kpi, ReportTemplate::QuarterlyFinancialReview);
        assert_eq!(v.len(), REPORT_TOKENS.len());
        assert!(REPORT_TOKENS.iter().all(|t| v.contains_key(*t)));
        assert_eq!(v["ReportPeriod"], "Quarterly Financial Review");
        assert_eq!(v["FinancialProgressPct"], "91.7%");
        assert_eq!(v["TotalVarianceINR"], "-₹15");
        assert_eq!(v["VariancePct"], "-8.3%");
        assert_eq!(v["ProjectsAtRisk"], "1");
    }
}
