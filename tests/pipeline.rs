use progress_report::kpi::compute_kpis;
use progress_report::loader::parse_str;
use progress_report::mapping::{CanonicalField, FeedSchema};
use progress_report::normalize::{normalize, MappedFeed};
use progress_report::summary::{generate_draft, resolve_tokens, token_values, ReportTemplate};
use progress_report::validate::{validate_feeds, FeedInput};

const PHYSICAL: &str = "\
ProjectID,ProjectName,LengthKm,Date,PlannedPhysicalPct,ActualPhysicalPct
P1,Ring Road,50,2025-07-01,40,38

P2,Coastal Link,30,2025-07-01,35,28
";

const FINANCIAL: &str = "\
ProjectID,Date,PlannedAmount,ActualAmount,CumulativePlanned,CumulativeActual,FundingSource
P1,2025-07-01,10,9,100,95,NHAI
P2,2025-07-01,8,7,80,70,State
";

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn csv_feeds_to_resolved_summary() {
    let phys = parse_str(PHYSICAL);
    let fin = parse_str(FINANCIAL);
    assert!(phys.errors.is_empty() && fin.errors.is_empty());

    let phys_schema = FeedSchema::physical();
    let fin_schema = FeedSchema::financial();
    let phys_map = phys_schema.identity_mapping();
    let fin_map = fin_schema.identity_mapping();
    let issues = validate_feeds(
        &[
            FeedInput { schema: &phys_schema, mapping: &phys_map, rows: &phys.rows },
            FeedInput { schema: &fin_schema, mapping: &fin_map, rows: &fin.rows },
        ],
        50,
    );
    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);

    let out = normalize(
        MappedFeed { schema: &phys_schema, mapping: &phys_map, rows: &phys.rows },
        MappedFeed { schema: &fin_schema, mapping: &fin_map, rows: &fin.rows },
    );
    assert_eq!(out.projects.len(), 2);
    assert_eq!(out.points.len(), 4);

    // Same figures as the two-project sample portfolio, but fed through both CSV
    // feeds the totals differ from the in-memory fixture (34.25%, 1 at risk):
    // the core normalizer does not carry LengthKm onto projects, so weights fall
    // back to 1.
    let kpi = compute_kpis(&out.projects, &out.points);
    assert!(close(kpi.weighted_physical_progress_pct, (38.0 + 28.0) / 2.0));
    assert!(close(kpi.financial_progress_pct, 100.0 * 165.0 / 180.0));
    assert!(close(kpi.total_variance_inr, -15.0));
    // A physical and a financial row share each date. The financial row comes
    // later, so it is the latest point, and it carries no physical percentages
    // for the at-risk test.
    assert_eq!(kpi.at_risk_projects, 0);

    let template = ReportTemplate::MonthlyProgramSummary;
    let draft = generate_draft(&kpi, template.label());
    assert!(draft.contains("Favorable variance against plan"));
    let resolved = resolve_tokens(&draft, &token_values(&kpi, template));
    assert!(resolved.contains("Total Projects: 2"));
    assert!(resolved.contains("Total Variance: -₹15 (-8.3%)"));
    assert!(!resolved.contains("{{"));
}

#[test]
fn enrichment_restores_length_weighting() {
    let phys = parse_str(PHYSICAL);
    let fin = parse_str(FINANCIAL);
    let phys_schema = FeedSchema::physical();
    let fin_schema = FeedSchema::financial();
    let phys_map = phys_schema.identity_mapping();
    let fin_map = fin_schema.identity_mapping();
    let phys_feed = MappedFeed { schema: &phys_schema, mapping: &phys_map, rows: &phys.rows };
    let mut out = normalize(
        phys_feed,
        MappedFeed { schema: &fin_schema, mapping: &fin_map, rows: &fin.rows },
    );
    progress_report::normalize::enrich_projects(&mut out.projects, phys_feed);
    let kpi = compute_kpis(&out.projects, &out.points);
    assert!(close(kpi.weighted_physical_progress_pct, 34.25));
    assert_eq!(out.projects[0].name.as_deref(), Some("Ring Road"));
}

#[test]
fn custom_headers_need_mapping_before_proceeding() {
    let phys = parse_str("Code,When,Done\nP1,2025-07-01,12\n");
    let schema = FeedSchema::physical();
    let mut mapping = schema.identity_mapping();
    let before = validate_feeds(&[FeedInput { schema: &schema, mapping: &mapping, rows: &phys.rows }], 50);
    assert_eq!(
        before.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
        vec![
            "Physical row 1: ProjectID blank",
            "Physical row 1: Date blank",
            "Physical row 1: ActualPhysicalPct invalid",
        ]
    );

    mapping.set(CanonicalField::ProjectId, "Code");
    mapping.set(CanonicalField::Date, "When");
    mapping.set(CanonicalField::ActualPhysicalPct, "Done");
    let after = validate_feeds(&[FeedInput { schema: &schema, mapping: &mapping, rows: &phys.rows }], 50);
    assert!(after.is_empty());
}

#[test]
fn later_dates_win_for_financials() {
    let fin = parse_str(
        "ProjectID,Date,ActualAmount,CumulativePlanned,CumulativeActual\n\
         P1,2025-07-15,5,120,130\n\
         P1,2025-07-01,5,100,90\n",
    );
    let phys_schema = FeedSchema::physical();
    let fin_schema = FeedSchema::financial();
    let phys_map = phys_schema.identity_mapping();
    let fin_map = fin_schema.identity_mapping();
    let out = normalize(
        MappedFeed { schema: &phys_schema, mapping: &phys_map, rows: &[] },
        MappedFeed { schema: &fin_schema, mapping: &fin_map, rows: &fin.rows },
    );
    let kpi = compute_kpis(&out.projects, &out.points);
    assert!(close(kpi.total_variance_inr, 10.0));
    assert!(close(kpi.variance_pct, 100.0 * 10.0 / 120.0));
    let draft = generate_draft(&kpi, "Quarterly Financial Review");
    assert!(draft.contains("Significant adverse financial variance observed"));
}
