// Entry point and high-level CLI flow.
//
// - Option [1] activates the built-in sample portfolio.
// - Option [2] parses, validates and normalizes the two uploaded feeds.
// - Option [3] toggles between sample and uploaded data.
// - Option [4] writes the dashboard tables, KPI JSON and executive summary.
// `--batch` runs load + generate once without the menu.
use clap::{Parser, ValueEnum};
use progress_report::config::PipelineConfig;
use progress_report::error::PipelineError;
use progress_report::loader;
use progress_report::mapping::{
    find_preset, upsert_preset, FeedSchema, FieldMapping, JsonFilePresetStore, MappingPreset,
    PresetStore,
};
use progress_report::normalize::{enrich_projects, normalize, MappedFeed};
use progress_report::output::{self, DocumentRenderer, MarkdownFileRenderer};
use progress_report::reports;
use progress_report::store::{DataContext, DataSource};
use progress_report::summary::{generate_draft, resolve_tokens, token_values, ReportTemplate};
use progress_report::types::ParsedTable;
use progress_report::util;
use progress_report::validate::{validate_feeds, FeedInput};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TemplateArg {
    /// Monthly Program Summary
    Monthly,
    /// Quarterly Financial Review
    Quarterly,
    /// Delivery Risk Snapshot
    Risk,
}

impl From<TemplateArg> for ReportTemplate {
    fn from(t: TemplateArg) -> Self {
        match t {
            TemplateArg::Monthly => ReportTemplate::MonthlyProgramSummary,
            TemplateArg::Quarterly => ReportTemplate::QuarterlyFinancialReview,
            TemplateArg::Risk => ReportTemplate::DeliveryRiskSnapshot,
        }
    }
}

/// Reconcile physical and financial progress feeds into portfolio KPIs.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Physical progress CSV
    #[arg(long)]
    physical: Option<PathBuf>,
    /// Financial progress CSV
    #[arg(long)]
    financial: Option<PathBuf>,
    /// Mapping preset to start from
    #[arg(long, default_value = progress_report::mapping::DEFAULT_PRESET_NAME)]
    preset: String,
    /// JSON file holding mapping presets
    #[arg(long, default_value = "mapping_presets.json")]
    presets_file: PathBuf,
    /// Physical mapping override, FIELD=HEADER (repeatable)
    #[arg(long = "map-physical", value_name = "FIELD=HEADER")]
    map_physical: Vec<String>,
    /// Financial mapping override, FIELD=HEADER (repeatable)
    #[arg(long = "map-financial", value_name = "FIELD=HEADER")]
    map_financial: Vec<String>,
    /// Save the effective mappings as a preset under this name
    #[arg(long)]
    save_preset: Option<String>,
    /// Summary template
    #[arg(long, value_enum, default_value_t = TemplateArg::Monthly)]
    template: TemplateArg,
    /// Output directory for tables and the summary document
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Rows checked by the row validator
    #[arg(long, default_value_t = progress_report::config::DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,
    /// Fill project metadata (name, state, length...) from the physical feed
    #[arg(long)]
    enrich_projects: bool,
    /// Load and generate once, without the interactive menu
    #[arg(long)]
    batch: bool,
    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            preview_rows: self.preview_rows,
            presets_path: self.presets_file.clone(),
            output_dir: self.out_dir.clone(),
            template: self.template.into(),
            enrich_projects: self.enrich_projects,
            ..PipelineConfig::default()
        }
    }
}

/// Everything the menu actions share. Replaces a process-wide global.
struct App {
    config: PipelineConfig,
    ctx: DataContext,
    physical_mapping: FieldMapping,
    financial_mapping: FieldMapping,
    physical_path: Option<PathBuf>,
    financial_path: Option<PathBuf>,
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Read a single trimmed line after printing `prompt`. `None` once the input
/// is closed or unreadable.
fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the main menu after generating reports.
/// Closed input counts as "N".
fn prompt_back_to_menu<R: BufRead>(input: &mut R) -> bool {
    loop {
        let Some(answer) = read_line(input, "Back to Menu (Y/N): ") else {
            println!();
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Resolve the starting mappings from the preset store and CLI overrides,
/// persisting them as a new preset when asked.
fn resolve_mappings(args: &Args, store: &dyn PresetStore) -> Result<(FieldMapping, FieldMapping), PipelineError> {
    let mut presets = store.load()?;
    let preset = find_preset(&presets, &args.preset)
        .cloned()
        .ok_or_else(|| PipelineError::UnknownPreset(args.preset.clone()))?;
    let mut physical = preset.physical_mapping;
    let mut financial = preset.financial_mapping;
    for o in &args.map_physical {
        physical.apply_override(o)?;
    }
    for o in &args.map_financial {
        financial.apply_override(o)?;
    }
    if let Some(name) = &args.save_preset {
        upsert_preset(
            &mut presets,
            MappingPreset {
                name: name.clone(),
                physical_mapping: physical.clone(),
                financial_mapping: financial.clone(),
            },
        );
        store.save(&presets)?;
        info!(preset = %name, "saved mapping preset");
    }
    Ok((physical, financial))
}

fn report_parse_issues(label: &str, table: &ParsedTable) {
    if table.errors.is_empty() {
        return;
    }
    println!(
        "Note: {} parse issue(s) in the {} feed.",
        util::format_int(table.errors.len()),
        label
    );
    for issue in table.errors.iter().take(5) {
        match issue.row {
            Some(r) => println!("  row {}: {}", r + 1, issue.message),
            None => println!("  {}", issue.message),
        }
    }
}

/// Handle option [1]: switch to the sample portfolio.
fn handle_load_sample(app: &App) {
    let snap = app.ctx.switch_to_sample();
    println!(
        "Sample data active ({} projects, {} points).\n",
        util::format_int(snap.data.projects.len()),
        util::format_int(snap.data.points.len())
    );
}

/// Handle option [2]: parse, validate and normalize both feeds. Nothing is
/// applied to the data context unless validation comes back clean.
fn handle_load_feeds(app: &mut App) -> Result<bool, PipelineError> {
    let (Some(phys_path), Some(fin_path)) = (app.physical_path.clone(), app.financial_path.clone())
    else {
        println!("Error: both --physical and --financial feeds are required.\n");
        return Ok(false);
    };

    let phys_table = loader::parse_path(&phys_path, app.config.max_csv_size_mb)?;
    let fin_table = loader::parse_path(&fin_path, app.config.max_csv_size_mb)?;
    println!(
        "Processing feeds... ({} physical rows, {} financial rows)",
        util::format_int(phys_table.rows.len()),
        util::format_int(fin_table.rows.len())
    );
    report_parse_issues("physical", &phys_table);
    report_parse_issues("financial", &fin_table);

    let phys_schema = FeedSchema::physical();
    let fin_schema = FeedSchema::financial();
    let issues = validate_feeds(
        &[
            FeedInput {
                schema: &phys_schema,
                mapping: &app.physical_mapping,
                rows: &phys_table.rows,
            },
            FeedInput {
                schema: &fin_schema,
                mapping: &app.financial_mapping,
                rows: &fin_table.rows,
            },
        ],
        app.config.preview_rows,
    );
    if phys_table.rows.is_empty() || fin_table.rows.is_empty() {
        println!("Cannot proceed: both feeds need at least one data row.\n");
        return Ok(false);
    }
    if !issues.is_empty() {
        println!("Cannot proceed: {} validation issue(s).", issues.len());
        for issue in &issues {
            println!("  - {}", issue);
        }
        println!();
        warn!(issues = issues.len(), "feeds failed validation");
        return Ok(false);
    }

    let phys_feed = MappedFeed {
        schema: &phys_schema,
        mapping: &app.physical_mapping,
        rows: &phys_table.rows,
    };
    let fin_feed = MappedFeed {
        schema: &fin_schema,
        mapping: &app.financial_mapping,
        rows: &fin_table.rows,
    };
    let mut normalized = normalize(phys_feed, fin_feed);
    if app.config.enrich_projects {
        let filled = enrich_projects(&mut normalized.projects, phys_feed);
        info!(filled, "enriched project metadata");
    }
    let report = &normalized.report;
    if report.dropped_blank_ids > 0 {
        println!(
            "Note: {} rows skipped due to blank project IDs.",
            util::format_int(report.dropped_blank_ids)
        );
    }
    if report.unsortable_dates > 0 {
        println!(
            "Warning: {} points have dates that are not YYYY-MM-DD; latest-point selection may be off.",
            util::format_int(report.unsortable_dates)
        );
    }
    let snap = app.ctx.set_uploaded(normalized.projects, normalized.points);
    println!(
        "Uploaded data active ({} projects, {} points).\n",
        util::format_int(snap.data.projects.len()),
        util::format_int(snap.data.points.len())
    );
    Ok(true)
}

/// Handle option [3]: toggle between sample and uploaded data.
fn handle_switch_source(app: &App) {
    match app.ctx.snapshot().source {
        DataSource::Uploaded => handle_load_sample(app),
        DataSource::Sample => match app.ctx.switch_to_uploaded() {
            Ok(snap) => println!(
                "Uploaded data active ({} projects).\n",
                util::format_int(snap.data.projects.len())
            ),
            Err(e) => println!("Error: {} (load feeds with option 2 first).\n", e),
        },
    }
}

/// Handle option [4]: write tables, KPI JSON and the executive summary, and
/// print previews to the console.
fn handle_generate_reports(app: &App) -> Result<(), PipelineError> {
    let snap = app.ctx.snapshot();
    let out = &app.config.output_dir;
    std::fs::create_dir_all(out)?;
    println!("Generating reports from {} data...", snap.source);
    println!("Outputs saved to individual files...\n");

    let status = reports::render_project_status(&reports::project_status(
        &snap.data.projects,
        &snap.data.points,
    ));
    let file1 = out.join("project_status.csv");
    output::write_csv(&file1, &status)?;
    println!("Report 1: Latest Project Status\n");
    output::preview_table_rows(&status, 5);
    println!("(Full table exported to {})\n", file1.display());

    let fin = reports::render_financial_series(&reports::financial_series(&snap.data.points));
    let file2 = out.join("financial_series.csv");
    output::write_csv(&file2, &fin)?;
    println!("Report 2: Cumulative Financial Progress by Date\n");
    output::preview_table_rows(&fin, 5);
    println!("(Full table exported to {})\n", file2.display());

    let phys = reports::render_physical_series(&reports::physical_series(&snap.data.points));
    let file3 = out.join("physical_series.csv");
    output::write_csv(&file3, &phys)?;
    println!("Report 3: Average Physical Progress by Date\n");
    output::preview_table_rows(&phys, 5);
    println!("(Full table exported to {})\n", file3.display());

    output::write_json(&out.join("kpi.json"), &snap.kpi)?;
    let template = app.config.template;
    let draft = generate_draft(&snap.kpi, template.label());
    let resolved = resolve_tokens(&draft, &token_values(&snap.kpi, template));
    let renderer = MarkdownFileRenderer::new(out.join("executive_summary.md"));
    let doc = renderer.render("Executive Summary", &resolved)?;
    println!("Executive Summary ({}):\n", doc.display());
    println!("{}\n", resolved);
    Ok(())
}

fn run_batch(app: &mut App) -> Result<(), PipelineError> {
    if app.physical_path.is_some() || app.financial_path.is_some() {
        if !handle_load_feeds(app)? {
            return Ok(());
        }
    } else {
        handle_load_sample(app);
    }
    handle_generate_reports(app)
}

fn main() -> Result<(), PipelineError> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.config();
    let store = JsonFilePresetStore::new(&config.presets_path);
    let (physical_mapping, financial_mapping) = resolve_mappings(&args, &store)?;
    let mut app = App {
        config,
        ctx: DataContext::new(),
        physical_mapping,
        financial_mapping,
        physical_path: args.physical.clone(),
        financial_path: args.financial.clone(),
    };

    if args.batch {
        return run_batch(&mut app);
    }
    run_menu(&mut app, &mut io::stdin().lock());
    Ok(())
}

/// The interactive menu. Returns when the user declines to go back to the
/// menu or the input is closed.
fn run_menu<R: BufRead>(app: &mut App, input: &mut R) {
    loop {
        println!("Select Action:");
        println!("[1] Load sample data");
        println!("[2] Load uploaded feeds");
        println!("[3] Switch data source");
        println!("[4] Generate Reports\n");
        let Some(choice) = read_line(input, "Enter choice: ") else {
            println!("\nExiting the program.");
            return;
        };
        match choice.as_str() {
            "1" => handle_load_sample(app),
            "2" => {
                if app.physical_path.is_none() {
                    let Some(p) = read_line(input, "Physical feed path: ") else {
                        return;
                    };
                    app.physical_path = Some(PathBuf::from(p));
                }
                if app.financial_path.is_none() {
                    let Some(p) = read_line(input, "Financial feed path: ") else {
                        return;
                    };
                    app.financial_path = Some(PathBuf::from(p));
                }
                if let Err(e) = handle_load_feeds(app) {
                    error!(error = %e, "failed to load feeds");
                    eprintln!("Failed to load feeds: {}\n", e);
                    app.physical_path = None;
                    app.financial_path = None;
                }
            }
            "3" => handle_switch_source(app),
            "4" => {
                println!();
                if let Err(e) = handle_generate_reports(app) {
                    eprintln!("Write error: {}", e);
                }
                if !prompt_back_to_menu(input) {
                    println!("Exiting the program.");
                    return;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}
