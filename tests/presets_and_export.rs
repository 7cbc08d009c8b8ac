use progress_report::error::PipelineError;
use progress_report::mapping::{
    upsert_preset, CanonicalField, JsonFilePresetStore, MappingPreset, PresetStore,
    DEFAULT_PRESET_NAME,
};
use progress_report::loader::parse_path;
use progress_report::output::{write_csv, DocumentRenderer, MarkdownFileRenderer};
use progress_report::reports::{project_status, render_project_status};
use progress_report::store::sample_dataset;
use tempfile::tempdir;

#[test]
fn missing_preset_file_yields_default_preset() {
    let dir = tempdir().expect("tmp");
    let store = JsonFilePresetStore::new(dir.path().join("presets.json"));
    let presets = store.load().expect("load");
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, DEFAULT_PRESET_NAME);
    assert_eq!(
        presets[0].financial_mapping.mapped(CanonicalField::ActualAmount),
        Some("ActualAmount")
    );
}

#[test]
fn saved_presets_reload_in_order() {
    let dir = tempdir().expect("tmp");
    let store = JsonFilePresetStore::new(dir.path().join("nested").join("presets.json"));
    let mut presets = store.load().expect("load");
    let mut vendor = MappingPreset::identity("Vendor A");
    vendor.physical_mapping.set(CanonicalField::ProjectId, "Project Code");
    upsert_preset(&mut presets, vendor.clone());
    store.save(&presets).expect("save");

    let reloaded = store.load().expect("reload");
    assert_eq!(reloaded, presets);
    assert_eq!(reloaded[1], vendor);
}

#[test]
fn corrupt_preset_file_falls_back_to_defaults() {
    let dir = tempdir().expect("tmp");
    let path = dir.path().join("presets.json");
    std::fs::write(&path, "{ not json").expect("write");
    let presets = JsonFilePresetStore::new(&path).load().expect("load");
    assert_eq!(presets[0].name, DEFAULT_PRESET_NAME);
}

#[test]
fn non_utf8_preset_file_falls_back_to_defaults() {
    let dir = tempdir().expect("tmp");
    let path = dir.path().join("presets.json");
    std::fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).expect("write");
    let presets = JsonFilePresetStore::new(&path).load().expect("load");
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, DEFAULT_PRESET_NAME);
}

#[test]
fn stored_list_without_default_gets_it_back() {
    let dir = tempdir().expect("tmp");
    let path = dir.path().join("presets.json");
    std::fs::write(&path, "[]").expect("write");
    let store = JsonFilePresetStore::new(&path);
    let presets = store.load().expect("load");
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, DEFAULT_PRESET_NAME);

    store.save(&[MappingPreset::identity("Vendor A")]).expect("save");
    let names: Vec<_> = store
        .load()
        .expect("reload")
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec![DEFAULT_PRESET_NAME.to_string(), "Vendor A".to_string()]);
}

#[test]
fn oversized_feed_is_rejected_before_parsing() {
    let dir = tempdir().expect("tmp");
    let path = dir.path().join("big.csv");
    let mut body = String::from("ProjectID,Date,ActualAmount\n");
    while body.len() <= 1024 * 1024 {
        body.push_str("P1,2025-07-01,1000\n");
    }
    std::fs::write(&path, &body).expect("write");
    assert!(matches!(
        parse_path(&path, 1),
        Err(PipelineError::FileTooLarge { limit_mb: 1, .. })
    ));
    let table = parse_path(&path, 25).expect("parse");
    assert!(table.errors.is_empty());
    assert!(table.rows.len() > 1000);
}

#[test]
fn renderer_writes_title_and_body() {
    let dir = tempdir().expect("tmp");
    let renderer = MarkdownFileRenderer::new(dir.path().join("out").join("summary.md"));
    let path = renderer
        .render("Executive Summary", "Total Projects: 2")
        .expect("render");
    let text = std::fs::read_to_string(path).expect("read");
    assert_eq!(text, "# Executive Summary\n\nTotal Projects: 2\n");
}

#[test]
fn project_status_exports_as_csv() {
    let dir = tempdir().expect("tmp");
    let data = sample_dataset();
    let rows = render_project_status(&project_status(&data.projects, &data.points));
    let path = dir.path().join("status.csv");
    write_csv(&path, &rows).expect("csv");
    let text = std::fs::read_to_string(path).expect("read");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("ProjectID,LastUpdate,Physical,CumActual,CumPlanned,Variance,Status")
    );
    assert_eq!(lines.next(), Some("P1,2025-07-01,38.0%,₹95,₹100,-₹5,On Track"));
    assert_eq!(lines.next(), Some("P2,2025-07-01,28.0%,₹70,₹80,-₹10,At Risk"));
}
