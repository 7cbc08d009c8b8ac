use crate::error::PipelineError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Markdown table of the first `max_rows` rows, or `(no rows)`.
pub fn table_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", table_preview(rows, max_rows));
}

/// Turns a title and a resolved body into a downloadable artifact.
pub trait DocumentRenderer {
    fn render(&self, title: &str, body: &str) -> Result<PathBuf, PipelineError>;
}

/// Writes the document as a Markdown file: a `# title` heading, then the body.
#[derive(Debug, Clone)]
pub struct MarkdownFileRenderer {
    path: PathBuf,
}

impl MarkdownFileRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentRenderer for MarkdownFileRenderer {
    fn render(&self, title: &str, body: &str) -> Result<PathBuf, PipelineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut doc = format!("# {}\n\n", title);
        doc.push_str(body);
        if !doc.ends_with('\n') {
            doc.push('\n');
        }
        std::fs::write(&self.path, doc)?;
        Ok(self.path.clone())
    }
}
