// Tabular parser for the progress feeds.
//
// Parsing never stops at the first bad row: every problem becomes a
// `ParseIssue` and the reader moves on. Cells stay text; numeric
// interpretation happens later through `util::coerce_number`.
use crate::error::PipelineError;
use crate::types::{Cell, ParseIssue, ParsedTable, Row};
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub fn parse_str(text: &str) -> ParsedTable {
    parse_reader(text.as_bytes())
}

/// Parse any byte source with a mandatory header row.
pub fn parse_reader<R: Read>(reader: R) -> ParsedTable {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);
    let mut table = ParsedTable::default();

    match rdr.byte_headers() {
        Ok(h) => table.headers = decode_record(h).0,
        Err(e) => {
            table.errors.push(ParseIssue {
                row: None,
                code: Some("HeaderUnreadable".to_string()),
                message: e.to_string(),
            });
            return table;
        }
    }
    if table.headers.is_empty() {
        table.errors.push(ParseIssue {
            row: None,
            code: Some("MissingHeader".to_string()),
            message: "Header row is missing".to_string(),
        });
        return table;
    }

    let expected = table.headers.len();
    let mut record = ByteRecord::new();
    loop {
        let row_idx = table.rows.len();
        match rdr.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(e) => {
                let fatal = e.is_io_error();
                table.errors.push(ParseIssue {
                    row: Some(row_idx),
                    code: Some("ReadError".to_string()),
                    message: e.to_string(),
                });
                if fatal {
                    break;
                }
                continue;
            }
        }
        if record.len() == 1 && record.get(0).map_or(true, |f| f.is_empty()) {
            continue;
        }

        let (fields, lossy) = decode_record(&record);
        if lossy {
            table.errors.push(ParseIssue {
                row: Some(row_idx),
                code: Some("InvalidUtf8".to_string()),
                message: "Row contains invalid UTF-8; replaced undecodable bytes".to_string(),
            });
        }
        if fields.len() < expected {
            table.errors.push(ParseIssue {
                row: Some(row_idx),
                code: Some("TooFewFields".to_string()),
                message: format!(
                    "Too few fields: expected {} fields but parsed {}",
                    expected,
                    fields.len()
                ),
            });
        } else if fields.len() > expected {
            table.errors.push(ParseIssue {
                row: Some(row_idx),
                code: Some("TooManyFields".to_string()),
                message: format!(
                    "Too many fields: expected {} fields but parsed {}",
                    expected,
                    fields.len()
                ),
            });
        }

        // Best effort: short rows keep what they have, extra fields are dropped.
        let row: Row = table
            .headers
            .iter()
            .cloned()
            .zip(fields.into_iter().map(Cell::Text))
            .collect();
        table.rows.push(row);
    }

    debug!(
        rows = table.rows.len(),
        issues = table.errors.len(),
        "parsed feed"
    );
    table
}

/// Parse a feed file, refusing files above `max_size_mb`.
pub fn parse_path(path: &Path, max_size_mb: u64) -> Result<ParsedTable, PipelineError> {
    let size = std::fs::metadata(path)?.len();
    let size_mb = size as f64 / (1024.0 * 1024.0);
    if size > max_size_mb * 1024 * 1024 {
        return Err(PipelineError::FileTooLarge {
            path: path.to_path_buf(),
            size_mb,
            limit_mb: max_size_mb,
        });
    }
    let table = parse_reader(File::open(path)?);
    info!(
        path = %path.display(),
        rows = table.rows.len(),
        issues = table.errors.len(),
        "loaded feed"
    );
    Ok(table)
}

fn decode_record(record: &ByteRecord) -> (Vec<String>, bool) {
    let mut lossy = false;
    let fields = record
        .iter()
        .map(|raw| match std::str::from_utf8(raw) {
            Ok(s) => s.to_string(),
            Err(_) => {
                lossy = true;
                String::from_utf8_lossy(raw).into_owned()
            }
        })
        .collect();
    (fields, lossy)
}
