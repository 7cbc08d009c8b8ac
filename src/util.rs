// Numeric coercion and display helpers.
//
// Every stage downstream of the parser goes through `coerce_number` so that
// "absent" means the same thing everywhere: blank, unparseable or non-finite.
use crate::types::Cell;
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Placeholder rendered for values that are missing.
pub const MISSING: &str = "—";

/// Coerce raw text into a finite `f64`.
///
/// - Trims surrounding whitespace; blank input is absent.
/// - Strips thousands separators (`,`) and any inner whitespace.
/// - Returns `None` for anything unparseable or non-finite (`inf`, `NaN`).
pub fn coerce_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Same policy as `coerce_number`, applied to an optional cell. Native numbers
/// pass through unchanged when finite.
pub fn coerce_cell(cell: Option<&Cell>) -> Option<f64> {
    match cell? {
        Cell::Number(n) => Some(*n).filter(|n| n.is_finite()),
        Cell::Text(s) => coerce_number(s),
    }
}

/// Division where a zero denominator yields 0 instead of NaN/inf.
pub fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// True when the date string is a plain ISO-8601 calendar date, the only form
/// for which string ordering matches chronological ordering.
pub fn is_sortable_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok()
}

/// `91.666` -> `"91.7%"` with `digits = 1`; missing or NaN renders as `—`.
pub fn format_percent(n: Option<f64>, digits: usize) -> String {
    match n {
        Some(v) if !v.is_nan() => format!("{:.*}%", digits, v),
        _ => MISSING.to_string(),
    }
}

/// Rupee amount with Indian digit grouping and no fraction digits,
/// e.g. `1234567.0` -> `"₹12,34,567"`, `-15.0` -> `"-₹15"`.
pub fn format_inr(n: Option<f64>) -> String {
    let v = match n {
        Some(v) if v.is_finite() => v,
        _ => return MISSING.to_string(),
    };
    // `round` goes half away from zero and keeps the sign, so -0.4 renders
    // as "-₹0". Magnitudes past i64::MAX saturate.
    let rounded = v.round();
    let whole = rounded.abs() as i64;
    let digits = whole.to_formatted_string(&Locale::en_IN);
    if rounded.is_sign_negative() {
        format!("-₹{}", digits)
    } else {
        format!("₹{}", digits)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g. `9,855 rows`).
    n.to_formatted_string(&Locale::en)
}
