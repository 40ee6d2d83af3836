// src/normalize.rs
//! Cell-level coercion for spreadsheet values.
//!
//! Spreadsheet cells arrive as formatted strings: thousands separators,
//! percent signs, formula errors, blanks. These helpers turn them into
//! numbers. Known sentinels become 0 silently; anything else that still fails
//! to parse returns `None` so the caller can record a data-quality defect and
//! fall back to 0.

use crate::error::DataQualityDefect;

/// Typed rows from one sheet plus the cells that had to be coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub defects: Vec<DataQualityDefect>,
}

/// Formula errors and placeholders that mean "no value yet".
pub const ERROR_SENTINELS: [&str; 8] = [
    "#DIV/0!", "#N/A", "#NAME?", "#REF!", "#VALUE!", "#ERROR!", "", "-",
];

pub fn is_sentinel(cell: &str) -> bool {
    ERROR_SENTINELS.contains(&cell)
}

/// Trim and drop thousands separators.
fn clean(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ',').collect()
}

fn parse_non_negative(cleaned: &str) -> Option<f64> {
    if is_sentinel(cleaned) {
        return Some(0.0);
    }
    let v = cleaned.parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

/// Integer count cell ("1,234" → 1234, "#DIV/0!" → 0, "12.9" → 12).
pub fn coerce_count(raw: &str) -> Option<u64> {
    parse_non_negative(&clean(raw)).map(|v| v.trunc() as u64)
}

/// Percentage cell as a fraction ("87.6%" → 0.876, "" → 0.0). May exceed 1.0.
pub fn coerce_rate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let without_pct = trimmed.strip_suffix('%').unwrap_or(trimmed);
    parse_non_negative(&clean(without_pct)).map(|v| v / 100.0)
}

/// Round to 3 decimals so 0.9996 compares equal to 1.0.
/// Ties round half away from zero (`f64::round`), not half to even.
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
