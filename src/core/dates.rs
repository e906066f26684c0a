//! YYYYMMDD date handling
//!
//! Apply dates arrive as `20240131` integers, `"20240131"` text or native
//! spreadsheet dates. Anything else is an unknown date, never an error.

use crate::types::CellValue;
use chrono::NaiveDate;

/// Parse a cell as a YYYYMMDD date. `None` is the "unknown" marker.
pub fn parse_cell(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Integer(i) => parse_compact(&i.to_string()),
        CellValue::Number(f) if f.is_finite() && f.fract() == 0.0 => {
            parse_compact(&(*f as i64).to_string())
        }
        CellValue::Text(s) => parse_compact(s.trim()),
        _ => None,
    }
}

/// Strict `%Y%m%d` parse
pub fn parse_compact(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y%m%d").ok()
}

pub fn format_compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn format_month(date: NaiveDate) -> String {
    date.format("%Y%m").to_string()
}

/// Normalized output cell: YYYYMMDD text, or empty for an unknown date
pub fn normalized_cell(cell: &CellValue) -> CellValue {
    match parse_cell(cell) {
        Some(date) => CellValue::Text(format_compact(date)),
        None => CellValue::Empty,
    }
}
