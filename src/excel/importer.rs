//! Excel importer implementation - Excel (.xlsx) → Table

use crate::error::{SalesPgmError, SalesPgmResult};
use crate::types::{CellValue, Record, Table};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

/// Reads the first worksheet of a workbook as a header row plus records
pub struct ExcelImporter {
    path: std::path::PathBuf,
}

impl ExcelImporter {
    /// Create a new Excel importer
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Import the first worksheet
    pub fn import(&self) -> SalesPgmResult<Table> {
        if !self.path.exists() {
            return Err(SalesPgmError::Import(format!(
                "Input file not found: {}",
                self.path.display()
            )));
        }

        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| SalesPgmError::Import(format!("Failed to open Excel file: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SalesPgmError::Import("Workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| SalesPgmError::Import(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

        let table = Self::range_to_table(&range)?;
        debug!(
            sheet = %sheet_name,
            columns = table.headers.len(),
            rows = table.row_count(),
            "worksheet imported"
        );
        Ok(table)
    }

    /// Convert a cell range (header row first) to a table
    fn range_to_table(range: &Range<Data>) -> SalesPgmResult<Table> {
        let (height, width) = range.get_size();
        if height == 0 {
            return Err(SalesPgmError::Import(
                "Worksheet is empty (no header row)".to_string(),
            ));
        }

        // Read header row (row 0)
        let mut headers: Vec<String> = Vec::with_capacity(width);
        for col in 0..width {
            let name = match range.get((0, col)) {
                Some(Data::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                Some(Data::Int(i)) => i.to_string(),
                Some(Data::Float(f)) => f.to_string(),
                _ => format!("col_{}", col),
            };
            headers.push(name);
        }

        let mut table = Table::new(headers);
        for row in 1..height {
            let cells: Vec<CellValue> = (0..width)
                .map(|col| range.get((row, col)).map_or(CellValue::Empty, Self::convert_cell))
                .collect();
            // Skip completely blank rows
            if cells.iter().all(CellValue::is_empty) {
                continue;
            }
            table.push_row(Record::new(cells));
        }

        Ok(table)
    }

    /// Convert one calamine cell
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Integer(*i),
            Data::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    CellValue::Integer(*f as i64)
                } else {
                    CellValue::Number(*f)
                }
            }
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(|d| CellValue::Date(d.date()))
                .unwrap_or(CellValue::Empty),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) => CellValue::Empty,
        }
    }
}
