//! Excel exporter implementation

use crate::error::{SalesPgmError, SalesPgmResult};
use crate::types::{CellValue, Table};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;

/// Name of the single worksheet in every output workbook
pub const SHEET_NAME: &str = "Sheet1";

/// Writes a table to a single-sheet .xlsx workbook
pub struct ExcelExporter<'a> {
    table: &'a Table,
}

impl<'a> ExcelExporter<'a> {
    /// Create a new Excel exporter
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    /// Export the table to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> SalesPgmResult<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(SHEET_NAME)
            .map_err(|e| SalesPgmError::Export(format!("Failed to set worksheet name: {}", e)))?;

        // Header row (row 0)
        for (col_idx, name) in self.table.headers.iter().enumerate() {
            worksheet
                .write_string(0, col_idx as u16, name)
                .map_err(|e| SalesPgmError::Export(format!("Failed to write header: {}", e)))?;
        }

        // Data rows (starting at row 1)
        for (row_idx, record) in self.table.rows.iter().enumerate() {
            let excel_row = (row_idx + 1) as u32;
            for col_idx in 0..self.table.headers.len() {
                Self::write_cell_value(worksheet, excel_row, col_idx as u16, record.get(col_idx))?;
            }
        }

        workbook
            .save(output_path)
            .map_err(|e| SalesPgmError::Export(format!("Failed to save Excel file: {}", e)))?;

        Ok(())
    }

    /// Write a single cell value based on its type
    fn write_cell_value(
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &CellValue,
    ) -> SalesPgmResult<()> {
        match value {
            CellValue::Empty => {}
            CellValue::Text(s) => {
                worksheet
                    .write_string(row, col, s)
                    .map_err(|e| SalesPgmError::Export(format!("Failed to write text: {}", e)))?;
            }
            CellValue::Integer(i) => {
                worksheet.write_number(row, col, *i as f64).map_err(|e| {
                    SalesPgmError::Export(format!("Failed to write number: {}", e))
                })?;
            }
            CellValue::Number(n) => {
                worksheet.write_number(row, col, *n).map_err(|e| {
                    SalesPgmError::Export(format!("Failed to write number: {}", e))
                })?;
            }
            CellValue::Boolean(b) => {
                worksheet.write_boolean(row, col, *b).map_err(|e| {
                    SalesPgmError::Export(format!("Failed to write boolean: {}", e))
                })?;
            }
            CellValue::Date(d) => {
                worksheet
                    .write_string(row, col, d.format("%Y%m%d").to_string())
                    .map_err(|e| SalesPgmError::Export(format!("Failed to write date: {}", e)))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut table = Table::new(vec!["Model".to_string(), "Qty".to_string()]);
        table.push_row(Record::new(vec!["X".into(), CellValue::Integer(3)]));
        table.push_row(Record::new(vec![CellValue::Empty, CellValue::Number(1.5)]));

        ExcelExporter::new(&table).export(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let table = Table::new(vec!["Model".to_string()]);
        let result = ExcelExporter::new(&table).export(&path);
        assert!(matches!(result, Err(SalesPgmError::Export(_))));
    }
}
