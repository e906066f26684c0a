//! Excel import/export
//!
//! - Import: first worksheet of an .xlsx/.xls file → [`Table`](crate::types::Table)
//! - Export: `Table` → single-sheet .xlsx

mod exporter;
mod importer;

pub use exporter::{ExcelExporter, SHEET_NAME};
pub use importer::ExcelImporter;
