//! Excel import/export tests

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use salespgm::config::PipelineConfig;
use salespgm::core::Pipeline;
use salespgm::error::SalesPgmError;
use salespgm::excel::{ExcelExporter, ExcelImporter};
use salespgm::types::{CellValue, Record, Table};
use std::path::Path;
use tempfile::TempDir;

fn registration_table() -> Table {
    let headers = [
        "Customer Name",
        "Model",
        "Promotion Name",
        "Expected QTY(Editable)",
        "Apply Date(From)",
        "Apply Date(To)",
    ];
    let mut table = Table::new(headers.iter().map(|h| h.to_string()).collect());
    table.push_row(Record::new(vec![
        "MEDIAMARKT SATURN".into(),
        "TV-55".into(),
        "Spring AB1234 MEDIAMARKT".into(),
        CellValue::Integer(3),
        CellValue::Integer(20240101),
        "20240331".into(),
    ]));
    table.push_row(Record::new(vec![
        "MEDIAMARKT BERLIN".into(),
        "TV-55".into(),
        "Spring AB1234 MEDIAMARKT".into(),
        CellValue::Integer(1),
        CellValue::Integer(20240101),
        "20240331".into(),
    ]));
    table.push_row(Record::new(vec![
        "ELECTRO WORLD".into(),
        "SB-1".into(),
        "Soundbar".into(),
        CellValue::Integer(2),
        CellValue::Integer(20240101),
        "20240331".into(),
    ]));
    table
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT → IMPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_then_import_keeps_headers_and_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.xlsx");

    let mut table = Table::new(vec![
        "Name".to_string(),
        "Qty".to_string(),
        "Amount".to_string(),
        "Flag".to_string(),
        "Blank".to_string(),
    ]);
    table.push_row(Record::new(vec![
        "SHOP A".into(),
        CellValue::Integer(-4),
        CellValue::Number(12.5),
        CellValue::Boolean(true),
        CellValue::Empty,
    ]));

    ExcelExporter::new(&table).export(&path).unwrap();
    let imported = ExcelImporter::new(&path).import().unwrap();

    assert_eq!(imported.headers, table.headers);
    assert_eq!(imported.row_count(), 1);
    assert_eq!(imported.rows[0].get(0), &CellValue::Text("SHOP A".into()));
    assert_eq!(imported.rows[0].get(1), &CellValue::Integer(-4));
    assert_eq!(imported.rows[0].get(2), &CellValue::Number(12.5));
    assert_eq!(imported.rows[0].get(3), &CellValue::Boolean(true));
    assert_eq!(imported.rows[0].get(4), &CellValue::Empty);
}

#[test]
fn test_exported_dates_are_compact_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dates.xlsx");

    let mut table = Table::new(vec!["Apply Date(To)".to_string()]);
    table.push_row(Record::new(vec![CellValue::Date(
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
    )]));
    ExcelExporter::new(&table).export(&path).unwrap();

    let imported = ExcelImporter::new(&path).import().unwrap();
    assert_eq!(imported.rows[0].get(0), &CellValue::Text("20240229".into()));
}

#[test]
fn test_import_native_date_cells() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("native.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Apply Date(From)").unwrap();
    let date = ExcelDateTime::from_ymd(2024, 1, 31).unwrap();
    let format = Format::new().set_num_format("yyyy-mm-dd");
    sheet.write_date_with_format(1, 0, &date, &format).unwrap();
    workbook.save(&path).unwrap();

    let imported = ExcelImporter::new(&path).import().unwrap();
    assert_eq!(
        imported.rows[0].get(0),
        &CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
    );
}

#[test]
fn test_import_missing_file() {
    let result = ExcelImporter::new("/nonexistent/registrations.xlsx").import();
    assert!(matches!(result, Err(SalesPgmError::Import(_))));
}

#[test]
fn test_import_not_a_workbook() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.xlsx");
    std::fs::write(&path, b"not a zip archive").unwrap();
    let result = ExcelImporter::new(&path).import();
    assert!(matches!(result, Err(SalesPgmError::Import(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// FILE PIPELINE
// ═══════════════════════════════════════════════════════════════════════════

fn write_input(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("registrations.xlsx");
    ExcelExporter::new(&registration_table()).export(&input).unwrap();
    input
}

fn now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap()
}

#[test]
fn test_process_file_writes_timestamped_workbook() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let out_dir = dir.path().join("downloads");

    let pipeline = Pipeline::new(PipelineConfig::standard()).unwrap();
    let processed = pipeline
        .process_file(&input, &out_dir, now(), &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_eq!(
        processed.path.file_name().unwrap().to_str().unwrap(),
        "processed_file_20250506070809.xlsx"
    );
    assert_eq!(processed.report.rows_in, 3);
    assert_eq!(processed.report.rows_out, 2);

    let output = ExcelImporter::new(&processed.path).import().unwrap();
    let qty = output.column_index("Expected QTY(Editable)").unwrap();
    let program = output.column_index("Sales PGM Name(Editable)").unwrap();
    let from = output.column_index("Apply Date(From)").unwrap();
    assert_eq!(output.rows[0].get(qty), &CellValue::Integer(4));
    assert_eq!(
        output.rows[0].get(program),
        &CellValue::Text("Spring AB1234 MM BERLIN - AB1234 - NP - E".into())
    );
    assert_eq!(output.rows[0].get(from), &CellValue::Text("20240101".into()));
}

#[test]
fn test_process_file_same_second_gets_suffix() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let out_dir = dir.path().join("downloads");
    let pipeline = Pipeline::new(PipelineConfig::standard()).unwrap();

    let first = pipeline
        .process_file(&input, &out_dir, now(), &mut StdRng::seed_from_u64(1))
        .unwrap();
    let second = pipeline
        .process_file(&input, &out_dir, now(), &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_ne!(first.path, second.path);
    assert_eq!(
        second.path.file_name().unwrap().to_str().unwrap(),
        "processed_file_20250506070809_1.xlsx"
    );
}

#[test]
fn test_process_file_missing_column_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.xlsx");
    let mut table = Table::new(vec!["Customer Name".to_string()]);
    table.push_row(Record::new(vec!["SHOP".into()]));
    ExcelExporter::new(&table).export(&input).unwrap();

    let out_dir = dir.path().join("downloads");
    let pipeline = Pipeline::new(PipelineConfig::standard()).unwrap();
    let result = pipeline.process_file(&input, &out_dir, now(), &mut StdRng::seed_from_u64(1));

    assert!(matches!(result, Err(SalesPgmError::MissingColumn { .. })));
    assert!(!out_dir.exists() || std::fs::read_dir(&out_dir).unwrap().next().is_none());
}
