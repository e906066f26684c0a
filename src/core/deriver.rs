//! Stage 1: derived accounting columns

use crate::config::{ApplyMonthRule, PipelineConfig};
use crate::core::dates;
use crate::core::random::Chooser;
use crate::core::rewrite::PromotionRewriter;
use crate::types::{CellValue, Table};
use chrono::NaiveDate;
use tracing::debug;

/// Fills Sales Program Name, Registration Request Date, Accounting Unit,
/// Department and Apply Month on every row, and normalizes both apply
/// dates to YYYYMMDD text.
pub fn derive_fields(
    table: &mut Table,
    config: &PipelineConfig,
    rewriter: &PromotionRewriter,
    processing_date: NaiveDate,
    chooser: &mut dyn Chooser,
) {
    let cols = &config.columns;
    let customer_idx = table.column_index(&cols.customer);
    let promotion_idx = table.column_index(&cols.promotion);
    let from_idx = table.column_index(&cols.apply_from);
    let to_idx = table.column_index(&cols.apply_to);

    let program_idx = table.ensure_column(&cols.sales_program);
    let registered_idx = table.ensure_column(&cols.registration_date);
    let unit_idx = table.ensure_column(&cols.accounting_unit);
    let department_idx = table.ensure_column(&cols.department);
    let month_idx = table.ensure_column(&cols.apply_month);

    let registered = CellValue::Text(dates::format_compact(processing_date));
    let processing_month = dates::format_month(processing_date);

    for row in &mut table.rows {
        let promotion = promotion_idx
            .and_then(|i| row.get(i).as_text())
            .unwrap_or_default();
        let customer = customer_idx
            .and_then(|i| row.get(i).as_text())
            .unwrap_or_default();

        let program = rewriter.rewrite(&promotion, &customer, chooser);
        debug!(promotion = %promotion, customer = %customer, program = %program, "sales program name");

        let apply_to = to_idx.and_then(|i| dates::parse_cell(row.get(i)));
        if let Some(i) = from_idx {
            let normalized = dates::normalized_cell(row.get(i));
            row.set(i, normalized);
        }
        if let Some(i) = to_idx {
            let normalized = dates::normalized_cell(row.get(i));
            row.set(i, normalized);
        }

        let month = match &config.apply_month {
            ApplyMonthRule::ApplyDateTo => apply_to
                .map(|d| CellValue::Text(dates::format_month(d)))
                .unwrap_or(CellValue::Empty),
            ApplyMonthRule::ProcessingMonth => CellValue::Text(processing_month.clone()),
            ApplyMonthRule::Fixed(literal) => CellValue::Text(literal.clone()),
        };

        row.set(program_idx, CellValue::Text(program));
        row.set(registered_idx, registered.clone());
        row.set(unit_idx, CellValue::Text(config.accounting_unit.clone()));
        row.set(department_idx, CellValue::Integer(config.department));
        row.set(month_idx, month);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> Table {
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
            "MEDIAMARKT BERLIN".into(),
            "TV-55".into(),
            "Deal AB1234 MEDIAMARKT".into(),
            CellValue::Integer(4),
            CellValue::Integer(20240101),
            "20240331".into(),
        ]));
        table.push_row(Record::new(vec![
            CellValue::Empty,
            "TV-55".into(),
            CellValue::Empty,
            CellValue::Integer(1),
            "bad".into(),
            CellValue::Empty,
        ]));
        table
    }

    fn run(config: &PipelineConfig) -> Table {
        let mut t = table();
        let rewriter = PromotionRewriter::new(config.rewrite, &config.markers).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        derive_fields(&mut t, config, &rewriter, today, &mut StdRng::seed_from_u64(1));
        t
    }

    fn cell<'a>(t: &'a Table, row: usize, column: &str) -> &'a CellValue {
        t.rows[row].get(t.column_index(column).unwrap())
    }

    #[test]
    fn test_derived_columns_are_appended() {
        let t = run(&PipelineConfig::standard());
        assert_eq!(t.headers.len(), 11);
        assert_eq!(
            cell(&t, 0, "Sales PGM Name(Editable)"),
            &CellValue::Text("Deal AB1234 MM BERLIN - AB1234 - NP - E".into())
        );
        assert_eq!(
            cell(&t, 0, "Registration Requeste Date(Editable)"),
            &CellValue::Text("20250609".into())
        );
        assert_eq!(cell(&t, 0, "Accounting Unit(Editable)"), &CellValue::Text("SAL".into()));
        assert_eq!(cell(&t, 0, "Department(Editable)"), &CellValue::Integer(20066));
        assert_eq!(cell(&t, 0, "Apply Month(Editable)"), &CellValue::Text("202403".into()));
    }

    #[test]
    fn test_dates_normalized_and_unknown_blank() {
        let t = run(&PipelineConfig::standard());
        assert_eq!(cell(&t, 0, "Apply Date(From)"), &CellValue::Text("20240101".into()));
        assert_eq!(cell(&t, 1, "Apply Date(From)"), &CellValue::Empty);
        assert_eq!(cell(&t, 1, "Apply Month(Editable)"), &CellValue::Empty);
    }

    #[test]
    fn test_missing_names_read_as_empty() {
        let t = run(&PipelineConfig::standard());
        assert_eq!(
            cell(&t, 1, "Sales PGM Name(Editable)"),
            &CellValue::Text(" - NP - E".into())
        );
    }

    #[test]
    fn test_processing_month_rule() {
        let mut config = PipelineConfig::standard();
        config.apply_month = ApplyMonthRule::ProcessingMonth;
        let t = run(&config);
        assert_eq!(cell(&t, 1, "Apply Month(Editable)"), &CellValue::Text("202506".into()));

        config.apply_month = ApplyMonthRule::Fixed("209912".into());
        let t = run(&config);
        assert_eq!(cell(&t, 0, "Apply Month(Editable)"), &CellValue::Text("209912".into()));
    }

    #[test]
    fn test_existing_derived_column_is_overwritten_in_place() {
        let mut t = table();
        let idx = t.ensure_column("Accounting Unit(Editable)");
        t.rows[0].set(idx, "OLD".into());
        let config = PipelineConfig::standard();
        let rewriter = PromotionRewriter::new(config.rewrite, &config.markers).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        derive_fields(&mut t, &config, &rewriter, today, &mut StdRng::seed_from_u64(1));
        assert_eq!(t.column_index("Accounting Unit(Editable)"), Some(idx));
        assert_eq!(t.rows[0].get(idx), &CellValue::Text("SAL".into()));
    }
}
