//! Stage 4: cost recompute and column order restore

use crate::config::PipelineConfig;
use crate::types::{CellValue, Table};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    pub costs_computed: usize,
    /// Rows whose unit amount was missing or not numeric
    pub costs_blank: usize,
    /// Derived columns that did not exist in the input and were dropped
    pub dropped_columns: Vec<String>,
}

/// Expected Cost = Amount Per Unit × Expected QTY on every row, then the
/// table is put back into `original_headers` order.
pub fn finalize_costs(
    table: &mut Table,
    config: &PipelineConfig,
    original_headers: &[String],
) -> FinalizeReport {
    let mut report = FinalizeReport::default();
    let cols = &config.columns;

    let amount_idx = table.column_index(&cols.unit_amount);
    let qty_idx = table.column_index(&cols.quantity);
    let cost_idx = table.ensure_column(&cols.expected_cost);

    for row in &mut table.rows {
        let amount = amount_idx.and_then(|i| row.get(i).as_number());
        let qty = qty_idx.and_then(|i| row.get(i).as_integer());
        match (amount, qty) {
            (Some(amount), Some(qty)) => {
                row.set(cost_idx, CellValue::Number(amount * qty as f64));
                report.costs_computed += 1;
            }
            _ => {
                row.set(cost_idx, CellValue::Empty);
                report.costs_blank += 1;
            }
        }
    }

    report.dropped_columns = table
        .headers
        .iter()
        .filter(|h| !original_headers.contains(h))
        .cloned()
        .collect();
    if !report.dropped_columns.is_empty() {
        warn!(columns = ?report.dropped_columns, "columns not present in the input are dropped from the output");
    }
    table.reorder_columns(original_headers);

    info!(computed = report.costs_computed, blank = report.costs_blank, "cost finalizer done");
    report
}
