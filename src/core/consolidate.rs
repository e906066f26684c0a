//! Stage 3: duplicate consolidation
//!
//! Rows registered twice for the same model and promotion within the same
//! year window are merged into the first of them, with quantities summed.

use crate::config::PipelineConfig;
use crate::core::dates;
use crate::types::{CellValue, Table};
use chrono::Datelike;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Groups with more than one row
    pub duplicate_groups: usize,
    pub groups_merged: usize,
    /// Rows folded into a group's first row
    pub rows_removed: usize,
    /// Duplicate groups left alone because unit amounts disagree
    pub groups_kept_apart: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    model: String,
    promotion: String,
    /// `None` is the unknown-year marker; unknowns group together
    year_from: Option<i32>,
    year_to: Option<i32>,
    unit_amount: Option<AmountKey>,
}

/// Hashable unit amount (bit pattern, with -0.0 folded into 0.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AmountKey(Option<u64>);

impl AmountKey {
    fn of(cell: &CellValue) -> Self {
        AmountKey(cell.as_number().map(|v| {
            let v = if v == 0.0 { 0.0f64 } else { v };
            v.to_bits()
        }))
    }
}

/// Merge duplicate rows in place. Applying it to its own output changes
/// nothing.
pub fn consolidate(table: &mut Table, config: &PipelineConfig) -> ConsolidationReport {
    let mut report = ConsolidationReport::default();
    let cols = &config.columns;
    let Some(qty_idx) = table.column_index(&cols.quantity) else {
        return report;
    };

    let customers = table.text_column(&cols.customer);
    let models = table.text_column(&cols.model);
    let promotions = table.text_column(&cols.promotion);
    let from_idx = table.column_index(&cols.apply_from);
    let to_idx = table.column_index(&cols.apply_to);
    let amount_idx = table.column_index(&cols.unit_amount);
    let brand = config.markers.brand.as_str();

    let year = |row: usize, idx: Option<usize>| -> Option<i32> {
        idx.and_then(|i| dates::parse_cell(table.rows[row].get(i)))
            .map(|d| d.year())
    };

    let mut group_of: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for row in 0..table.rows.len() {
        if config.skip_brand_in_consolidation
            && customers[row].as_deref().unwrap_or("").contains(brand)
        {
            continue;
        }
        let (Some(model), Some(promotion)) = (&models[row], &promotions[row]) else {
            continue;
        };

        let key = GroupKey {
            model: model.clone(),
            promotion: promotion.clone(),
            year_from: year(row, from_idx),
            year_to: year(row, to_idx),
            unit_amount: match (config.grouping.uses_unit_amount(), amount_idx) {
                (true, Some(i)) => Some(AmountKey::of(table.rows[row].get(i))),
                (true, None) => Some(AmountKey(None)),
                (false, _) => None,
            },
        };

        match group_of.get(&key) {
            Some(&g) => groups[g].push(row),
            None => {
                group_of.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }

    let mut removed = vec![false; table.rows.len()];
    for members in groups.iter().filter(|g| g.len() > 1) {
        report.duplicate_groups += 1;

        if config.grouping.uses_unit_amount() {
            let amounts: Vec<AmountKey> = members
                .iter()
                .map(|&r| amount_idx.map_or(AmountKey(None), |i| AmountKey::of(table.rows[r].get(i))))
                .collect();
            if amounts.windows(2).any(|w| w[0] != w[1]) {
                report.groups_kept_apart += 1;
                continue;
            }
        }

        let total = members
            .iter()
            .map(|&r| table.rows[r].get(qty_idx).as_integer().unwrap_or(0))
            .fold(0i64, i64::saturating_add);
        let first = members[0];
        debug!(row = first, rows = members.len(), total, "merging duplicate rows");

        table.rows[first].set(qty_idx, CellValue::Integer(total));
        for &r in &members[1..] {
            removed[r] = true;
        }
        report.groups_merged += 1;
        report.rows_removed += members.len() - 1;
    }

    let rows = std::mem::take(&mut table.rows);
    table.rows = rows
        .into_iter()
        .zip(removed)
        .filter_map(|(row, gone)| (!gone).then_some(row))
        .collect();

    for idx in [from_idx, to_idx].into_iter().flatten() {
        for row in &mut table.rows {
            let normalized = dates::normalized_cell(row.get(idx));
            row.set(idx, normalized);
        }
    }

    info!(
        groups_merged = report.groups_merged,
        rows_removed = report.rows_removed,
        kept_apart = report.groups_kept_apart,
        "duplicate consolidation done"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use pretty_assertions::assert_eq;

    fn headers() -> Vec<String> {
        [
            "Customer Name",
            "Model",
            "Promotion Name",
            "Expected QTY(Editable)",
            "Apply Date(From)",
            "Apply Date(To)",
            "Amount Per Unit",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect()
    }

    fn row(customer: &str, model: &str, from: &str, to: &str, q: i64, amount: f64) -> Record {
        Record::new(vec![
            customer.into(),
            model.into(),
            "Promo".into(),
            CellValue::Integer(q),
            from.into(),
            to.into(),
            CellValue::Number(amount),
        ])
    }

    fn quantities(t: &Table) -> Vec<i64> {
        t.rows.iter().map(|r| r.get(3).as_integer().unwrap()).collect()
    }

    #[test]
    fn test_merges_same_year_window() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "20240101", "20240331", 2, 10.0));
        t.push_row(row("B", "Y", "20240101", "20240331", 1, 10.0));
        t.push_row(row("C", "X", "20240601", "20241231", 5, 12.0));
        let report = consolidate(&mut t, &PipelineConfig::standard());

        assert_eq!(report.groups_merged, 1);
        assert_eq!(t.row_count(), 2);
        assert_eq!(quantities(&t), vec![7, 1]);
        assert_eq!(t.rows[0].get(0), &CellValue::Text("A".into()));
    }

    #[test]
    fn test_different_years_stay_apart() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "20231201", "20240131", 2, 10.0));
        t.push_row(row("B", "X", "20240101", "20240131", 3, 10.0));
        consolidate(&mut t, &PipelineConfig::standard());
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_unknown_years_group_together() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "garbage", "", 2, 10.0));
        t.push_row(row("B", "X", "", "??", 3, 10.0));
        consolidate(&mut t, &PipelineConfig::standard());
        assert_eq!(quantities(&t), vec![5]);
        assert_eq!(t.rows[0].get(4), &CellValue::Empty);
    }

    #[test]
    fn test_unit_amount_mismatch_keeps_rows() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "20240101", "20240331", 2, 10.0));
        t.push_row(row("B", "X", "20240101", "20240331", 3, 12.5));
        consolidate(&mut t, &PipelineConfig::unit_cost());
        assert_eq!(quantities(&t), vec![2, 3]);
    }

    #[test]
    fn test_unit_amount_match_merges() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "20240101", "20240331", 2, 12.5));
        t.push_row(row("B", "X", "20240101", "20240331", 3, 12.5));
        let report = consolidate(&mut t, &PipelineConfig::unit_cost());
        assert_eq!(quantities(&t), vec![5]);
        assert_eq!(report.rows_removed, 1);
    }

    #[test]
    fn test_brand_rows_are_not_consolidated() {
        let mut t = Table::new(headers());
        t.push_row(row("MEDIAMARKT BERLIN", "X", "20240101", "20240331", 2, 1.0));
        t.push_row(row("MEDIAMARKT HAMBURG", "X", "20240101", "20240331", 3, 1.0));
        consolidate(&mut t, &PipelineConfig::standard());
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_missing_model_is_not_consolidated() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "", "20240101", "20240331", 2, 1.0));
        t.push_row(row("B", "", "20240101", "20240331", 3, 1.0));
        consolidate(&mut t, &PipelineConfig::standard());
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "20240101", "20240331", 2, 10.0));
        t.push_row(row("B", "X", "20240101", "20240331", 1, 10.0));
        t.push_row(row("C", "X", "20240101", "20240331", 4, 11.0));
        t.push_row(row("D", "Y", "20240101", "20240331", 6, 10.0));
        let config = PipelineConfig::unit_cost();
        consolidate(&mut t, &config);
        let once = t.clone();
        let report = consolidate(&mut t, &config);
        assert_eq!(t, once);
        assert_eq!(report.groups_merged, 0);
    }

    #[test]
    fn test_merged_quantity_saturates() {
        let mut t = Table::new(headers());
        t.push_row(row("A", "X", "20240101", "20240331", i64::MAX, 1.0));
        t.push_row(row("B", "X", "20240101", "20240331", 5, 1.0));
        consolidate(&mut t, &PipelineConfig::standard());
        assert_eq!(quantities(&t), vec![i64::MAX]);
    }

    #[test]
    fn test_dates_written_as_compact_text() {
        let mut t = Table::new(headers());
        let mut r = row("A", "X", "", "", 1, 1.0);
        r.set(4, CellValue::Integer(20240105));
        t.push_row(r);
        consolidate(&mut t, &PipelineConfig::standard());
        assert_eq!(t.rows[0].get(4), &CellValue::Text("20240105".into()));
    }
}
