//! Stage 2: aggregator quantity redistribution
//!
//! Rows booked against the aggregator account carry quantity that really
//! belongs to the individual stores registered for the same model and
//! promotion. That quantity is pushed onto those sibling rows, then the
//! aggregator rows are removed.
//!
//! | Aggregator quantity `Q`    | Strategy                                        |
//! |----------------------------|-------------------------------------------------|
//! | `Q > threshold` (11)       | even split, remainder to one random sibling     |
//! | `0 <= Q <= threshold`      | `Q` single units, each to a random sibling      |
//! | `Q < 0`                    | random removal from siblings that still have qty |
//!
//! Blank or non-numeric quantities stay as they are unless a sibling
//! receives quantity, in which case they count from 0.

use crate::config::PipelineConfig;
use crate::core::random::Chooser;
use crate::types::{CellValue, Table};
use tracing::{debug, info, warn};

/// What stage 2 did to the table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedistributionReport {
    pub aggregator_rows: usize,
    /// Aggregator rows whose quantity was moved onto siblings
    pub redistributed: usize,
    /// Aggregator rows without Model or Promotion Name
    pub skipped_missing_key: usize,
    /// Aggregator rows with no matching store rows
    pub skipped_no_siblings: usize,
    pub quantity_added: i64,
    pub quantity_removed: i64,
    /// Negative quantity that could not be taken because siblings ran out
    pub quantity_short: i64,
    /// Quantity of skipped aggregator rows, lost when they are dropped
    pub quantity_unplaced: i64,
    /// Non-aggregator rows dropped for having zero quantity
    pub zero_rows_dropped: usize,
}

/// Redistribute aggregator quantities, then drop aggregator rows (and
/// zero-quantity rows when the policy asks for it).
pub fn redistribute(
    table: &mut Table,
    config: &PipelineConfig,
    chooser: &mut dyn Chooser,
) -> RedistributionReport {
    let mut report = RedistributionReport::default();
    let cols = &config.columns;
    let Some(qty_idx) = table.column_index(&cols.quantity) else {
        return report;
    };

    let customers = table.text_column(&cols.customer);
    let models = table.text_column(&cols.model);
    let promotions = table.text_column(&cols.promotion);
    let marker = config.markers.aggregator.as_str();

    let is_aggregator: Vec<bool> = customers
        .iter()
        .map(|c| c.as_deref().unwrap_or("").contains(marker))
        .collect();
    let mut qty: Vec<Option<i64>> = table
        .rows
        .iter()
        .map(|r| r.get(qty_idx).as_integer())
        .collect();
    let mut touched = vec![false; qty.len()];

    for agg in 0..qty.len() {
        if !is_aggregator[agg] {
            continue;
        }
        report.aggregator_rows += 1;
        let total = qty[agg].unwrap_or(0);

        let (Some(model), Some(promotion)) = (&models[agg], &promotions[agg]) else {
            warn!(row = agg, quantity = total, "aggregator row without model/promotion, skipped");
            report.skipped_missing_key += 1;
            report.quantity_unplaced = report.quantity_unplaced.saturating_add(total);
            continue;
        };

        let siblings: Vec<usize> = (0..qty.len())
            .filter(|&i| {
                !is_aggregator[i]
                    && models[i].as_deref() == Some(model.as_str())
                    && promotions[i].as_deref() == Some(promotion.as_str())
            })
            .collect();

        if siblings.is_empty() {
            warn!(row = agg, %model, %promotion, quantity = total, "aggregator row has no store rows, skipped");
            report.skipped_no_siblings += 1;
            report.quantity_unplaced = report.quantity_unplaced.saturating_add(total);
            continue;
        }

        if total > config.even_split_threshold {
            distribute_evenly(&mut qty, &mut touched, &siblings, total, chooser);
            report.quantity_added = report.quantity_added.saturating_add(total);
        } else if total < 0 {
            let wanted = total.saturating_neg();
            let removed = remove_randomly(&mut qty, &mut touched, &siblings, wanted, chooser);
            if removed < wanted {
                warn!(%model, %promotion, wanted, removed, "store rows exhausted before removal finished");
            }
            report.quantity_removed = report.quantity_removed.saturating_add(removed);
            report.quantity_short = report.quantity_short.saturating_add(wanted - removed);
        } else {
            distribute_randomly(&mut qty, &mut touched, &siblings, total, chooser);
            report.quantity_added = report.quantity_added.saturating_add(total);
        }
        debug!(%model, %promotion, quantity = total, siblings = siblings.len(), "redistributed");

        report.redistributed += 1;
    }

    let rows = std::mem::take(&mut table.rows);
    table.rows = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, mut row)| {
            if is_aggregator[i] {
                return None;
            }
            if config.drop_zero_quantity && qty[i] == Some(0) {
                report.zero_rows_dropped += 1;
                return None;
            }
            if touched[i] {
                row.set(qty_idx, qty[i].map_or(CellValue::Empty, CellValue::Integer));
            }
            Some(row)
        })
        .collect();

    info!(
        aggregator_rows = report.aggregator_rows,
        redistributed = report.redistributed,
        added = report.quantity_added,
        removed = report.quantity_removed,
        zero_rows_dropped = report.zero_rows_dropped,
        "quantity redistribution done"
    );
    report
}

/// Adds `amount` to a sibling; a missing quantity counts from 0
fn add(qty: &mut [Option<i64>], touched: &mut [bool], i: usize, amount: i64) {
    qty[i] = Some(qty[i].unwrap_or(0).saturating_add(amount));
    touched[i] = true;
}

/// `floor(total / n)` to every sibling, remainder to one random sibling
fn distribute_evenly(
    qty: &mut [Option<i64>],
    touched: &mut [bool],
    siblings: &[usize],
    total: i64,
    chooser: &mut dyn Chooser,
) {
    let count = siblings.len() as i64;
    let share = total / count;
    let remainder = total % count;
    for &i in siblings {
        add(qty, touched, i, share);
    }
    if remainder > 0 {
        let lucky = siblings[chooser.choose_index(siblings.len())];
        add(qty, touched, lucky, remainder);
    }
}

/// One unit at a time to random siblings (repeats allowed)
fn distribute_randomly(
    qty: &mut [Option<i64>],
    touched: &mut [bool],
    siblings: &[usize],
    total: i64,
    chooser: &mut dyn Chooser,
) {
    for _ in 0..total {
        let i = siblings[chooser.choose_index(siblings.len())];
        add(qty, touched, i, 1);
    }
}

/// Take `amount` away from random siblings that still have positive
/// quantity. Returns what was actually removed; stops early once no
/// sibling has anything left.
fn remove_randomly(
    qty: &mut [Option<i64>],
    touched: &mut [bool],
    siblings: &[usize],
    amount: i64,
    chooser: &mut dyn Chooser,
) -> i64 {
    let mut remaining = amount;
    while remaining > 0 {
        let eligible: Vec<usize> = siblings
            .iter()
            .copied()
            .filter(|&i| qty[i].is_some_and(|q| q > 0))
            .collect();
        if eligible.is_empty() {
            break;
        }
        let i = eligible[chooser.choose_index(eligible.len())];
        let current = qty[i].unwrap_or(0);
        let reduction = current.min(remaining);
        qty[i] = Some(current - reduction);
        touched[i] = true;
        remaining -= reduction;
    }
    amount - remaining
}
