//! The four-stage normalization pipeline
//!
//! ```text
//! derive fields → redistribute aggregator qty → consolidate duplicates → (finalize costs)
//! ```
//!
//! Each stage takes the whole table; the pipeline owns it for the duration
//! of one run. All randomness comes from the caller's [`Chooser`].

use crate::config::PipelineConfig;
use crate::core::consolidate::{consolidate, ConsolidationReport};
use crate::core::deriver::derive_fields;
use crate::core::finalize::{finalize_costs, FinalizeReport};
use crate::core::random::Chooser;
use crate::core::redistribute::{redistribute, RedistributionReport};
use crate::core::rewrite::PromotionRewriter;
use crate::error::{SalesPgmError, SalesPgmResult};
use crate::excel::{ExcelExporter, ExcelImporter};
use crate::output;
use crate::types::Table;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Counts collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub redistribution: RedistributionReport,
    pub consolidation: ConsolidationReport,
    pub finalize: Option<FinalizeReport>,
}

/// A written output workbook
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub report: RunReport,
}

/// Configured pipeline; reusable across runs
pub struct Pipeline {
    config: PipelineConfig,
    rewriter: PromotionRewriter,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> SalesPgmResult<Self> {
        let rewriter = PromotionRewriter::new(config.rewrite, &config.markers)?;
        Ok(Self { config, rewriter })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fails on the first required column the table lacks
    pub fn check_columns(&self, table: &Table) -> SalesPgmResult<()> {
        for column in self.config.required_columns() {
            if table.column_index(column).is_none() {
                return Err(SalesPgmError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run all stages on `table` in place
    pub fn run(
        &self,
        table: &mut Table,
        processing_date: NaiveDate,
        chooser: &mut dyn Chooser,
    ) -> SalesPgmResult<RunReport> {
        self.check_columns(table)?;

        let original_headers = table.headers.clone();
        let rows_in = table.row_count();
        info!(rows = rows_in, variant = self.config.variant.name(), "pipeline start");

        derive_fields(table, &self.config, &self.rewriter, processing_date, chooser);
        let redistribution = redistribute(table, &self.config, chooser);
        let consolidation = consolidate(table, &self.config);
        let finalize = self
            .config
            .finalize_costs
            .then(|| finalize_costs(table, &self.config, &original_headers));

        if redistribution.quantity_unplaced != 0 {
            warn!(
                quantity = redistribution.quantity_unplaced,
                "aggregator quantity without store rows was dropped"
            );
        }

        let report = RunReport {
            rows_in,
            rows_out: table.row_count(),
            redistribution,
            consolidation,
            finalize,
        };
        info!(rows_in = report.rows_in, rows_out = report.rows_out, "pipeline done");
        Ok(report)
    }

    /// Read `input`, run the pipeline and write a uniquely named workbook
    /// into `output_dir`. Nothing is written when any step before the
    /// export fails.
    pub fn process_file(
        &self,
        input: &Path,
        output_dir: &Path,
        now: NaiveDateTime,
        chooser: &mut dyn Chooser,
    ) -> SalesPgmResult<ProcessedFile> {
        let mut table = ExcelImporter::new(input).import()?;
        let report = self.run(&mut table, now.date(), chooser)?;

        let path = output::reserve_output_path(output_dir, now)?;
        if let Err(e) = ExcelExporter::new(&table).export(&path) {
            // Don't leave the reserved placeholder behind
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }
        info!(path = %path.display(), "output written");

        Ok(ProcessedFile { path, report })
    }
}
