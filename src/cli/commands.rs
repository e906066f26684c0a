use crate::config::{PipelineConfig, Variant};
use crate::core::{seeded_or_entropy, Pipeline, RunReport};
use crate::error::SalesPgmResult;
use crate::excel::ExcelImporter;
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Options shared by `process` and `check`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub variant: Variant,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub verbose: bool,
}

/// Preset for `variant`, with profile-file overrides when given
pub fn load_config(variant: Variant, profile: Option<&Path>) -> SalesPgmResult<PipelineConfig> {
    match profile {
        Some(path) => PipelineConfig::from_profile_file(path, variant),
        None => Ok(PipelineConfig::preset(variant)),
    }
}

/// Execute the process command
pub fn process(
    input: PathBuf,
    output_dir: PathBuf,
    dry_run: bool,
    options: RunOptions,
) -> SalesPgmResult<()> {
    println!("{}", "🧾 SalesPGM - Normalizing registration sheet".bold().green());
    println!("   Input:   {}", input.display());
    println!("   Variant: {}", options.variant.name().bright_yellow());
    if let Some(seed) = options.seed {
        println!("   Seed:    {}", seed);
    }
    println!();

    if dry_run {
        println!("{}", "📋 DRY RUN MODE - No output will be written\n".yellow());
    }

    let config = load_config(options.variant, options.config.as_deref())?;
    if options.verbose {
        if let Some(path) = &options.config {
            println!("{}", format!("⚙️  Profile: {}", path.display()).cyan());
        }
        println!(
            "   Aggregator: '{}'  Rewrite: {:?}  Grouping: {:?}\n",
            config.markers.aggregator, config.rewrite, config.grouping
        );
    }

    let pipeline = Pipeline::new(config)?;
    let mut rng = seeded_or_entropy(options.seed);
    let now = Local::now().naive_local();

    if dry_run {
        if options.verbose {
            println!("{}", "📖 Reading Excel file...".cyan());
        }
        let mut table = ExcelImporter::new(&input).import()?;
        let report = pipeline.run(&mut table, now.date(), &mut rng)?;
        print_report(&report);
        println!("{}", "📋 Dry run complete - no output written".yellow());
        return Ok(());
    }

    let processed = pipeline.process_file(&input, &output_dir, now, &mut rng)?;
    print_report(&processed.report);

    println!("{}", "✅ Processing Complete!".bold().green());
    println!("   Output file: {}\n", processed.path.display());
    Ok(())
}

/// Execute the check command
pub fn check(input: PathBuf, options: RunOptions) -> SalesPgmResult<()> {
    println!("{}", "🔍 SalesPGM - Checking registration sheet".bold().green());
    println!("   Input:   {}", input.display());
    println!("   Variant: {}\n", options.variant.name().bright_yellow());

    let config = load_config(options.variant, options.config.as_deref())?;
    let pipeline = Pipeline::new(config)?;
    let table = ExcelImporter::new(&input).import()?;

    println!("   {} columns, {} rows", table.headers.len(), table.row_count());
    if options.verbose {
        for header in &table.headers {
            println!("      {}", header.cyan());
        }
    }

    if let Err(e) = pipeline.check_columns(&table) {
        println!("\n{} {}", "❌".red(), e.to_string().red());
        return Err(e);
    }

    let cfg = pipeline.config();
    let customers = table.text_column(&cfg.columns.customer);
    let aggregators = customers
        .iter()
        .filter(|c| c.as_deref().unwrap_or("").contains(&cfg.markers.aggregator))
        .count();
    let brand_rows = customers
        .iter()
        .filter(|c| c.as_deref().unwrap_or("").contains(&cfg.markers.brand))
        .count();

    println!("   Aggregator rows ('{}'): {}", cfg.markers.aggregator, aggregators);
    println!("   Brand rows ('{}'):      {}", cfg.markers.brand, brand_rows);
    println!("\n{}", "✅ All required columns present".bold().green());
    Ok(())
}

fn print_report(report: &RunReport) {
    let r = &report.redistribution;
    let c = &report.consolidation;

    println!("{}", "📊 Run summary:".bold().green());
    println!("   Rows: {} → {}", report.rows_in, report.rows_out.to_string().bold());
    println!(
        "   Aggregator rows: {} ({} redistributed, {} without store rows, {} without model/promotion)",
        r.aggregator_rows, r.redistributed, r.skipped_no_siblings, r.skipped_missing_key
    );
    println!(
        "   Quantity: +{} placed, -{} removed",
        r.quantity_added, r.quantity_removed
    );
    if r.quantity_short > 0 {
        println!(
            "   {}",
            format!("⚠️  {} could not be removed (store rows exhausted)", r.quantity_short).yellow()
        );
    }
    if r.quantity_unplaced != 0 {
        println!(
            "   {}",
            format!("⚠️  {} aggregator quantity had no store rows and was dropped", r.quantity_unplaced)
                .yellow()
        );
    }
    if r.zero_rows_dropped > 0 {
        println!("   Zero-quantity rows dropped: {}", r.zero_rows_dropped);
    }
    println!(
        "   Duplicates: {} groups merged, {} rows folded, {} kept apart (unit amount differs)",
        c.groups_merged, c.rows_removed, c.groups_kept_apart
    );
    if let Some(f) = &report.finalize {
        println!("   Costs: {} computed, {} blank", f.costs_computed, f.costs_blank);
        if !f.dropped_columns.is_empty() {
            println!(
                "   {}",
                format!("⚠️  Dropped columns not in input: {}", f.dropped_columns.join(", ")).yellow()
            );
        }
    }
    println!();
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
