use clap::{Parser, Subcommand};
use salespgm::cli::{self, RunOptions};
use salespgm::config::Variant;
use salespgm::error::SalesPgmResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salespgm")]
#[command(about = "Normalize promotional sales-registration sheets for accounting submission.")]
#[command(long_about = "SalesPGM - Sales program registration normalizer

Reads a registration sheet (.xlsx) and rewrites it for the accounting upload:

  1. Derive fields     - Sales PGM Name, Registration Date, Accounting Unit,
                         Department, Apply Month
  2. Redistribute      - MEDIAMARKT SATURN quantities pushed onto the store
                         rows with the same Model and Promotion
  3. Consolidate       - duplicate Model/Promotion rows in the same year
                         window merged, quantities summed
  4. Finalize costs    - (unit-cost variant) Expected Cost recomputed,
                         input column order restored

COMMANDS:
  process   - Run the pipeline and write processed_file_<timestamp>.xlsx
  check     - Verify required columns without processing

VARIANTS:
  standard  - Model column 'Model', promotion codes appended, zero rows dropped
  unit-cost - Model column 'Model(Editable)', Amount Per Unit aware

EXAMPLES:
  salespgm process registrations.xlsx
  salespgm process registrations.xlsx --variant unit-cost -o out/
  salespgm process registrations.xlsx --seed 42 --dry-run
  salespgm check registrations.xlsx --config profile.yaml")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Run the normalization pipeline on a registration sheet.

The output is written to the output directory as
processed_file_<YYYYMMDDHHMMSS>.xlsx (with _1, _2, ... appended when
another run already used that second).

Random choices (which store receives remainders, which store name is used
when a customer lists several) can be made reproducible with --seed.")]
    /// Run the pipeline and write the processed workbook
    Process {
        /// Path to the registration sheet (.xlsx)
        input: PathBuf,

        /// Directory for the processed workbook
        #[arg(short, long, default_value = "downloads", env = "SALESPGM_OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Sheet layout preset
        #[arg(long, value_enum, default_value = "standard", env = "SALESPGM_VARIANT")]
        variant: Variant,

        /// YAML profile overriding preset fields
        #[arg(short, long, env = "SALESPGM_CONFIG")]
        config: Option<PathBuf>,

        /// Seed for the random source
        #[arg(long)]
        seed: Option<u64>,

        /// Run without writing output
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Verify that a sheet has every column the pipeline needs
    Check {
        /// Path to the registration sheet (.xlsx)
        input: PathBuf,

        /// Sheet layout preset
        #[arg(long, value_enum, default_value = "standard", env = "SALESPGM_VARIANT")]
        variant: Variant,

        /// YAML profile overriding preset fields
        #[arg(short, long, env = "SALESPGM_CONFIG")]
        config: Option<PathBuf>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "salespgm=info" } else { "salespgm=warn" };
    let filter = EnvFilter::try_from_env("SALESPGM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> SalesPgmResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output_dir,
            variant,
            config,
            seed,
            dry_run,
            verbose,
        } => {
            init_tracing(verbose);
            cli::process(
                input,
                output_dir,
                dry_run,
                RunOptions {
                    variant,
                    config,
                    seed,
                    verbose,
                },
            )
        }

        Commands::Check {
            input,
            variant,
            config,
            verbose,
        } => {
            init_tracing(verbose);
            cli::check(
                input,
                RunOptions {
                    variant,
                    config,
                    seed: None,
                    verbose,
                },
            )
        }
    }
}
