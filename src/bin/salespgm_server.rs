//! SalesPGM server binary
//!
//! Upload a registration sheet, download the processed workbook.

use clap::Parser;
use salespgm::api::{run_api_server, server::ApiConfig};
use salespgm::cli::load_config;
use salespgm::config::Variant;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "salespgm-server")]
#[command(version)]
#[command(about = "SalesPGM Server - upload registration sheets, download processed workbooks")]
#[command(long_about = r#"
SalesPGM Server - upload/download front end for the normalization pipeline

Endpoints:
  - POST /upload               - Multipart upload (field 'file'); returns download_url
  - GET  /download/:filename   - Processed workbook as an attachment
  - GET  /health               - Health check
  - GET  /version              - Server version and active variant
  - GET  /                     - API documentation

Example usage:
  salespgm-server                                  # localhost:8000, ./downloads
  salespgm-server --variant unit-cost --port 3000

  curl -F "file=@registrations.xlsx" http://localhost:8000/upload
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SALESPGM_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "SALESPGM_PORT")]
    port: u16,

    /// Directory for staged uploads and processed workbooks
    #[arg(short, long, default_value = "downloads", env = "SALESPGM_OUTPUT_DIR")]
    download_dir: PathBuf,

    /// Sheet layout preset
    #[arg(long, value_enum, default_value = "standard", env = "SALESPGM_VARIANT")]
    variant: Variant,

    /// YAML profile overriding preset fields
    #[arg(short, long, env = "SALESPGM_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum upload size in bytes
    #[arg(long, default_value = "26214400")]
    max_upload_bytes: usize,

    /// Seed for the random source
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let pipeline_config = load_config(args.variant, args.config.as_deref())?;
    let config = ApiConfig {
        host: args.host,
        port: args.port,
        download_dir: args.download_dir,
        max_upload_bytes: args.max_upload_bytes,
        seed: args.seed,
    };

    run_api_server(config, pipeline_config).await
}
