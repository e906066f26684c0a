//! SalesPGM - sales program registration normalizer
//!
//! Rewrites promotional sales-registration sheets into the form the
//! accounting upload expects.
//!
//! # Pipeline
//!
//! 1. Field derivation (sales program name, registration date, accounting
//!    unit, department, apply month)
//! 2. Aggregator quantity redistribution (`MEDIAMARKT SATURN` rows)
//! 3. Duplicate consolidation
//! 4. Cost finalization (unit-cost sheets only)
//!
//! # Example
//!
//! ```no_run
//! use salespgm::config::PipelineConfig;
//! use salespgm::core::{seeded_or_entropy, Pipeline};
//! use chrono::Local;
//! use std::path::Path;
//!
//! let pipeline = Pipeline::new(PipelineConfig::standard())?;
//! let mut rng = seeded_or_entropy(Some(42));
//! let processed = pipeline.process_file(
//!     Path::new("registrations.xlsx"),
//!     Path::new("downloads"),
//!     Local::now().naive_local(),
//!     &mut rng,
//! )?;
//! println!("Wrote {}", processed.path.display());
//! # Ok::<(), salespgm::error::SalesPgmError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod output;
pub mod types;

// Re-export commonly used types
pub use config::{PipelineConfig, Variant};
pub use error::{SalesPgmError, SalesPgmResult};
pub use types::{CellValue, Record, Table};
