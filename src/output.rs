//! Output file naming
//!
//! Each run writes `processed_file_{YYYYMMDDHHMMSS}.xlsx`. Runs landing in
//! the same second get `_1`, `_2`, ... appended. The name is claimed with
//! `create_new`, so two concurrent runs can never get the same file.

use crate::error::{SalesPgmError, SalesPgmResult};
use chrono::NaiveDateTime;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const OUTPUT_PREFIX: &str = "processed_file_";
pub const OUTPUT_EXTENSION: &str = "xlsx";

const MAX_ATTEMPTS: u32 = 10_000;

pub fn output_file_name(timestamp: NaiveDateTime, attempt: u32) -> String {
    let stamp = timestamp.format("%Y%m%d%H%M%S");
    if attempt == 0 {
        format!("{}{}.{}", OUTPUT_PREFIX, stamp, OUTPUT_EXTENSION)
    } else {
        format!("{}{}_{}.{}", OUTPUT_PREFIX, stamp, attempt, OUTPUT_EXTENSION)
    }
}

/// Claim a fresh output path in `dir` (created if missing)
pub fn reserve_output_path(dir: &Path, timestamp: NaiveDateTime) -> SalesPgmResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    for attempt in 0..MAX_ATTEMPTS {
        let path = dir.join(output_file_name(timestamp, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(SalesPgmError::Io(e)),
        }
    }
    Err(SalesPgmError::Export(format!(
        "No free output name left in {} for {}",
        dir.display(),
        timestamp.format("%Y%m%d%H%M%S")
    )))
}

/// True for a bare file name (no directories, no `..`)
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}
