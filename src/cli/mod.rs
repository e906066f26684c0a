//! CLI command handlers

pub mod commands;

pub use commands::{check, load_config, process, RunOptions};
