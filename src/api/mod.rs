//! SalesPGM upload server module
//!
//! Upload a registration sheet, download the processed workbook.
//! Run with `salespgm-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server};
