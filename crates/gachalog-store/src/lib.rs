//! Storage layer: per-pool JSON logs and the spreadsheet report.

mod error;
pub use error::StoreError;

pub mod json;
pub use json::{JsonStore, PoolLog};

pub mod report;
pub use report::{Cell, HEADERS, SheetModel, build_sheets};
#[cfg(feature = "xlsx")]
pub use report::write_report;
