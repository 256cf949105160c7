//! Invoice data model, formatting and batch-run plumbing shared by the
//! extraction, reporting and rename pipelines.

mod config;
mod error;
pub mod format;
mod run;
pub mod scan;
mod types;

pub use config::*;
pub use error::*;
pub use format::{format_amount, format_decimal, parse_decimal};
pub use run::*;
pub use scan::scan_folder;
pub use types::*;
