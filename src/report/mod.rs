//! Spreadsheet report: sheet layouts, currency summary, `.xlsx` output and
//! the batch export driver.

mod builder;
mod currency;
mod export;
pub mod layout;
pub mod sheet;
mod xlsx;

pub use builder::ReportBuilder;
pub use export::{ExportRunner, ExportSummary};
pub use layout::{DETAIL_SHEET, SUMMARY_SHEET, sanitize_sheet_name};
pub use sheet::{Cell, CellRange, CellStyle, CellValue, Sheet, Workbook};
pub use xlsx::{internal_link, save_workbook};
