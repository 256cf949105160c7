//! # hoadon
//!
//! Batch tooling for Vietnamese e-invoices (hóa đơn điện tử) in the XML
//! schema used by the tax authority portal: extraction, a multi-currency
//! spreadsheet report and date-prefixed renaming.
//!
//! Amounts are parsed into [`rust_decimal::Decimal`], never floating point.
//! A missing XML node is an empty value, not an error; only a document that
//! cannot be parsed at all fails, and then only for that one file.
//!
//! ## Quick Start
//!
//! ```rust
//! use hoadon::extract::extract_invoice;
//! use hoadon::xml::Document;
//!
//! let doc = Document::parse(
//!     "<HDon><DLHDon><TTChung><SHDon>0000123</SHDon><NLap>2024-03-15</NLap>\
//!      <DVTTe>VND</DVTTe></TTChung><NDHDon><DSHHDVu><HHDVu><STT>1</STT>\
//!      <THHDVu>Dịch vụ</THHDVu><ThTien>1000000</ThTien><TSuat>10%</TSuat>\
//!      </HHDVu></DSHHDVu></NDHDon></DLHDon></HDon>",
//! )
//! .unwrap();
//! let invoice = extract_invoice(&doc);
//!
//! assert_eq!(invoice.header.number, "0000123");
//! assert_eq!(
//!     hoadon::core::format::format_after_tax("1000000", "10%", "VND"),
//!     "1,100,000 VND"
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `report` (default) | Summary/Detail sheet layouts, currency summary, `.xlsx` output |
//! | `rename` (default) | XML rename pipeline, PDF rename collaborator |
//! | `cli` (default) | `hoadon` binary |
//! | `all` | Everything |

pub mod aggregate;
pub mod core;
pub mod extract;
pub mod xml;

#[cfg(feature = "report")]
pub mod report;

#[cfg(feature = "rename")]
pub mod rename;

// Re-export core types at crate root for convenience
pub use crate::core::*;
