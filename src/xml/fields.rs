//! Schema paths of the fields the extractor reads, declared once.

use super::document::{Document, Element};

/// Repeated line-item element.
pub const LINE_ITEM: &str = "HHDVu";
/// Sequence number inside a line item; counted for the total-quantity column.
pub const LINE_ITEM_SEQUENCE: &str = "HHDVu/STT";
/// Totals block.
pub const TAX_BLOCK: &str = "TToan";
/// Rate entries, relative to [`TAX_BLOCK`].
pub const RATE_ENTRY: &str = "THTTLTSuat/LTSuat";

/// A field with a fixed schema path relative to some context element.
pub trait FieldPath: Copy {
    fn path(self) -> &'static str;
}

/// Invoice-level fields, looked up anywhere in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    InvoiceNumber,
    IssueDate,
    Currency,
    SellerName,
    SellerTaxId,
    SellerAddress,
    BuyerName,
    BuyerTaxId,
    BuyerAddress,
}

impl FieldPath for HeaderField {
    fn path(self) -> &'static str {
        match self {
            Self::InvoiceNumber => "SHDon",
            Self::IssueDate => "NLap",
            Self::Currency => "DVTTe",
            Self::SellerName => "NBan/Ten",
            Self::SellerTaxId => "NBan/MST",
            Self::SellerAddress => "NBan/DChi",
            Self::BuyerName => "NMua/Ten",
            Self::BuyerTaxId => "NMua/MST",
            Self::BuyerAddress => "NMua/DChi",
        }
    }
}

/// Fields of one `HHDVu` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Sequence,
    Description,
    Unit,
    Quantity,
    UnitPrice,
    PreTaxAmount,
    TaxRate,
}

impl FieldPath for ItemField {
    fn path(self) -> &'static str {
        match self {
            Self::Sequence => "STT",
            Self::Description => "THHDVu",
            Self::Unit => "DVTinh",
            Self::Quantity => "SLuong",
            Self::UnitPrice => "DGia",
            Self::PreTaxAmount => "ThTien",
            Self::TaxRate => "TSuat",
        }
    }
}

/// Totals of the `TToan` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsField {
    BeforeTax,
    Tax,
    AfterTax,
    AmountInWords,
}

impl FieldPath for TotalsField {
    fn path(self) -> &'static str {
        match self {
            Self::BeforeTax => "TgTCThue",
            Self::Tax => "TgTThue",
            Self::AfterTax => "TgTTTBSo",
            Self::AmountInWords => "TgTTTBChu",
        }
    }
}

/// Fields of one `LTSuat` rate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateField {
    Label,
    PreTax,
    Tax,
}

impl FieldPath for RateField {
    fn path(self) -> &'static str {
        match self {
            Self::Label => "TSuat",
            Self::PreTax => "ThTien",
            Self::Tax => "TThue",
        }
    }
}

impl Document {
    /// Header field text, `""` when the node is missing.
    pub fn field(&self, field: HeaderField) -> String {
        self.text(field.path())
    }
}

impl Element<'_> {
    /// Child field text, `""` when the node is missing.
    pub fn field<F: FieldPath>(&self, field: F) -> String {
        self.text(field.path())
    }

    /// Child field text, `missing` when the node does not exist. A node
    /// that exists but is empty still yields `""`.
    pub fn field_or<F: FieldPath>(&self, field: F, missing: &str) -> String {
        self.select_first(field.path())
            .map(|e| e.inner_text())
            .unwrap_or_else(|| missing.to_string())
    }
}
