use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::format::{parse_decimal, parse_rate};

/// One extracted invoice document: header, line items and the totals block.
///
/// Built fresh per file and never mutated after extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invoice {
    pub header: InvoiceHeader,
    /// `HHDVu` nodes in document order.
    pub items: Vec<LineItem>,
    /// `TToan` block, if the document has one.
    pub tax_block: Option<TaxBlock>,
    /// Number of `HHDVu/STT` nodes (the "total quantity" summary column).
    pub numbered_item_count: usize,
}

/// `NBan` / `NMua`: seller or buyer block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// `Ten`
    pub name: String,
    /// `MST`
    pub tax_id: String,
    /// `DChi`
    pub address: String,
}

/// Invoice-level header fields.
///
/// All fields hold the raw text of the source node; an empty string means
/// the node was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// `SHDon`: invoice number.
    pub number: String,
    /// `NLap`: issue date as written in the document.
    pub issue_date: String,
    /// `DVTTe`: currency code.
    pub currency: String,
    pub seller: Party,
    pub buyer: Party,
}

impl InvoiceHeader {
    /// Issue date parsed as a local calendar date.
    pub fn issue_date_value(&self) -> Option<NaiveDate> {
        parse_issue_date(&self.issue_date)
    }
}

/// `HHDVu`: one billed good or service.
///
/// Numeric fields keep their source text so that non-numeric values pass
/// through to the report unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// `STT`
    pub sequence: String,
    /// `THHDVu`
    pub description: String,
    /// `DVTinh`
    pub unit: String,
    /// `SLuong`
    pub quantity: String,
    /// `DGia`; empty when absent.
    pub unit_price: String,
    /// `ThTien`
    pub pre_tax_amount: String,
    /// `TSuat`, e.g. "10%".
    pub tax_rate: String,
    /// Inherited from the header `DVTTe`.
    pub currency: String,
}

impl LineItem {
    pub fn quantity_value(&self) -> Option<Decimal> {
        parse_decimal(&self.quantity)
    }

    pub fn unit_price_value(&self) -> Option<Decimal> {
        parse_decimal(&self.unit_price)
    }

    pub fn pre_tax_value(&self) -> Option<Decimal> {
        parse_decimal(&self.pre_tax_amount)
    }

    /// Derived after-tax amount: `pre_tax * (1 + rate / 100)`.
    ///
    /// `None` unless both the pre-tax amount and the rate parse.
    pub fn after_tax_amount(&self) -> Option<Decimal> {
        if self.pre_tax_amount.is_empty() || self.tax_rate.is_empty() {
            return None;
        }
        let pre_tax = self.pre_tax_value()?;
        let rate = parse_rate(&self.tax_rate)?;
        let tax = pre_tax.checked_mul(rate.checked_div(Decimal::ONE_HUNDRED)?)?;
        pre_tax.checked_add(tax)
    }
}

/// Rate label of an `LTSuat` entry without a `TSuat` node.
pub const DEFAULT_RATE_LABEL: &str = "0%";

/// Amount of an `LTSuat` entry whose `ThTien` or `TThue` node is absent.
pub const ABSENT_AMOUNT: &str = "0";

/// `LTSuat`: one rate entry of the tax breakdown.
///
/// Absent nodes are filled with [`DEFAULT_RATE_LABEL`] / [`ABSENT_AMOUNT`];
/// nodes that exist keep their text, even when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRateEntry {
    /// `TSuat` verbatim; used as the grouping key.
    pub rate_label: String,
    /// `ThTien`
    pub pre_tax_amount: String,
    /// `TThue`
    pub tax_amount: String,
}

/// `TToan`: per-invoice totals and rate breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBlock {
    /// `THTTLTSuat/LTSuat` entries in document order.
    pub rates: Vec<TaxRateEntry>,
    /// `TgTCThue`
    pub total_before_tax: String,
    /// `TgTThue`
    pub total_tax: String,
    /// `TgTTTBSo`
    pub total_after_tax: String,
    /// `TgTTTBChu`: amount in words.
    pub amount_in_words: String,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an `NLap` value as a local date.
///
/// Accepts plain ISO dates, ISO date-times (with or without offset) and the
/// `DD/MM/YYYY` / `YYYY/MM/DD` forms seen in older invoices.
pub fn parse_issue_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}
