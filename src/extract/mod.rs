//! Per-invoice extraction: document tree to typed [`Invoice`].

use std::path::Path;

use crate::core::{
    ABSENT_AMOUNT, DEFAULT_RATE_LABEL, Invoice, InvoiceError, InvoiceHeader, LineItem, Party,
    TaxBlock, TaxRateEntry,
};
use crate::xml::{
    Document, Element, HeaderField, ItemField, LINE_ITEM, LINE_ITEM_SEQUENCE, RATE_ENTRY,
    RateField, TAX_BLOCK, TotalsField,
};

/// Load, sanitize and extract one invoice file.
pub fn read_invoice(path: &Path) -> Result<Invoice, InvoiceError> {
    let doc = Document::load(path)?;
    Ok(extract_invoice(&doc))
}

/// Extract header, line items (document order) and the totals block.
///
/// Missing nodes become empty strings, except inside `LTSuat` entries where
/// an absent rate reads as `"0%"` and an absent amount as `"0"`. Nothing
/// here fails.
pub fn extract_invoice(doc: &Document) -> Invoice {
    let header = extract_header(doc);
    let items = doc
        .select_all(LINE_ITEM)
        .iter()
        .map(|node| extract_line_item(node, &header.currency))
        .collect();
    let tax_block = doc.select_first(TAX_BLOCK).map(|node| extract_tax_block(&node));

    Invoice {
        numbered_item_count: doc.count(LINE_ITEM_SEQUENCE),
        header,
        items,
        tax_block,
    }
}

pub fn extract_header(doc: &Document) -> InvoiceHeader {
    InvoiceHeader {
        number: doc.field(HeaderField::InvoiceNumber),
        issue_date: doc.field(HeaderField::IssueDate),
        currency: doc.field(HeaderField::Currency),
        seller: Party {
            name: doc.field(HeaderField::SellerName),
            tax_id: doc.field(HeaderField::SellerTaxId),
            address: doc.field(HeaderField::SellerAddress),
        },
        buyer: Party {
            name: doc.field(HeaderField::BuyerName),
            tax_id: doc.field(HeaderField::BuyerTaxId),
            address: doc.field(HeaderField::BuyerAddress),
        },
    }
}

fn extract_line_item(node: &Element<'_>, currency: &str) -> LineItem {
    LineItem {
        sequence: node.field(ItemField::Sequence),
        description: node.field(ItemField::Description),
        unit: node.field(ItemField::Unit),
        quantity: node.field(ItemField::Quantity),
        unit_price: node.field(ItemField::UnitPrice),
        pre_tax_amount: node.field(ItemField::PreTaxAmount),
        tax_rate: node.field(ItemField::TaxRate),
        currency: currency.to_string(),
    }
}

fn extract_tax_block(node: &Element<'_>) -> TaxBlock {
    let rates = node
        .select_all(RATE_ENTRY)
        .iter()
        .map(|entry| TaxRateEntry {
            rate_label: entry.field_or(RateField::Label, DEFAULT_RATE_LABEL),
            pre_tax_amount: entry.field_or(RateField::PreTax, ABSENT_AMOUNT),
            tax_amount: entry.field_or(RateField::Tax, ABSENT_AMOUNT),
        })
        .collect();

    TaxBlock {
        rates,
        total_before_tax: node.field(TotalsField::BeforeTax),
        total_tax: node.field(TotalsField::Tax),
        total_after_tax: node.field(TotalsField::AfterTax),
        amount_in_words: node.field(TotalsField::AmountInWords),
    }
}
