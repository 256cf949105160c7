//! Row layouts of the Summary, per-file and consolidated Detail sheets.

use crate::core::format::{format_after_tax, with_currency};
use crate::core::{DetailColumns, Invoice, LineItem, Party, SummaryColumns, TaxBlock, format_amount};

use super::sheet::{CellRange, Sheet};

pub const SUMMARY_SHEET: &str = "Summary";
pub const DETAIL_SHEET: &str = "Detail";

/// Excel's limit on sheet-name length, in characters.
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN_SHEET_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

const SELLER_HEADERS: [&str; 3] = ["Tên Người Bán", "MST Người Bán", "Địa Chỉ Người Bán"];
const BUYER_HEADERS: [&str; 3] = ["Tên Người Mua", "MST Người Mua", "Địa Chỉ Người Mua"];

const ITEM_HEADERS: [&str; 8] = [
    "THHDVu (Tên hàng hóa/dịch vụ)",
    "DVTinh (Đơn vị tính)",
    "SLuong (Số lượng)",
    "DGia (Đơn giá)",
    "ThTien (Tiền trước thuế)",
    "TSuat (Thuế suất)",
    "TgTien (Tiền sau thuế)",
    "DVTTe (Đơn vị tiền tệ)",
];

pub(crate) const RATE_HEADERS: [&str; 3] = ["Thành tiền", "Thuế suất", "Tiền thuế"];

pub(crate) const TOTAL_LABELS: [&str; 3] = [
    "Tổng cộng (chưa thuế):",
    "Tổng tiền thuế:",
    "Tổng cộng (đã thuế):",
];

const AMOUNT_IN_WORDS_LABEL: &str = "Bằng chữ:";

/// Make a file stem usable as a sheet name.
///
/// Truncates to 31 characters, then replaces `: \ / ? * [ ]` and a leading or
/// trailing apostrophe with `_`. Different stems can map to the same name.
pub fn sanitize_sheet_name(stem: &str) -> String {
    let mut name: String = stem
        .chars()
        .take(MAX_SHEET_NAME)
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    if name.starts_with('\'') {
        name.replace_range(..1, "_");
    }
    if name.ends_with('\'') {
        let at = name.len() - 1;
        name.replace_range(at.., "_");
    }
    if name.is_empty() {
        name.push('_');
    }
    // Reserved by Excel.
    if name.eq_ignore_ascii_case("history") {
        name.replace_range(name.len() - 1.., "_");
    }
    name
}

fn party_headers(seller: bool, buyer: bool) -> Vec<&'static str> {
    let mut headers = Vec::with_capacity(6);
    if seller {
        headers.extend(SELLER_HEADERS);
    }
    if buyer {
        headers.extend(BUYER_HEADERS);
    }
    headers
}

fn party_cells(party: &Party) -> [&str; 3] {
    [
        party.name.as_str(),
        party.tax_id.as_str(),
        party.address.as_str(),
    ]
}

/// Write `values` from `col` onward and return the next free column.
fn write_row(sheet: &mut Sheet, row: u32, col: u16, values: &[&str]) -> u16 {
    for (offset, value) in values.iter().enumerate() {
        sheet.set_text(row, col + offset as u16, *value);
    }
    col + values.len() as u16
}

fn write_parties(sheet: &mut Sheet, row: u32, col: u16, invoice: &Invoice, seller: bool, buyer: bool) -> u16 {
    let mut col = col;
    if seller {
        col = write_row(sheet, row, col, &party_cells(&invoice.header.seller));
    }
    if buyer {
        col = write_row(sheet, row, col, &party_cells(&invoice.header.buyer));
    }
    col
}

/// Display values of a line item, in [`ITEM_HEADERS`] order.
pub fn item_cells(item: &LineItem) -> [String; 8] {
    [
        item.description.clone(),
        item.unit.clone(),
        format_amount(&item.quantity),
        with_currency(&item.unit_price, &item.currency),
        with_currency(&item.pre_tax_amount, &item.currency),
        format_amount(&item.tax_rate),
        format_after_tax(&item.pre_tax_amount, &item.tax_rate, &item.currency),
        item.currency.clone(),
    ]
}

fn write_item(sheet: &mut Sheet, row: u32, col: u16, item: &LineItem) -> u16 {
    let cells = item_cells(item);
    let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
    write_row(sheet, row, col, &refs)
}

// --- Summary sheet ---------------------------------------------------------

pub fn summary_headers(cols: &SummaryColumns) -> Vec<&'static str> {
    let mut headers = vec!["Tên Sheet", "Số Hóa Đơn", "Ngày Lập"];
    headers.extend(party_headers(cols.seller, cols.buyer));
    if cols.total_quantity {
        headers.push("Tổng Số Lượng");
    }
    if cols.total_before_tax {
        headers.push("Tổng Tiền");
    }
    if cols.tax_amount {
        headers.push("Tiền Thuế");
    }
    if cols.total_after_tax {
        headers.push("Thành Tiền");
    }
    if cols.currency {
        headers.push("Đơn Vị Tiền Tệ");
    }
    headers
}

pub fn write_summary_header(sheet: &mut Sheet, cols: &SummaryColumns) {
    sheet.header_row(0, 0, &summary_headers(cols));
}

/// One Summary row; the first cell links to `target_sheet`.
pub fn write_summary_row(
    sheet: &mut Sheet,
    row: u32,
    cols: &SummaryColumns,
    invoice: &Invoice,
    target_sheet: &str,
) {
    sheet.set_text(row, 0, target_sheet).link_to(target_sheet);
    let header = &invoice.header;
    let mut col = write_row(sheet, row, 1, &[header.number.as_str(), header.issue_date.as_str()]);
    col = write_parties(sheet, row, col, invoice, cols.seller, cols.buyer);

    if cols.total_quantity {
        sheet.set_number(row, col, invoice.numbered_item_count as f64);
        col += 1;
    }
    let [before_tax, tax, after_tax] = declared_totals(invoice);
    if cols.total_before_tax {
        sheet.set_text(row, col, before_tax);
        col += 1;
    }
    if cols.tax_amount {
        sheet.set_text(row, col, tax);
        col += 1;
    }
    if cols.total_after_tax {
        sheet.set_text(row, col, after_tax);
        col += 1;
    }
    if cols.currency {
        sheet.set_text(row, col, header.currency.as_str());
    }
}

/// Formatted `TToan` totals; blank when the invoice has no totals block.
fn declared_totals(invoice: &Invoice) -> [String; 3] {
    match &invoice.tax_block {
        Some(t) => [
            format_amount(&t.total_before_tax),
            format_amount(&t.total_tax),
            format_amount(&t.total_after_tax),
        ],
        None => Default::default(),
    }
}

// --- Per-file sheet --------------------------------------------------------

pub fn invoice_sheet_headers(cols: &DetailColumns) -> Vec<&'static str> {
    let mut headers = vec!["STT"];
    headers.extend(ITEM_HEADERS);
    headers.extend(party_headers(cols.seller, cols.buyer));
    headers
}

/// Fill a per-file sheet: item table, then the tax table two rows below it.
pub fn write_invoice_sheet(sheet: &mut Sheet, invoice: &Invoice, cols: &DetailColumns) {
    sheet.header_row(0, 0, &invoice_sheet_headers(cols));

    let mut row = 1;
    for item in &invoice.items {
        sheet.set_text(row, 0, item.sequence.as_str());
        let col = write_item(sheet, row, 1, item);
        write_parties(sheet, row, col, invoice, cols.seller, cols.buyer);
        row += 1;
    }

    if let Some(block) = &invoice.tax_block {
        write_tax_table(sheet, row + 2, block);
    }
}

fn write_tax_table(sheet: &mut Sheet, start_row: u32, block: &TaxBlock) {
    sheet.header_row(start_row, 0, &RATE_HEADERS);

    let mut row = start_row + 1;
    for entry in &block.rates {
        sheet.set_text(row, 0, format_amount(&entry.pre_tax_amount));
        sheet.set_text(row, 1, entry.rate_label.as_str());
        sheet.set_text(row, 2, format_amount(&entry.tax_amount));
        row += 1;
    }

    let totals = [
        (TOTAL_LABELS[0], format_amount(&block.total_before_tax)),
        (TOTAL_LABELS[1], format_amount(&block.total_tax)),
        (TOTAL_LABELS[2], format_amount(&block.total_after_tax)),
        (AMOUNT_IN_WORDS_LABEL, block.amount_in_words.clone()),
    ];
    for (offset, (label, value)) in totals.into_iter().enumerate() {
        let r = row + 1 + offset as u32;
        sheet.set_text(r, 0, label).bold();
        sheet.set_text(r, 1, value);
    }
}

// --- Consolidated Detail sheet --------------------------------------------

pub fn detail_headers(cols: &DetailColumns) -> Vec<&'static str> {
    let mut headers = vec!["Số Hóa Đơn", "Ngày Lập", "STT"];
    headers.extend(party_headers(cols.seller, cols.buyer));
    headers.extend(ITEM_HEADERS);
    headers
}

pub fn write_detail_header(sheet: &mut Sheet, cols: &DetailColumns) {
    sheet.header_row(0, 0, &detail_headers(cols));
}

/// Write one invoice's row group starting at `start_row` and return the next
/// free row. Only the first row links to `target_sheet`; with more than one
/// item the invoice-level columns are merged down the group.
pub fn write_detail_group(
    sheet: &mut Sheet,
    start_row: u32,
    invoice: &Invoice,
    target_sheet: &str,
    cols: &DetailColumns,
) -> u32 {
    let header = &invoice.header;
    let mut row = start_row;
    for item in &invoice.items {
        let number = sheet.set_text(row, 0, header.number.as_str());
        if row == start_row {
            number.link_to(target_sheet);
        }
        sheet.set_text(row, 1, header.issue_date.as_str());
        sheet.set_text(row, 2, item.sequence.as_str());
        let col = write_parties(sheet, row, 3, invoice, cols.seller, cols.buyer);
        write_item(sheet, row, col, item);
        row += 1;
    }

    let count = invoice.items.len() as u32;
    if count > 1 {
        for col in merged_columns(cols) {
            sheet.merge(CellRange::column(col, start_row, count));
        }
    }
    row
}

/// Columns merged down a multi-item group: invoice number, issue date and
/// whichever party columns are shown.
fn merged_columns(cols: &DetailColumns) -> Vec<u16> {
    let party_width = match (cols.seller, cols.buyer) {
        (true, true) => 6,
        (true, false) | (false, true) => 3,
        (false, false) => 0,
    };
    [0, 1].into_iter().chain(3..3 + party_width).collect()
}
