#![cfg(feature = "report")]

use hoadon::aggregate::CurrencyAggregator;
use hoadon::core::*;
use hoadon::report::*;

fn item(seq: &str, desc: &str, qty: &str, price: &str, amount: &str, rate: &str, currency: &str) -> LineItem {
    LineItem {
        sequence: seq.into(),
        description: desc.into(),
        unit: "Cái".into(),
        quantity: qty.into(),
        unit_price: price.into(),
        pre_tax_amount: amount.into(),
        tax_rate: rate.into(),
        currency: currency.into(),
    }
}

fn totals(rate: &str, pre_tax: &str, tax: &str, before: &str, after: &str, words: &str) -> TaxBlock {
    TaxBlock {
        rates: vec![TaxRateEntry {
            rate_label: rate.into(),
            pre_tax_amount: pre_tax.into(),
            tax_amount: tax.into(),
        }],
        total_before_tax: before.into(),
        total_tax: tax.into(),
        total_after_tax: after.into(),
        amount_in_words: words.into(),
    }
}

fn invoice(number: &str, date: &str, currency: &str, items: Vec<LineItem>, block: Option<TaxBlock>) -> Invoice {
    Invoice {
        header: InvoiceHeader {
            number: number.into(),
            issue_date: date.into(),
            currency: currency.into(),
            seller: Party {
                name: "Công ty TNHH Hoa Sen".into(),
                tax_id: "0301234567".into(),
                address: "12 Lê Lợi, TP. Hồ Chí Minh".into(),
            },
            buyer: Party {
                name: "Công ty Cổ phần Minh Long".into(),
                tax_id: "0109876543".into(),
                address: "45 Trần Hưng Đạo, Hà Nội".into(),
            },
        },
        numbered_item_count: items.len(),
        items,
        tax_block: block,
    }
}

fn vnd_invoice() -> Invoice {
    invoice(
        "0000123",
        "2024-03-15",
        "VND",
        vec![
            item("1", "Bút bi", "10", "100000", "1000000", "10%", "VND"),
            item("2", "Giấy A4", "4", "500000", "2000000", "10%", "VND"),
        ],
        Some(totals("10%", "3000000", "300000", "3000000", "3300000", "Ba triệu ba trăm nghìn đồng")),
    )
}

fn usd_invoice() -> Invoice {
    invoice(
        "0000456",
        "2024-03-16",
        "USD",
        vec![item("1", "Consulting", "1", "99.99", "99.99", "8%", "USD")],
        Some(totals("8%", "99.99", "8", "99.99", "107.99", "")),
    )
}

fn no_party_columns() -> ExportConfig {
    ExportConfigBuilder::new()
        .summary_seller(false)
        .summary_buyer(false)
        .detail_seller(false)
        .detail_buyer(false)
        .build()
}

fn build_two() -> Workbook {
    let mut builder = ReportBuilder::new(no_party_columns());
    builder.add_invoice("hd_a", &vnd_invoice());
    builder.add_invoice("hd_b", &usd_invoice());
    builder.finish()
}

#[test]
fn sheets_are_ordered_summary_detail_then_files() {
    let book = build_two();
    let names: Vec<&str> = book.sheets().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec![SUMMARY_SHEET, DETAIL_SHEET, "hd_a", "hd_b"]);
}

#[test]
fn summary_sheet_layout() {
    let book = build_two();
    let summary = book.sheet(SUMMARY_SHEET).unwrap();
    insta::assert_snapshot!(summary.dump(), @r"
    Tên Sheet | Số Hóa Đơn | Ngày Lập | Tổng Số Lượng | Tổng Tiền | Tiền Thuế | Thành Tiền | Đơn Vị Tiền Tệ
    hd_a | 0000123 | 2024-03-15 | 2 | 3,000,000 | 300,000 | 3,300,000 | VND
    hd_b | 0000456 | 2024-03-16 | 1 | 99.99 | 8 | 107.99 | USD
    ");

    assert_eq!(summary.cell(1, 0).unwrap().link.as_deref(), Some("hd_a"));
    assert_eq!(summary.cell(2, 0).unwrap().link.as_deref(), Some("hd_b"));
    assert_eq!(summary.cell(1, 3).unwrap().value, CellValue::Number(2.0));
    assert!(summary.cell(0, 0).unwrap().style.bold);
}

#[test]
fn per_file_sheet_layout() {
    let book = build_two();
    let sheet = book.sheet("hd_a").unwrap();
    insta::assert_snapshot!(sheet.dump(), @r"
    STT | THHDVu (Tên hàng hóa/dịch vụ) | DVTinh (Đơn vị tính) | SLuong (Số lượng) | DGia (Đơn giá) | ThTien (Tiền trước thuế) | TSuat (Thuế suất) | TgTien (Tiền sau thuế) | DVTTe (Đơn vị tiền tệ)
    1 | Bút bi | Cái | 10 | 100,000 VND | 1,000,000 VND | 10% | 1,100,000 VND | VND
    2 | Giấy A4 | Cái | 4 | 500,000 VND | 2,000,000 VND | 10% | 2,200,000 VND | VND


    Thành tiền | Thuế suất | Tiền thuế
    3,000,000 | 10% | 300,000

    Tổng cộng (chưa thuế): | 3,000,000
    Tổng tiền thuế: | 300,000
    Tổng cộng (đã thuế): | 3,300,000
    Bằng chữ: | Ba triệu ba trăm nghìn đồng
    ");
}

#[test]
fn per_file_sheet_without_totals_block_has_items_only() {
    let mut inv = vnd_invoice();
    inv.tax_block = None;
    let mut builder = ReportBuilder::new(no_party_columns());
    builder.add_invoice("plain", &inv);
    let book = builder.finish();
    assert_eq!(book.sheet("plain").unwrap().last_row(), Some(2));
    // Summary totals stay blank without a TToan block.
    assert_eq!(book.sheet(SUMMARY_SHEET).unwrap().text(1, 4), "");
}

#[test]
fn party_columns_follow_configuration() {
    let config = ExportConfigBuilder::new().detail_seller(false).build();
    let mut builder = ReportBuilder::new(config);
    builder.add_invoice("hd_a", &vnd_invoice());
    let book = builder.finish();

    let sheet = book.sheet("hd_a").unwrap();
    assert_eq!(sheet.text(0, 9), "Tên Người Mua");
    assert_eq!(sheet.text(1, 9), "Công ty Cổ phần Minh Long");
    assert_eq!(sheet.text(1, 11), "45 Trần Hưng Đạo, Hà Nội");

    let summary = book.sheet(SUMMARY_SHEET).unwrap();
    assert_eq!(summary.text(0, 3), "Tên Người Bán");
    assert_eq!(summary.text(1, 3), "Công ty TNHH Hoa Sen");
    assert_eq!(summary.text(0, 6), "Tên Người Mua");
}

#[test]
fn consolidated_detail_merges_multi_item_groups() {
    let book = build_two();
    let detail = book.sheet(DETAIL_SHEET).unwrap();

    assert_eq!(detail.text(1, 0), "0000123");
    assert_eq!(detail.text(2, 0), "0000123");
    assert_eq!(detail.cell(1, 0).unwrap().link.as_deref(), Some("hd_a"));
    assert_eq!(detail.cell(2, 0).unwrap().link, None);
    assert_eq!(
        detail.merges(),
        &[CellRange::new(1, 0, 2, 0), CellRange::new(1, 1, 2, 1)]
    );
    assert!(detail.cell(1, 0).unwrap().style.v_center);

    // Single-item group: linked, never merged.
    assert_eq!(detail.cell(3, 0).unwrap().link.as_deref(), Some("hd_b"));
    assert_eq!(detail.text(3, 9), "107.989 USD");
    assert!(!detail.is_merged_away(3, 0));
}

#[test]
fn merged_columns_include_shown_party_columns() {
    let mut builder = ReportBuilder::new(ExportConfig::default());
    builder.add_invoice("hd_a", &vnd_invoice());
    let book = builder.finish();
    let detail = book.sheet(DETAIL_SHEET).unwrap();

    let cols: Vec<u16> = detail.merges().iter().map(|m| m.first_col).collect();
    assert_eq!(cols, vec![0, 1, 3, 4, 5, 6, 7, 8]);
    assert!(detail.is_merged_away(2, 8));
    assert!(!detail.is_merged_away(2, 2));
}

#[test]
fn currency_summary_follows_detail_rows() {
    let book = build_two();
    let detail = book.sheet(DETAIL_SHEET).unwrap();

    // Last data row is 3; the title sits two rows below it.
    assert_eq!(detail.text(4, 0), "");
    assert_eq!(detail.text(5, 0), "TỔNG KẾT THEO TỪNG LOẠI TIỀN TỆ");
    assert_eq!(detail.cell(5, 0).unwrap().style.font_size, Some(14.0));
    assert_eq!(detail.text(7, 0), "TIỀN TỆ: USD");
    assert_eq!(detail.text(15, 0), "TIỀN TỆ: VND");
    assert_eq!(detail.last_row(), Some(21));
    assert!(detail.cell(21, 3).unwrap().style.border);
    assert!(detail.cell(5, 0).unwrap().style.border);
}

#[test]
fn currency_summary_layout() {
    let mut agg = CurrencyAggregator::new();
    agg.accumulate_invoice(&vnd_invoice());
    agg.accumulate_invoice(&usd_invoice());
    agg.accumulate_invoice(&vnd_invoice());

    let mut sheet = Sheet::new("scratch");
    let next = agg.render(&mut sheet, 0);
    assert_eq!(next, 18);
    insta::assert_snapshot!(sheet.dump(), @r"
    TỔNG KẾT THEO TỪNG LOẠI TIỀN TỆ

    TIỀN TỆ: USD
    Thành tiền | Thuế suất | Tiền thuế | Đơn vị tiền tệ
    99.99 | 8% | 8 | USD

    Tổng cộng (chưa thuế): | 99.99 | USD
    Tổng tiền thuế: | 8 | USD
    Tổng cộng (đã thuế): | 107.99 | USD

    TIỀN TỆ: VND
    Thành tiền | Thuế suất | Tiền thuế | Đơn vị tiền tệ
    6,000,000 | 10% | 600,000 | VND

    Tổng cộng (chưa thuế): | 6,000,000 | VND
    Tổng tiền thuế: | 600,000 | VND
    Tổng cộng (đã thuế): | 6,600,000 | VND
    ");
}

#[test]
fn disabled_consolidated_detail_skips_sheet() {
    let config = ExportConfigBuilder::new().consolidated_detail(false).build();
    let mut builder = ReportBuilder::new(config);
    builder.add_invoice("hd_a", &vnd_invoice());
    let book = builder.finish();
    let names: Vec<&str> = book.sheets().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec![SUMMARY_SHEET, "hd_a"]);
}

#[test]
fn colliding_sheet_names_link_to_existing_sheet() {
    let mut builder = ReportBuilder::new(no_party_columns());
    assert_eq!(builder.add_invoice("HD_A", &vnd_invoice()), "HD_A");
    assert_eq!(builder.add_invoice("hd_a", &usd_invoice()), "HD_A");
    let long = "x".repeat(40);
    assert_eq!(builder.add_invoice(&long, &usd_invoice()), "x".repeat(31));
    assert_eq!(builder.add_invoice(&format!("{long}y"), &usd_invoice()), "x".repeat(31));
    assert_eq!(builder.rows(), 4);

    let book = builder.finish();
    assert_eq!(book.len(), 4);
    let summary = book.sheet(SUMMARY_SHEET).unwrap();
    assert_eq!(summary.cell(2, 0).unwrap().link.as_deref(), Some("HD_A"));
    assert_eq!(summary.text(2, 1), "0000456");
}

#[test]
fn internal_links_quote_sheet_names() {
    assert_eq!(internal_link("hd_a"), "internal:'hd_a'!A1");
    assert_eq!(internal_link("O'Brien"), "internal:'O''Brien'!A1");
}
