use hoadon::aggregate::{CurrencyAggregator, GrandTotals, RateTotals};
use hoadon::core::*;
use hoadon::extract::extract_invoice;
use hoadon::xml::Document;
use rust_decimal_macros::dec;

fn entry(label: &str, pre_tax: &str, tax: &str) -> TaxRateEntry {
    TaxRateEntry {
        rate_label: label.into(),
        pre_tax_amount: pre_tax.into(),
        tax_amount: tax.into(),
    }
}

fn block(rates: Vec<TaxRateEntry>, before: &str, tax: &str, after: &str) -> TaxBlock {
    TaxBlock {
        rates,
        total_before_tax: before.into(),
        total_tax: tax.into(),
        total_after_tax: after.into(),
        amount_in_words: String::new(),
    }
}

#[test]
fn same_currency_and_rate_sum_across_invoices() {
    let mut agg = CurrencyAggregator::new();
    let a = block(vec![entry("10%", "1000000", "100000")], "1000000", "100000", "1100000");
    let b = block(vec![entry("10%", "2,500,000", "250000")], "2500000", "250000", "2750000");
    agg.accumulate("VND", Some(&a));
    agg.accumulate("VND", Some(&b));

    assert_eq!(
        agg.bucket("VND", "10%"),
        Some(RateTotals {
            pre_tax: dec!(3500000),
            tax: dec!(350000),
        })
    );
    assert_eq!(
        agg.grand_total("VND"),
        Some(GrandTotals {
            before_tax: dec!(3500000),
            tax: dec!(350000),
            after_tax: dec!(3850000),
        })
    );
}

#[test]
fn buckets_and_grand_totals_are_independent() {
    // The declared totals disagree with the rate entries; both sums are kept as-is.
    let mut agg = CurrencyAggregator::new();
    let inconsistent = block(vec![entry("8%", "100", "8")], "999", "1", "1000");
    agg.accumulate("USD", Some(&inconsistent));
    agg.accumulate("USD", Some(&inconsistent));

    assert_eq!(agg.bucket("USD", "8%").unwrap().pre_tax, dec!(200));
    assert_eq!(agg.grand_total("USD").unwrap().before_tax, dec!(1998));
}

#[test]
fn currencies_are_kept_apart() {
    let mut agg = CurrencyAggregator::new();
    agg.accumulate("VND", Some(&block(vec![entry("10%", "100", "10")], "100", "10", "110")));
    agg.accumulate("USD", Some(&block(vec![entry("10%", "5", "0.5")], "5", "0.5", "5.5")));

    assert_eq!(agg.currencies().collect::<Vec<_>>(), vec!["USD", "VND"]);
    assert_eq!(agg.bucket("USD", "10%").unwrap().tax, dec!(0.5));
    assert_eq!(agg.bucket("VND", "10%").unwrap().tax, dec!(10));
}

fn invoice_with_rates(currency: &str, rates: &str) -> Invoice {
    let xml = format!(
        "<HDon><TTChung><DVTTe>{currency}</DVTTe></TTChung>\
         <TToan><THTTLTSuat>{rates}</THTTLTSuat></TToan></HDon>"
    );
    extract_invoice(&Document::parse(&xml).unwrap())
}

#[test]
fn missing_rate_label_counts_as_zero_percent() {
    let mut agg = CurrencyAggregator::new();
    agg.accumulate_invoice(&invoice_with_rates(
        "VND",
        "<LTSuat><ThTien>500</ThTien><TThue>0</TThue></LTSuat>",
    ));
    assert_eq!(DEFAULT_RATE_LABEL, "0%");
    assert_eq!(agg.bucket("VND", "0%").unwrap().pre_tax, dec!(500));
}

#[test]
fn empty_rate_label_stays_its_own_bucket() {
    let mut agg = CurrencyAggregator::new();
    agg.accumulate_invoice(&invoice_with_rates(
        "VND",
        "<LTSuat><TSuat/><ThTien>500</ThTien><TThue>0</TThue></LTSuat>",
    ));
    assert_eq!(agg.bucket("VND", "0%"), None);
    assert_eq!(agg.bucket("VND", "").unwrap().pre_tax, dec!(500));
}

#[test]
fn missing_amount_node_contributes_zero() {
    let mut agg = CurrencyAggregator::new();
    agg.accumulate_invoice(&invoice_with_rates(
        "VND",
        "<LTSuat><TSuat>10%</TSuat><TThue>100</TThue></LTSuat>\
         <LTSuat><TSuat>5%</TSuat><ThTien>200</ThTien></LTSuat>",
    ));
    assert_eq!(
        agg.bucket("VND", "10%"),
        Some(RateTotals {
            pre_tax: dec!(0),
            tax: dec!(100),
        })
    );
    assert_eq!(
        agg.bucket("VND", "5%"),
        Some(RateTotals {
            pre_tax: dec!(200),
            tax: dec!(0),
        })
    );
}

#[test]
fn entries_need_both_amounts_to_parse() {
    let mut agg = CurrencyAggregator::new();
    // Nodes present but empty or non-numeric.
    let rates = vec![
        entry("10%", "100", ""),
        entry("10%", "abc", "10"),
        entry("5%", "200", "10"),
    ];
    agg.accumulate("VND", Some(&block(rates, "", "x", "210")));

    assert_eq!(agg.bucket("VND", "10%"), None);
    assert_eq!(agg.bucket("VND", "5%").unwrap().pre_tax, dec!(200));
    // Each grand-total field parses on its own.
    let grand = agg.grand_total("VND").unwrap();
    assert_eq!(grand.before_tax, dec!(0));
    assert_eq!(grand.tax, dec!(0));
    assert_eq!(grand.after_tax, dec!(210));
}

#[test]
fn currency_without_totals_block_is_registered() {
    let mut agg = CurrencyAggregator::new();
    assert!(agg.is_empty());
    let invoice = Invoice {
        header: InvoiceHeader {
            currency: "EUR".into(),
            ..InvoiceHeader::default()
        },
        ..Invoice::default()
    };
    agg.accumulate_invoice(&invoice);

    assert!(!agg.is_empty());
    assert_eq!(agg.grand_total("EUR"), Some(GrandTotals::default()));
    let sections = agg.sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].currency, "EUR");
    assert!(sections[0].rates.is_empty());
}

#[test]
fn sections_sort_rate_labels() {
    let mut agg = CurrencyAggregator::new();
    let rates = vec![
        entry("8%", "100", "8"),
        entry("10%", "100", "10"),
        entry("KCT", "50", "0"),
    ];
    agg.accumulate("VND", Some(&block(rates, "250", "18", "268")));

    let sections = agg.sections();
    let labels: Vec<&str> = sections[0].rates.iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, vec!["10%", "8%", "KCT"]);
}

#[test]
fn rate_label_variants_are_not_merged() {
    let mut agg = CurrencyAggregator::new();
    agg.accumulate("VND", Some(&block(vec![entry("10%", "100", "10")], "100", "10", "110")));
    agg.accumulate("VND", Some(&block(vec![entry("10.0%", "200", "20")], "200", "20", "220")));

    assert_eq!(agg.bucket("VND", "10%").unwrap().pre_tax, dec!(100));
    assert_eq!(agg.bucket("VND", "10.0%").unwrap().pre_tax, dec!(200));
}
