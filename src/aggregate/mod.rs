//! Multi-currency tax aggregation across a batch of invoices.
//!
//! Two independent sums are kept per currency: one bucket per tax-rate label
//! (from the `LTSuat` entries) and a grand total (from the invoice's declared
//! `TToan` totals). They are never reconciled against each other.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::format::parse_rate;
use crate::core::{Invoice, TaxBlock, parse_decimal};

/// Accumulated amounts of one (currency, rate label) bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RateTotals {
    pub pre_tax: Decimal,
    pub tax: Decimal,
}

/// Accumulated document-level totals of one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrandTotals {
    pub before_tax: Decimal,
    pub tax: Decimal,
    pub after_tax: Decimal,
}

/// One currency's rendered block: rate buckets in label order, then totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencySection<'a> {
    pub currency: &'a str,
    pub rates: Vec<(&'a str, RateTotals)>,
    pub totals: GrandTotals,
}

/// Batch-wide accumulator keyed by currency code.
///
/// Call [`accumulate`](Self::accumulate) exactly once per invoice; there is
/// no de-duplication.
#[derive(Debug, Clone, Default)]
pub struct CurrencyAggregator {
    buckets: BTreeMap<String, BTreeMap<String, RateTotals>>,
    grand: BTreeMap<String, GrandTotals>,
}

/// Labels are grouping keys as written; "10%" and "10.0%" stay separate
/// buckets. A new label that reads as an already seen rate is logged.
fn warn_on_rate_variant(buckets: &BTreeMap<String, RateTotals>, currency: &str, label: &str) {
    let Some(rate) = parse_rate(label) else {
        return;
    };
    if let Some(existing) = buckets
        .keys()
        .find(|k| parse_rate(k).is_some_and(|r| r == rate))
    {
        tracing::warn!(currency, label, existing = %existing, "rate label variant kept as a separate bucket");
    }
}

impl CurrencyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one invoice's totals block under `currency`.
    ///
    /// The currency is registered even when `block` is `None`.
    pub fn accumulate(&mut self, currency: &str, block: Option<&TaxBlock>) {
        let buckets = self.buckets.entry(currency.to_string()).or_default();
        let grand = self.grand.entry(currency.to_string()).or_default();
        let Some(block) = block else {
            return;
        };

        // Each total contributes on its own; an unparseable one adds nothing.
        if let Some(v) = parse_decimal(&block.total_before_tax) {
            grand.before_tax += v;
        }
        if let Some(v) = parse_decimal(&block.total_tax) {
            grand.tax += v;
        }
        if let Some(v) = parse_decimal(&block.total_after_tax) {
            grand.after_tax += v;
        }

        for entry in &block.rates {
            // Absent nodes were defaulted at extraction; text that is present
            // but not a number drops the whole entry.
            let (Some(pre_tax), Some(tax)) = (
                parse_decimal(&entry.pre_tax_amount),
                parse_decimal(&entry.tax_amount),
            ) else {
                tracing::debug!(currency, rate = %entry.rate_label, "skipping rate entry without numeric amounts");
                continue;
            };
            let label = entry.rate_label.as_str();
            if !buckets.contains_key(label) {
                warn_on_rate_variant(buckets, currency, label);
            }
            let bucket = buckets.entry(label.to_string()).or_default();
            bucket.pre_tax += pre_tax;
            bucket.tax += tax;
        }
    }

    pub fn accumulate_invoice(&mut self, invoice: &Invoice) {
        self.accumulate(&invoice.header.currency, invoice.tax_block.as_ref());
    }

    pub fn bucket(&self, currency: &str, rate_label: &str) -> Option<RateTotals> {
        self.buckets.get(currency)?.get(rate_label).copied()
    }

    pub fn grand_total(&self, currency: &str) -> Option<GrandTotals> {
        self.grand.get(currency).copied()
    }

    /// Currency codes in lexicographic order.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Per-currency sections, currencies and rate labels both sorted.
    pub fn sections(&self) -> Vec<CurrencySection<'_>> {
        self.buckets
            .iter()
            .map(|(currency, rates)| CurrencySection {
                currency,
                rates: rates.iter().map(|(label, t)| (label.as_str(), *t)).collect(),
                totals: self.grand.get(currency).copied().unwrap_or_default(),
            })
            .collect()
    }
}
