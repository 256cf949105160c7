//! Culture-invariant number formatting for report cells.
//!
//! Every monetary or quantity value written to a sheet goes through
//! [`format_amount`] (or [`format_decimal`] for values already parsed).

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

const MAX_FRACTION_DIGITS: u32 = 3;

/// Parse a decimal using invariant conventions: `.` as decimal point, `,` as
/// optional group separator, surrounding whitespace ignored.
///
/// Only an optional sign, digits, group separators before the point and one
/// decimal point are accepted; `1_000`, exponents and the like do not parse.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if !is_invariant_number(trimmed) {
        return None;
    }
    if trimmed.contains(',') {
        Decimal::from_str(&trimmed.replace(',', "")).ok()
    } else {
        Decimal::from_str(trimmed).ok()
    }
}

fn is_invariant_number(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut digits = false;
    let mut point = false;
    for ch in body.chars() {
        match ch {
            '0'..='9' => digits = true,
            ',' if !point => {}
            '.' if !point => point = true,
            _ => return false,
        }
    }
    digits
}

/// Parse a rate label such as `"10%"` into its percentage value.
pub fn parse_rate(label: &str) -> Option<Decimal> {
    parse_decimal(&label.replace('%', ""))
}

/// Format with thousands separators: whole values without decimals, others
/// with up to three fraction digits and trailing zeros trimmed.
pub fn format_decimal(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(MAX_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = if rounded.is_zero() {
        "0".to_string()
    } else {
        rounded.to_string()
    };

    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3);
    out.push_str(sign);
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a raw cell value. Input that does not parse as a number is
/// returned unchanged.
pub fn format_amount(raw: &str) -> String {
    match parse_decimal(raw) {
        Some(d) => format_decimal(d),
        None => raw.to_string(),
    }
}

/// `"<formatted amount> <currency>"`, or `""` when the amount is absent.
pub fn with_currency(raw: &str, currency: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    format!("{} {currency}", format_amount(raw))
}

/// Derived after-tax text for a line item, `""` unless both the pre-tax
/// amount and the rate parse.
pub fn format_after_tax(pre_tax: &str, rate: &str, currency: &str) -> String {
    if pre_tax.is_empty() || rate.is_empty() {
        return String::new();
    }
    let (Some(base), Some(pct)) = (parse_decimal(pre_tax), parse_rate(rate)) else {
        return String::new();
    };
    let after = pct
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|r| base.checked_mul(r))
        .and_then(|tax| base.checked_add(tax));
    match after {
        Some(total) => format!("{} {currency}", format_decimal(total)),
        None => String::new(),
    }
}
