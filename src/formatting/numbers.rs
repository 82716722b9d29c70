//! Value-to-string transforms for summaries.
//!
//! A zero or non-finite denominator is an ordinary input here: shares of an
//! empty total render as `0%`, never `NaN%` or `inf%`.

use crate::aggregate::MetricValue;
use crate::pivot::PivotCell;

const MAX_PERCENT_DECIMALS: usize = 2;

/// `part / whole` as a percentage with `decimals` places (at most two).
pub fn percent(part: f64, whole: f64, decimals: usize) -> String {
    if whole == 0.0 || !whole.is_finite() || !part.is_finite() {
        return "0%".to_string();
    }
    format_percentage(part / whole * 100.0, decimals)
}

/// Render a value that is already a percentage.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    let decimals = decimals.min(MAX_PERCENT_DECIMALS);
    format!("{value:.decimals$}%")
}

/// Whole-unit amount with thousands separators: `1234567.6` → `1,234,568`.
pub fn format_currency(amount: f64) -> String {
    format_currency_with_symbol(amount, "")
}

/// Like [`format_currency`] with a leading symbol placed after the sign.
pub fn format_currency_with_symbol(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return "n/a".to_string();
    }
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    format!("{sign}{symbol}{}", group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_paired(a: u64, b: u64) -> String {
    PivotCell::new(a, b).to_string()
}

/// Metric value for a table cell; "no data" stays visibly distinct from zero.
pub fn format_metric(value: MetricValue) -> String {
    value.to_string()
}
