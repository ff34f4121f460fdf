//! Display formatting for tiles and table cells.

use serde_json::Value;

/// Shown in place of a number that cannot be displayed.
pub const SENTINEL: &str = "—";

/// `$1,234,567`; negative values render as `-$1,234`.
pub fn format_currency_rounded(x: f64) -> String {
    if !x.is_finite() {
        return SENTINEL.to_string();
    }
    let rounded = format!("{:.0}", x.round());
    let (negative, digits) = split_sign(&rounded);
    format!("{}${}", sign(negative), group_thousands(digits))
}

/// `$1,234.50`
pub fn format_currency_cents(x: f64) -> String {
    if !x.is_finite() {
        return SENTINEL.to_string();
    }
    let cents = format!("{x:.2}");
    let (negative, fixed) = split_sign(&cents);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed, "00"));
    format!(
        "{}${}.{}",
        sign(negative),
        group_thousands(int_part),
        frac_part
    )
}

/// `1,234,567` (rounded, no currency sign).
pub fn format_grouped_integer(x: f64) -> String {
    if !x.is_finite() {
        return SENTINEL.to_string();
    }
    let rounded = format!("{:.0}", x.round());
    let (negative, digits) = split_sign(&rounded);
    format!("{}{}", sign(negative), group_thousands(digits))
}

/// Text for one table cell, shown as sent. Numbers are not regrouped: a column may hold
/// years or ranks as well as amounts.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Strips a leading '-', treating "-0", "-0.00" and friends as non-negative.
fn split_sign(s: &str) -> (bool, &str) {
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().any(|c| c.is_ascii_digit() && c != '0') => (true, rest),
        Some(rest) => (false, rest),
        None => (false, s),
    }
}

fn sign(negative: bool) -> &'static str {
    if negative {
        "-"
    } else {
        ""
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
