//! Normalization from adapter output to canonical [`pricewatch_core::Product`].
//!
//! Malformed records are dropped with a debug note, never turned into an
//! error: one bad listing must not fail the batch.

use pricewatch_core::{Product, RawPrice, RawProduct};

/// Normalizes a batch, keeping input order and dropping invalid records.
#[must_use]
pub fn normalize_products(raw: Vec<RawProduct>) -> Vec<Product> {
    raw.into_iter().filter_map(normalize_product).collect()
}

/// Converts one raw record, or returns `None` when it has no name, no URL,
/// or a price that is missing or not strictly positive.
#[must_use]
pub fn normalize_product(raw: RawProduct) -> Option<Product> {
    let Some(name) = non_blank(raw.name) else {
        tracing::debug!(url = ?raw.url, "dropping product without a name");
        return None;
    };
    let Some(url) = non_blank(raw.url) else {
        tracing::debug!(name = %name, "dropping product without a URL");
        return None;
    };
    let price = raw.price.as_ref().map_or(0, price_value);
    if price <= 0 {
        tracing::debug!(name = %name, url = %url, raw_price = ?raw.price, "dropping product without a positive price");
        return None;
    }

    Some(Product {
        name,
        price,
        url,
        unit: raw.unit.map(|u| u.trim().to_string()).unwrap_or_default(),
        location: raw.location.map(|l| l.trim().to_string()).unwrap_or_default(),
        category: raw.category.map(|c| c.trim().to_string()).unwrap_or_default(),
    })
}

/// Integer value of a raw price. Fractions are truncated; anything that
/// cannot be represented yields `0`, which the caller treats as invalid.
#[must_use]
pub fn price_value(price: &RawPrice) -> i64 {
    match price {
        RawPrice::Integer(n) => *n,
        RawPrice::Float(f) => float_price(*f),
        RawPrice::Text(s) => clean_price_digits(s),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_price(f: f64) -> i64 {
    if f.is_finite() && f >= 1.0 && f < i64::MAX as f64 {
        f.trunc() as i64
    } else {
        0
    }
}

/// Keeps only the ASCII digits of a price string: `"Rp 12.500"` becomes
/// `12500`. No digits, or more than fit in an `i64`, gives `0`.
#[must_use]
pub fn clean_price_digits(text: &str) -> i64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
