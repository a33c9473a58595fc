use serde::{Deserialize, Serialize};

/// A product listing in canonical form, ready to hand to a sink.
///
/// Only the normalizer should build these from adapter output: it enforces
/// a non-empty `name` and `url` and a strictly positive `price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Price in the vendor's smallest display unit (whole rupiah for the
    /// current vendors). Always `> 0`.
    pub price: i64,
    pub url: String,
    /// Sales unit, e.g. `"SAK"` or `"M2"`. Empty when unknown.
    #[serde(default)]
    pub unit: String,
    /// Store or region the listing belongs to. Empty when unknown.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
}

/// Price as an adapter produced it: already numeric, or text such as
/// `"Rp 12.500"` that still needs cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Loosely-typed product record emitted by a vendor adapter's parser.
///
/// Every field is optional; the normalizer decides which records survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawProduct {
    /// Returns `true` when the record carries a non-blank unit.
    #[must_use]
    pub fn has_unit(&self) -> bool {
        self.unit.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}
