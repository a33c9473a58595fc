//! schema.org `Product` extraction from JSON-LD script blocks.

use std::sync::LazyLock;

use pricewatch_core::{RawPrice, RawProduct};
use regex::Regex;
use serde_json::Value;

use crate::adapter::ProductParser;
use crate::error::ScraperError;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Parser for vendors that publish their listings as JSON-LD.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLdParser;

impl ProductParser for JsonLdParser {
    fn parse(&self, html: &str) -> Result<Vec<RawProduct>, ScraperError> {
        Ok(extract_jsonld_products(html))
    }
}

/// Extract every `Product` entry from `<script type="application/ld+json">`
/// blocks, including products nested in `@graph` containers and `ItemList`
/// elements. Blocks that fail to parse are skipped.
#[must_use]
pub fn extract_jsonld_products(html: &str) -> Vec<RawProduct> {
    let mut results = Vec::new();

    for cap in SCRIPT_RE.captures_iter(html) {
        let Some(json_text) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json_text) else {
            continue;
        };
        collect_products(&value, &mut results);
    }

    results
}

fn collect_products(value: &Value, out: &mut Vec<RawProduct>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_products(graph, out);
            }
            if has_type(value, "ItemList") {
                if let Some(elements) = map.get("itemListElement").and_then(Value::as_array) {
                    for element in elements {
                        collect_products(element.get("item").unwrap_or(element), out);
                    }
                }
            }
            if has_type(value, "Product") {
                out.push(product_from_value(value));
            }
        }
        _ => {}
    }
}

fn has_type(value: &Value, wanted: &str) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

fn product_from_value(value: &Value) -> RawProduct {
    let offer = match value.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        Some(other) => Some(other),
        None => None,
    };

    let price = offer
        .and_then(|o| o.get("price").or_else(|| o.get("lowPrice")))
        .and_then(raw_price);

    let unit = offer
        .and_then(|o| {
            o.get("unitText").or_else(|| {
                o.get("priceSpecification")
                    .and_then(|spec| spec.get("referenceQuantity"))
                    .and_then(|q| q.get("unitText"))
            })
        })
        .and_then(Value::as_str)
        .map(str::to_string);

    RawProduct {
        name: string_field(value, "name"),
        price,
        url: string_field(value, "url").or_else(|| offer.and_then(|o| string_field(o, "url"))),
        unit,
        location: None,
        category: string_field(value, "category"),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Numeric JSON prices and decimal strings become numbers; anything else is
/// kept as text for the normalizer's digit cleaning.
fn raw_price(value: &Value) -> Option<RawPrice> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(RawPrice::Integer)
            .or_else(|| n.as_f64().map(RawPrice::Float)),
        Value::String(s) => Some(match s.trim().parse::<f64>() {
            Ok(f) => RawPrice::Float(f),
            Err(_) => RawPrice::Text(s.clone()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">{json}</script></head><body></body></html>"#
        )
    }

    #[test]
    fn extracts_single_product() {
        let html = page(
            r#"{"@type":"Product","name":"Semen Tiga Roda 40kg","url":"https://shop.test/p/1",
                "category":"semen","offers":{"@type":"Offer","price":"65000","priceCurrency":"IDR"}}"#,
        );
        let products = extract_jsonld_products(&html);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name.as_deref(), Some("Semen Tiga Roda 40kg"));
        assert_eq!(products[0].price, Some(RawPrice::Float(65000.0)));
        assert_eq!(products[0].category.as_deref(), Some("semen"));
    }

    #[test]
    fn expands_graph_and_item_lists() {
        let html = page(
            r#"{"@graph":[
                {"@type":"WebSite","name":"Shop"},
                {"@type":"ItemList","itemListElement":[
                    {"@type":"ListItem","position":1,"item":{"@type":"Product","name":"A","url":"https://s/a","offers":{"price":100}}},
                    {"@type":"ListItem","position":2,"item":{"@type":"Product","name":"B","url":"https://s/b","offers":[{"price":200}]}}
                ]}
            ]}"#,
        );
        let products = extract_jsonld_products(&html);
        let names: Vec<_> = products.iter().filter_map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(products[1].price, Some(RawPrice::Integer(200)));
    }

    #[test]
    fn reads_unit_from_offer() {
        let html = page(
            r#"{"@type":["Product"],"name":"Keramik","url":"https://s/k",
                "offers":{"price":"Rp 85.000","unitText":"M2"}}"#,
        );
        let products = extract_jsonld_products(&html);
        assert_eq!(products[0].unit.as_deref(), Some("M2"));
        assert_eq!(products[0].price, Some(RawPrice::Text("Rp 85.000".to_string())));
    }

    #[test]
    fn skips_invalid_json_blocks() {
        let html = format!(
            "{}{}",
            page("{not json"),
            page(r#"{"@type":"Product","name":"Ok"}"#)
        );
        let products = extract_jsonld_products(&html);
        assert_eq!(products.len(), 1);
        assert!(products[0].price.is_none());
    }

    #[test]
    fn returns_empty_for_pages_without_jsonld() {
        assert!(extract_jsonld_products("<html><body>nothing</body></html>").is_empty());
    }
}
