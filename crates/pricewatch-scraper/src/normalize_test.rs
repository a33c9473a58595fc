use super::*;

fn raw(name: Option<&str>, price: Option<RawPrice>, url: Option<&str>) -> RawProduct {
    RawProduct {
        name: name.map(str::to_owned),
        price,
        url: url.map(str::to_owned),
        ..RawProduct::default()
    }
}

// -----------------------------------------------------------------------
// normalize_product
// -----------------------------------------------------------------------

#[test]
fn keeps_valid_product_and_defaults_optional_fields() {
    let product = normalize_product(raw(
        Some("Semen Gresik 40kg"),
        Some(RawPrice::Integer(62_000)),
        Some("https://shop.test/p/semen-gresik"),
    ))
    .unwrap();
    assert_eq!(product.name, "Semen Gresik 40kg");
    assert_eq!(product.price, 62_000);
    assert_eq!(product.url, "https://shop.test/p/semen-gresik");
    assert_eq!(product.unit, "");
    assert_eq!(product.location, "");
    assert_eq!(product.category, "");
}

#[test]
fn keeps_unit_location_and_category_when_present() {
    let product = normalize_product(RawProduct {
        unit: Some(" SAK ".to_owned()),
        location: Some("Jakarta".to_owned()),
        category: Some("semen".to_owned()),
        ..raw(Some("A"), Some(RawPrice::Integer(1)), Some("https://s/a"))
    })
    .unwrap();
    assert_eq!(product.unit, "SAK");
    assert_eq!(product.location, "Jakarta");
    assert_eq!(product.category, "semen");
}

#[test]
fn drops_missing_or_blank_name() {
    assert!(normalize_product(raw(None, Some(RawPrice::Integer(5)), Some("https://s/a"))).is_none());
    assert!(
        normalize_product(raw(Some("   "), Some(RawPrice::Integer(5)), Some("https://s/a")))
            .is_none()
    );
}

#[test]
fn drops_missing_or_blank_url() {
    assert!(normalize_product(raw(Some("A"), Some(RawPrice::Integer(5)), None)).is_none());
    assert!(normalize_product(raw(Some("A"), Some(RawPrice::Integer(5)), Some(""))).is_none());
}

#[test]
fn drops_non_positive_or_missing_price() {
    for price in [
        None,
        Some(RawPrice::Integer(0)),
        Some(RawPrice::Integer(-10)),
        Some(RawPrice::Float(0.5)),
        Some(RawPrice::Float(f64::NAN)),
        Some(RawPrice::Text("Hubungi kami".to_owned())),
    ] {
        assert!(
            normalize_product(raw(Some("A"), price.clone(), Some("https://s/a"))).is_none(),
            "expected {price:?} to be dropped"
        );
    }
}

// -----------------------------------------------------------------------
// normalize_products
// -----------------------------------------------------------------------

#[test]
fn batch_drops_only_malformed_entries() {
    let batch = vec![
        raw(Some("A"), Some(RawPrice::Integer(100)), Some("https://s/a")),
        raw(Some("B"), Some(RawPrice::Integer(0)), Some("https://s/b")),
        raw(Some("C"), Some(RawPrice::Text("Rp 2.500".to_owned())), Some("https://s/c")),
    ];
    let products = normalize_products(batch);
    let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
    assert_eq!(products[1].price, 2_500);
}

// -----------------------------------------------------------------------
// price parsing
// -----------------------------------------------------------------------

#[test]
fn clean_price_digits_strips_everything_but_digits() {
    assert_eq!(clean_price_digits("Rp 12.500"), 12_500);
    assert_eq!(clean_price_digits("IDR 1,250,000 / sak"), 1_250_000);
    assert_eq!(clean_price_digits("gratis"), 0);
    assert_eq!(clean_price_digits(""), 0);
}

#[test]
fn clean_price_digits_overflow_is_zero() {
    assert_eq!(clean_price_digits("99999999999999999999999"), 0);
}

#[test]
fn price_value_truncates_floats() {
    assert_eq!(price_value(&RawPrice::Float(65_000.75)), 65_000);
    assert_eq!(price_value(&RawPrice::Float(-3.0)), 0);
    assert_eq!(price_value(&RawPrice::Float(f64::INFINITY)), 0);
}
