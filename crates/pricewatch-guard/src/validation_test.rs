use super::*;

// -----------------------------------------------------------------------
// validate_keyword
// -----------------------------------------------------------------------

#[test]
fn keyword_is_trimmed() {
    assert_eq!(
        validate_keyword("  semen putih 40kg ", KEYWORD_MAX_LENGTH).unwrap(),
        "semen putih 40kg"
    );
}

#[test]
fn keyword_accepts_allowed_punctuation() {
    assert!(validate_keyword("pipa-pvc_3.5", KEYWORD_MAX_LENGTH).is_ok());
}

#[test]
fn keyword_empty_or_blank_is_required() {
    assert!(matches!(
        validate_keyword("", KEYWORD_MAX_LENGTH),
        Err(ValidationError::Required { .. })
    ));
    assert!(matches!(
        validate_keyword("   ", KEYWORD_MAX_LENGTH),
        Err(ValidationError::Required { .. })
    ));
}

#[test]
fn keyword_over_length_is_rejected() {
    let long = "a".repeat(101);
    let err = validate_keyword(&long, KEYWORD_MAX_LENGTH).unwrap_err();
    assert_eq!(err.to_string(), "keyword exceeds maximum length of 100");
    assert!(validate_keyword(&"a".repeat(100), KEYWORD_MAX_LENGTH).is_ok());
}

#[test]
fn keyword_with_disallowed_characters_is_rejected() {
    for bad in ["semen'", "cat<script>", "pipa;", "a=b", "semen/**/"] {
        assert!(
            matches!(
                validate_keyword(bad, KEYWORD_MAX_LENGTH),
                Err(ValidationError::InvalidCharacters { .. })
            ),
            "{bad} should be rejected by the allow-list"
        );
    }
}

#[test]
fn keyword_with_sql_words_is_rejected() {
    for bad in ["semen UNION select", "drop table", "cat -- comment", "Exec sp"] {
        assert!(
            matches!(
                validate_keyword(bad, KEYWORD_MAX_LENGTH),
                Err(ValidationError::SuspiciousPattern { .. })
            ),
            "{bad} should be flagged"
        );
    }
}

#[test]
fn sql_heuristic_catches_classic_payloads() {
    assert!(looks_like_sql_injection("1 OR 1=1"));
    assert!(looks_like_sql_injection("x' and 'a'='a"));
    assert!(looks_like_sql_injection("/* hi */"));
    assert!(looks_like_sql_injection("a; b"));
    assert!(!looks_like_sql_injection("semen gresik"));
    assert!(!looks_like_sql_injection("cat tembok orange"));
}

// -----------------------------------------------------------------------
// validate_integer
// -----------------------------------------------------------------------

#[test]
fn integer_parses_digits_within_bounds() {
    assert_eq!(validate_integer(Some("50"), "limit", Some(1), Some(500)), Ok(50));
    assert_eq!(validate_integer(Some("0"), "page", None, None), Ok(0));
}

#[test]
fn integer_rejects_missing_and_non_digit_values() {
    assert!(matches!(
        validate_integer(None, "limit", None, None),
        Err(ValidationError::Required { .. })
    ));
    for bad in ["", "-5", "+5", "1.5", "12abc", " 7", "99999999999999999999"] {
        assert!(
            matches!(
                validate_integer(Some(bad), "limit", None, None),
                Err(ValidationError::NotAnInteger { .. })
            ),
            "{bad:?} should not parse"
        );
    }
}

#[test]
fn integer_enforces_bounds() {
    assert_eq!(
        validate_integer(Some("0"), "limit", Some(1), Some(500)),
        Err(ValidationError::BelowMinimum {
            field: "limit".into(),
            min: 1
        })
    );
    let err = validate_integer(Some("501"), "limit", Some(1), Some(500)).unwrap_err();
    assert_eq!(err.to_string(), "limit must be at most 500");
}

// -----------------------------------------------------------------------
// validate_boolean
// -----------------------------------------------------------------------

#[test]
fn boolean_accepts_known_spellings() {
    for t in ["true", "TRUE", "1", "yes", "Yes"] {
        assert_eq!(validate_boolean(Some(t), "flag"), Ok(Some(true)));
    }
    for f in ["false", "0", "no", "NO"] {
        assert_eq!(validate_boolean(Some(f), "flag"), Ok(Some(false)));
    }
}

#[test]
fn boolean_absent_is_none_but_empty_is_error() {
    assert_eq!(validate_boolean(None, "flag"), Ok(None));
    assert!(matches!(
        validate_boolean(Some(""), "flag"),
        Err(ValidationError::NotABoolean { .. })
    ));
    assert!(validate_boolean(Some("maybe"), "flag").is_err());
    assert!(validate_boolean(Some("on"), "flag").is_err());
}

// -----------------------------------------------------------------------
// sanitization
// -----------------------------------------------------------------------

#[test]
fn sanitize_for_database_strips_controls_and_truncates() {
    assert_eq!(sanitize_for_database("Semen\0 Gresik\n"), "Semen Gresik");
    let long = "x".repeat(1500);
    assert_eq!(sanitize_for_database(&long).len(), DATABASE_FIELD_MAX_LENGTH);
}

#[test]
fn sanitize_product_keeps_price_and_cleans_text() {
    let product = sanitize_product(Product {
        name: "Cat\u{7}".into(),
        price: 15_000,
        url: "https://s/c".into(),
        unit: "KG\t".into(),
        location: String::new(),
        category: "cat".into(),
    });
    assert_eq!(product.name, "Cat");
    assert_eq!(product.unit, "KG");
    assert_eq!(product.price, 15_000);
}

// -----------------------------------------------------------------------
// validate_product_plausibility
// -----------------------------------------------------------------------

fn plausible() -> Product {
    Product {
        name: "Semen Tiga Roda 40kg".into(),
        price: 65_000,
        url: "https://toko.test/semen".into(),
        unit: "SAK".into(),
        location: String::new(),
        category: "semen".into(),
    }
}

#[test]
fn plausibility_accepts_ordinary_products_and_bounds() {
    assert!(validate_product_plausibility(&plausible()).is_ok());
    let edge = Product {
        name: "Cb".into(),
        price: PRICE_CEILING,
        ..plausible()
    };
    assert!(validate_product_plausibility(&edge).is_ok());
    let long_name = Product {
        name: "x".repeat(PRODUCT_NAME_MAX_LENGTH),
        ..plausible()
    };
    assert!(validate_product_plausibility(&long_name).is_ok());
}

#[test]
fn plausibility_rejection_table() {
    let cases = [
        (
            Product { price: PRICE_CEILING + 1, ..plausible() },
            "price must be at most 1000000000",
        ),
        (
            Product { name: "X".into(), ..plausible() },
            "name must be at least 2 characters",
        ),
        (
            Product { name: "x".repeat(PRODUCT_NAME_MAX_LENGTH + 1), ..plausible() },
            "name exceeds maximum length of 500",
        ),
        (
            Product { url: "http://toko.test/semen".into(), ..plausible() },
            "url must use https",
        ),
        (
            Product { url: "https://localhost/admin".into(), ..plausible() },
            "url points at a local host",
        ),
        (
            Product { url: "https://127.0.0.1:8080/x".into(), ..plausible() },
            "url points at a local host",
        ),
    ];
    for (product, message) in cases {
        let err = validate_product_plausibility(&product).unwrap_err();
        assert_eq!(err.to_string(), message, "product: {product:?}");
    }
}
