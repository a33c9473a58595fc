//! Conservative input validation and pre-sink sanitization.
//!
//! Ambiguous input is rejected rather than corrected.

use std::sync::LazyLock;

use pricewatch_core::Product;
use regex::Regex;

use crate::audit::sanitize_log_field;
use crate::error::ValidationError;

pub const KEYWORD_MAX_LENGTH: usize = 100;
pub const DATABASE_FIELD_MAX_LENGTH: usize = 1000;
pub const PRICE_CEILING: i64 = 1_000_000_000;
pub const PRODUCT_NAME_MIN_LENGTH: usize = 2;
pub const PRODUCT_NAME_MAX_LENGTH: usize = 500;

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_\.]+$").expect("valid regex"));

static SQL_INJECTION_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|EXEC|EXECUTE|UNION)\b",
        r"(;|--|/\*|\*/)",
        r"(?i)\bOR\b.*=",
        r"(?i)\bAND\b.*=",
        r#"['"`]"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Returns `true` if `value` contains a known SQL control fragment.
#[must_use]
pub fn looks_like_sql_injection(value: &str) -> bool {
    SQL_INJECTION_RES.iter().any(|re| re.is_match(value))
}

/// Validates a search keyword and returns it trimmed.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the keyword is empty, longer than
/// `max_length` characters, uses characters outside the allow-list, or
/// matches an SQL-injection pattern.
pub fn validate_keyword(keyword: &str, max_length: usize) -> Result<String, ValidationError> {
    let field = || "keyword".to_string();

    if keyword.is_empty() {
        return Err(ValidationError::Required { field: field() });
    }
    if keyword.chars().count() > max_length {
        return Err(ValidationError::TooLong {
            field: field(),
            max: max_length,
        });
    }
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(ValidationError::Required { field: field() });
    }
    if !KEYWORD_RE.is_match(keyword) {
        tracing::warn!(
            keyword = %crate::audit::sanitize_log_field(keyword, KEYWORD_MAX_LENGTH),
            "rejected keyword with invalid characters"
        );
        return Err(ValidationError::InvalidCharacters { field: field() });
    }
    if looks_like_sql_injection(keyword) {
        tracing::error!(
            security_alert = true,
            keyword = %crate::audit::sanitize_log_field(keyword, KEYWORD_MAX_LENGTH),
            "SQL injection pattern in keyword"
        );
        return Err(ValidationError::SuspiciousPattern { field: field() });
    }
    Ok(keyword.to_string())
}

/// Parses a digits-only integer and checks optional bounds.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the value is absent, not plain
/// digits, or out of range.
pub fn validate_integer(
    value: Option<&str>,
    field: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<i64, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;
    let not_an_integer = || ValidationError::NotAnInteger {
        field: field.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_an_integer());
    }
    let parsed: i64 = value.parse().map_err(|_| not_an_integer())?;

    if let Some(min) = min.filter(|m| parsed < *m) {
        return Err(ValidationError::BelowMinimum {
            field: field.to_string(),
            min,
        });
    }
    if let Some(max) = max.filter(|m| parsed > *m) {
        return Err(ValidationError::AboveMaximum {
            field: field.to_string(),
            max,
        });
    }
    Ok(parsed)
}

/// `None` means the parameter was not supplied and the caller picks the
/// default. An empty string is an error, not an absence.
///
/// # Errors
///
/// Returns [`ValidationError::NotABoolean`] for anything other than
/// `true/1/yes` or `false/0/no` (case-insensitive).
pub fn validate_boolean(value: Option<&str>, field: &str) -> Result<Option<bool>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ValidationError::NotABoolean {
            field: field.to_string(),
        }),
    }
}

/// Strips control characters and truncates to
/// [`DATABASE_FIELD_MAX_LENGTH`] characters.
#[must_use]
pub fn sanitize_for_database(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .take(DATABASE_FIELD_MAX_LENGTH)
        .collect()
}

/// Applies [`sanitize_for_database`] to every text field of a product.
#[must_use]
pub fn sanitize_product(product: Product) -> Product {
    Product {
        name: sanitize_for_database(&product.name),
        price: product.price,
        url: sanitize_for_database(&product.url),
        unit: sanitize_for_database(&product.unit),
        location: sanitize_for_database(&product.location),
        category: sanitize_for_database(&product.category),
    }
}

/// Rejects records that are well-formed but implausible: a price above
/// [`PRICE_CEILING`], a name outside
/// [`PRODUCT_NAME_MIN_LENGTH`]..=[`PRODUCT_NAME_MAX_LENGTH`] characters, or a
/// URL that is not https or names a local host.
///
/// # Errors
///
/// Returns the first failed check as a [`ValidationError`].
pub fn validate_product_plausibility(product: &Product) -> Result<(), ValidationError> {
    if product.price > PRICE_CEILING {
        return Err(ValidationError::AboveMaximum {
            field: "price".to_string(),
            max: PRICE_CEILING,
        });
    }

    let name_len = product.name.chars().count();
    if name_len < PRODUCT_NAME_MIN_LENGTH {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: PRODUCT_NAME_MIN_LENGTH,
        });
    }
    if name_len > PRODUCT_NAME_MAX_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: PRODUCT_NAME_MAX_LENGTH,
        });
    }

    let url = product.url.to_ascii_lowercase();
    if !url.starts_with("https://") {
        return Err(ValidationError::InsecureUrl {
            field: "url".to_string(),
        });
    }
    if url.contains("localhost") || url.contains("127.0.0.1") {
        tracing::warn!(url = %sanitize_log_field(&product.url, 200), "product url points at a local host");
        return Err(ValidationError::LocalHost {
            field: "url".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
