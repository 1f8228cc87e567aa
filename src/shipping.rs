//! Postal-code format validation and delivery-method lookup for the
//! address-validation webhook.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::DeliveryMethod;

/// Format rules for countries with structured postcodes. Countries without
/// a rule accept any non-empty value.
static POSTCODE_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("GB", r"^([A-Z]{1,2}[0-9][0-9A-Z]?) ?([0-9][A-Z]{2})$"),
        ("US", r"^[0-9]{5}(-[0-9]{4})?$"),
        ("CA", r"^[A-Z][0-9][A-Z] ?[0-9][A-Z][0-9]$"),
        ("DE", r"^[0-9]{5}$"),
        ("FR", r"^[0-9]{5}$"),
        ("ES", r"^[0-9]{5}$"),
        ("IT", r"^[0-9]{5}$"),
        ("NL", r"^[0-9]{4} ?[A-Z]{2}$"),
        ("JP", r"^[0-9]{3}-?[0-9]{4}$"),
        ("PT", r"^[0-9]{4}-[0-9]{3}$"),
        ("PL", r"^[0-9]{2}-[0-9]{3}$"),
        ("IE", r"^[A-Z][0-9][0-9W] ?[0-9A-Z]{4}$"),
    ]
    .into_iter()
    .map(|(country, pattern)| {
        (
            country,
            Regex::new(pattern).expect("static postcode pattern"),
        )
    })
    .collect()
});

/// Normalize a raw postcode for validation: trimmed and upper-cased.
pub fn format_postcode(postcode: &str) -> String {
    postcode.trim().to_uppercase()
}

/// Check a postcode against the country's format rules. The postcode is
/// expected to be normalized via `format_postcode` first.
pub fn is_valid_postcode(postcode: &str, country: &str) -> bool {
    if postcode.is_empty() {
        return false;
    }

    let country = country.trim().to_uppercase();
    match POSTCODE_RULES.iter().find(|(c, _)| *c == country) {
        Some((_, pattern)) => pattern.is_match(postcode),
        None => true,
    }
}

/// Delivery methods the operator configured for the destination country,
/// restricted to ones priced in the cart's currency.
pub fn delivery_methods_for(
    conn: &Connection,
    country: &str,
    currency: &str,
) -> Result<Vec<DeliveryMethod>> {
    let rates = queries::shipping_rates_for_country(conn, country)?;

    Ok(rates
        .into_iter()
        .filter(|r| r.currency.eq_ignore_ascii_case(currency))
        .map(DeliveryMethod::from)
        .collect())
}
