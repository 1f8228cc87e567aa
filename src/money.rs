//! Conversion between the storefront's decimal amounts and the processor's
//! integer minor-unit representation.
//!
//! Rounding happens exactly once, at this boundary. Callers hold either a
//! decimal display amount or a minor-unit integer, never a half-converted
//! value, so repeated conversion of the same logical amount cannot drift.

/// Currencies whose integer representation is already whole units.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &["JPY"];

pub fn is_zero_decimal(currency: &str) -> bool {
    ZERO_DECIMAL_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(currency))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a decimal display amount into processor minor units.
///
/// Zero and negative amounts are not scaled; the zero-value "add payment
/// method" flow sends an amount of 0. A negative amount still rounds to
/// the nearest whole unit, since the wire type is an integer.
pub fn to_processor_units(amount: f64, currency: &str) -> i64 {
    if amount <= 0.0 {
        return amount.round() as i64;
    }

    let amount = round2(amount);

    if is_zero_decimal(currency) {
        amount.round() as i64
    } else {
        (amount * 100.0).round() as i64
    }
}

/// Convert a processor minor-unit amount back into display units.
pub fn to_display_units(minor_amount: i64, currency: &str) -> f64 {
    if minor_amount <= 0 || is_zero_decimal(currency) {
        return minor_amount as f64;
    }

    round2(minor_amount as f64 / 100.0)
}
