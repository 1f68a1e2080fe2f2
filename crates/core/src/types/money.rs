//! Monetary amount parsing.
//!
//! Shopify sends money as decimal strings like `"123.45"` (and occasionally
//! as bare JSON numbers). All arithmetic in the OMS happens on integer cents,
//! so the single conversion point lives here.

use serde_json::Value;
use thiserror::Error;

/// Error returned when a monetary amount contains non-numeric parts.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid monetary amount: {0:?}")]
pub struct MoneyParseError(pub String);

/// Parse a Shopify monetary amount into integer cents.
///
/// The fractional part is right-padded with zeros and then truncated to
/// exactly two digits - never rounded - so `"1.999"` parses to `199` cents.
/// A leading `-` on the integer part negates the whole result. Absent, null,
/// or empty input yields `0`.
///
/// # Errors
///
/// Returns [`MoneyParseError`] only when the integer or fraction substring is
/// non-numeric. A missing decimal point is not an error.
pub fn money_to_cents(amount: Option<&Value>) -> Result<i64, MoneyParseError> {
    let text = match amount {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };
    if text.is_empty() {
        return Ok(0);
    }

    let (dollars, fraction) = match text.split_once('.') {
        Some((d, f)) => (d, f),
        None => (text.as_str(), ""),
    };

    // Right-pad then truncate to two digits: "9" -> "90", "999" -> "99".
    let mut cents_digits = format!("{fraction}00");
    cents_digits.truncate(2);

    let negative = dollars.starts_with('-');
    let dollars = dollars.trim_start_matches('-');

    let whole: i64 = dollars
        .parse()
        .map_err(|_| MoneyParseError(text.clone()))?;
    let cents: i64 = cents_digits
        .parse()
        .map_err(|_| MoneyParseError(text.clone()))?;

    let total = whole * 100 + cents;
    Ok(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cents(v: &Value) -> i64 {
        money_to_cents(Some(v)).expect("valid amount")
    }

    #[test]
    fn test_truncates_never_rounds() {
        assert_eq!(cents(&json!("1.999")), 199);
        assert_eq!(cents(&json!("0.005")), 0);
    }

    #[test]
    fn test_short_fraction_is_padded() {
        assert_eq!(cents(&json!("1.5")), 150);
        assert_eq!(cents(&json!("12.")), 1200);
    }

    #[test]
    fn test_no_decimal_point() {
        assert_eq!(cents(&json!("19")), 1900);
        assert_eq!(cents(&json!("0")), 0);
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(cents(&json!("-2.34")), -234);
        assert_eq!(cents(&json!("-10")), -1000);
    }

    #[test]
    fn test_absent_and_empty_yield_zero() {
        assert_eq!(money_to_cents(None), Ok(0));
        assert_eq!(money_to_cents(Some(&Value::Null)), Ok(0));
        assert_eq!(money_to_cents(Some(&json!(""))), Ok(0));
        assert_eq!(money_to_cents(Some(&json!("   "))), Ok(0));
    }

    #[test]
    fn test_json_numbers_accepted() {
        assert_eq!(cents(&json!(123)), 12300);
        assert_eq!(cents(&json!(19.99)), 1999);
    }

    #[test]
    fn test_non_numeric_parts_fail() {
        assert!(money_to_cents(Some(&json!("abc"))).is_err());
        assert!(money_to_cents(Some(&json!("12.x9"))).is_err());
        assert!(money_to_cents(Some(&json!("$5.00"))).is_err());
        // A bare sign has no integer digits to parse.
        assert!(money_to_cents(Some(&json!("-.50"))).is_err());
    }

    #[test]
    fn test_typical_shopify_values() {
        assert_eq!(cents(&json!("19.99")), 1999);
        assert_eq!(cents(&json!("123.45")), 12345);
        assert_eq!(cents(&json!("0.00")), 0);
    }
}
