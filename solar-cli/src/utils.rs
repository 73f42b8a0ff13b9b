use rust_decimal::Decimal;
use solar_core::parse_amount;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid number '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Parses an amount typed by the customer.
///
/// Handles `$` and comma thousands separators (e.g. `"$1,234.56"`).
/// Empty or whitespace-only input is `None`.
pub fn parse_decimal(s: &str) -> Result<Option<Decimal>, ParseDecimalError> {
    parse_amount(s).map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.trim().to_string(),
            source: e,
        }
    })
}

/// `y`/`yes`/`n`/`no`, case-insensitive.
pub fn parse_yes_no(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_decimal_accepts_dollar_and_comma() {
        assert_eq!(parse_decimal("$1,234.56").unwrap(), Some(dec!(1234.56)));
        assert_eq!(parse_decimal("1,234,567.89").unwrap(), Some(dec!(1234567.89)));
    }

    #[test]
    fn parse_decimal_trims_whitespace() {
        assert_eq!(parse_decimal("  123.45  ").unwrap(), Some(dec!(123.45)));
    }

    #[test]
    fn parse_decimal_empty_is_none() {
        assert_eq!(parse_decimal("").unwrap(), None);
        assert_eq!(parse_decimal("  $ ").unwrap(), None);
    }

    #[test]
    fn parse_decimal_invalid_returns_error() {
        let err = parse_decimal("lots").unwrap_err();
        assert!(err.to_string().starts_with("invalid number 'lots'"));
    }

    #[test]
    fn yes_no_variants() {
        assert_eq!(parse_yes_no("Y"), Some(true));
        assert_eq!(parse_yes_no(" no "), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
    }
}
