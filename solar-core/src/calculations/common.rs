//! Rounding and display helpers shared by the calculation engine and the
//! result report.
//!
//! All rounding is half-up (away from zero) so the same inputs always yield
//! the same report text.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use solar_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    round_dp(value, 2)
}

/// Rounds to `dp` decimal places, half-up.
pub fn round_dp(
    value: Decimal,
    dp: u32,
) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the nearest multiple of `step`, half-up.
///
/// ```
/// use rust_decimal_macros::dec;
/// use solar_core::calculations::common::round_to_nearest;
///
/// assert_eq!(round_to_nearest(dec!(14249.9), dec!(100)), dec!(14200));
/// assert_eq!(round_to_nearest(dec!(14250), dec!(100)), dec!(14300));
/// ```
pub fn round_to_nearest(
    value: Decimal,
    step: Decimal,
) -> Decimal {
    if step.is_zero() {
        return value;
    }
    round_dp(value / step, 0) * step
}

/// Formats with a fixed number of decimals, half-up.
pub fn fixed(
    value: Decimal,
    dp: u32,
) -> String {
    format!("{:.*}", dp as usize, round_dp(value, dp))
}

/// Whole-number string with comma thousands separators.
pub fn grouped(value: Decimal) -> String {
    let rounded = round_dp(value, 0);
    let digits = rounded.abs().trunc().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Currency rounded to whole dollars: `$11,400`, `-$250`.
pub fn currency(value: Decimal) -> String {
    let text = grouped(value);
    match text.strip_prefix('-') {
        Some(abs) => format!("-${abs}"),
        None => format!("${text}"),
    }
}
