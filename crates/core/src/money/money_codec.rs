//! Fixed-point encoding of money and quantities.
//!
//! Money is stored in the smallest unit of its currency (won, cents, ...).
//! Quantities and prices are stored in nano units (value x 10^9) regardless of
//! currency. Both are `i128` so that every `Decimal` input fits without overflow.

use rust_decimal::Decimal;

use crate::errors::Result;

/// Number of fractional digits kept by nano-unit encoding.
pub const NANO_DIGITS: u32 = 9;

/// Fractional digits assumed for currencies missing from [`currency_minor_digits`].
pub const DEFAULT_MINOR_DIGITS: u32 = 2;

/// Returns the number of fractional digits of a currency's minor unit.
///
/// Zero-decimal currencies (KRW, JPY) use scale 1, two-decimal currencies use
/// scale 100. Unknown codes fall back to two decimals.
pub fn currency_minor_digits(currency: &str) -> u32 {
    match currency {
        "KRW" | "JPY" => 0,
        "USD" | "EUR" | "GBP" | "CNY" => 2,
        _ => DEFAULT_MINOR_DIGITS,
    }
}

/// Converts a decimal amount to integer minor units of `currency`.
///
/// Rounds half away from zero. Never fails for a `Decimal` input.
pub fn to_minor_units(amount: Decimal, currency: &str) -> i128 {
    scale_and_round(amount, currency_minor_digits(currency))
}

/// Converts integer minor units of `currency` back to a decimal amount.
pub fn from_minor_units(amount_minor: i128, currency: &str) -> Result<Decimal> {
    Ok(Decimal::try_from_i128_with_scale(
        amount_minor,
        currency_minor_digits(currency),
    )?)
}

/// Converts a decimal quantity (or unit price) to nano units.
pub fn to_nano_units(quantity: Decimal) -> i128 {
    scale_and_round(quantity, NANO_DIGITS)
}

/// Converts nano units back to a decimal quantity (or unit price).
pub fn from_nano_units(nano: i128) -> Result<Decimal> {
    Ok(Decimal::try_from_i128_with_scale(nano, NANO_DIGITS)?)
}

/// Shifts `value` left by `digits` decimal places and rounds to an integer.
///
/// Works on the raw mantissa so the result is exact: a `Decimal` mantissa is
/// below 2^96 and the shift is at most 10^9, which stays inside `i128`.
fn scale_and_round(value: Decimal, digits: u32) -> i128 {
    let mantissa = value.mantissa();
    let scale = value.scale();

    if digits >= scale {
        return mantissa * 10i128.pow(digits - scale);
    }

    let divisor = 10i128.pow(scale - digits);
    let quotient = mantissa / divisor;
    let remainder = mantissa % divisor;

    if remainder.abs() * 2 >= divisor {
        quotient + mantissa.signum()
    } else {
        quotient
    }
}
