//! Conversions between decimal prices and the integer cents kept in storage.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Number of fractional digits kept for a price.
pub const PRICE_SCALE: u32 = 2;

/// Largest storable price in cents: ten significant digits, two of them fractional.
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Convert a decimal price into cents, rounding to two fractional digits.
///
/// Returns `None` when the value does not fit into the storable range.
pub fn price_to_cents(price: Decimal) -> Option<i64> {
    let cents = price
        .round_dp(PRICE_SCALE)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()?;

    if cents.abs() > MAX_PRICE_CENTS {
        return None;
    }

    Some(cents)
}

/// Convert stored cents back into a decimal price.
pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, PRICE_SCALE)
}

/// Largest number of cents a price must exceed to be strictly greater than `bound`.
pub fn lower_bound_cents(bound: Decimal) -> i64 {
    match bound.checked_mul(Decimal::ONE_HUNDRED) {
        Some(scaled) => scaled.floor().to_i64().unwrap_or(saturate(scaled)),
        None => saturate(bound),
    }
}

/// Smallest number of cents a price must stay below to be strictly less than `bound`.
pub fn upper_bound_cents(bound: Decimal) -> i64 {
    match bound.checked_mul(Decimal::ONE_HUNDRED) {
        Some(scaled) => scaled.ceil().to_i64().unwrap_or(saturate(scaled)),
        None => saturate(bound),
    }
}

fn saturate(value: Decimal) -> i64 {
    if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    }
}
