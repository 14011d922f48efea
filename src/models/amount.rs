//! Exact-decimal amount rules. Balances and amounts never touch floating point.

use rust_decimal::Decimal;
use thiserror::Error;

/// Fractional digits carried by every balance and amount.
pub const BALANCE_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount must be positive")]
    NotPositive,
    #[error("Amount must have at most 2 decimal places")]
    TooPrecise,
    #[error("Amount must not exceed 9999999999.99")]
    TooLarge,
}

/// Largest balance the `NUMERIC(12, 2)` column holds.
pub fn max_balance() -> Decimal {
    Decimal::new(999_999_999_999, BALANCE_SCALE)
}

/// Check that `amount` is strictly positive with at most two fractional digits
/// and no larger than [`max_balance`].
/// Trailing zeros do not count, so `1.500` is accepted as `1.50`.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if amount.normalize().scale() > BALANCE_SCALE {
        return Err(AmountError::TooPrecise);
    }
    if amount > max_balance() {
        return Err(AmountError::TooLarge);
    }
    Ok(quantize(amount))
}

/// Rescale to exactly two fractional digits. Callers only pass values that
/// already fit, so this never rounds.
pub fn quantize(value: Decimal) -> Decimal {
    let mut value = value.normalize();
    value.rescale(BALANCE_SCALE);
    value
}
