//! Fixed-point money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Ledger amounts are `rust_decimal::Decimal` stored as `NUMERIC(16,2)`.

use rust_decimal::Decimal;

/// Number of decimal places every persisted amount carries.
pub const MONEY_SCALE: u32 = 2;

/// Returns true if `amount` can be stored without losing precision.
///
/// Trailing zeros do not count, so `1.500` fits while `1.005` does not.
#[must_use]
pub fn fits_money_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// Largest magnitude a `NUMERIC(16,2)` column holds: 99,999,999,999,999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0x6FC0_FFFF, 0x0023_86F2, 0, false, MONEY_SCALE);

/// Returns true if `amount` fits the persisted column's magnitude.
#[must_use]
pub fn fits_money_range(amount: Decimal) -> bool {
    amount.abs() <= MAX_MONEY
}
