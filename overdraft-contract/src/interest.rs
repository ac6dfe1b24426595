//! Fee and interest arithmetic

use crate::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Day count basis for daily accrual
pub const DAYS_IN_YEAR: u32 = 365;

/// Decimal places kept on accrued interest
pub const ACCRUAL_PRECISION: u32 = 5;

/// One day of interest on `balance` at `annual_rate`.
///
/// Only positive balances earn interest. The result is rounded half away
/// from zero to [`ACCRUAL_PRECISION`] places.
pub fn daily_interest(balance: Decimal, annual_rate: Decimal) -> Result<Decimal> {
    if balance <= Decimal::ZERO || annual_rate <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let yearly = balance
        .checked_mul(annual_rate)
        .ok_or_else(|| Error::Overflow(format!("{} * {}", balance, annual_rate)))?;
    let daily = yearly
        .checked_div(Decimal::from(DAYS_IN_YEAR))
        .ok_or_else(|| Error::Overflow(format!("{} / {}", yearly, DAYS_IN_YEAR)))?;

    Ok(daily.round_dp_with_strategy(ACCRUAL_PRECISION, RoundingStrategy::MidpointAwayFromZero))
}

/// True when `net` is beyond the arranged overdraft
pub fn exceeds_overdraft(net: Decimal, overdraft_limit: Decimal) -> bool {
    net < -overdraft_limit
}
