//! Property-based tests for overdraft contract arithmetic
//!
//! These tests use proptest to verify:
//! - Accrued interest is never negative and keeps at most 5 decimal places
//! - Only positive balances earn interest
//! - The overdraft fee triggers exactly beyond the limit

use overdraft_contract::interest::{daily_interest, exceeds_overdraft, ACCRUAL_PRECISION};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating balances in pence, both signs
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|pence| Decimal::new(pence, 2))
}

/// Strategy for generating annual rates between 0% and 100%
fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|basis_points| Decimal::new(basis_points, 4))
}

proptest! {
    /// Property: interest is non-negative with bounded precision
    #[test]
    fn prop_interest_precision(balance in balance_strategy(), rate in rate_strategy()) {
        let interest = daily_interest(balance, rate).unwrap();
        prop_assert!(interest >= Decimal::ZERO);
        prop_assert!(interest.normalize().scale() <= ACCRUAL_PRECISION);
        if balance <= Decimal::ZERO {
            prop_assert_eq!(interest, Decimal::ZERO);
        }
    }

    /// Property: a day's interest never exceeds the balance times the rate
    #[test]
    fn prop_interest_bounded(balance in balance_strategy(), rate in rate_strategy()) {
        prop_assume!(balance > Decimal::ZERO);
        let interest = daily_interest(balance, rate).unwrap();
        // rounding adds at most half a unit in the last place
        prop_assert!(interest <= balance * rate + Decimal::new(1, ACCRUAL_PRECISION));
    }

    /// Property: the limit itself is still inside the overdraft
    #[test]
    fn prop_overdraft_boundary(limit_pence in 0i64..1_000_000i64) {
        let limit = Decimal::new(limit_pence, 2);
        prop_assert!(!exceeds_overdraft(-limit, limit));
        prop_assert!(exceeds_overdraft(-limit - Decimal::new(1, 2), limit));
    }
}
