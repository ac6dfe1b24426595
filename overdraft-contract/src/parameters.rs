//! Parameter declarations and typed access to their values

use crate::{Error, Result};
use contracts_api::types::{Parameter, ParameterLevel, ParameterUpdatePermission, ParameterValue, Shape};
use contracts_api::{TzDateTime, Vault};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account denomination
pub const DENOMINATION: &str = "denomination";
/// Arranged overdraft, as a positive amount
pub const OVERDRAFT_LIMIT: &str = "overdraft_limit";
/// Fee charged when the balance goes beyond the arranged overdraft
pub const OVERDRAFT_FEE: &str = "overdraft_fee";
/// Internal account receiving overdraft fees
pub const OVERDRAFT_FEE_INCOME_ACCOUNT: &str = "overdraft_fee_income_account";
/// Gross annual interest rate on positive balances
pub const INTEREST_RATE: &str = "interest_rate";
/// Internal account funding accrued interest
pub const ACCRUED_INTEREST_PAYABLE_ACCOUNT: &str = "accrued_interest_payable_account";
/// Committed balance plus the arranged overdraft
pub const AVAILABLE_BALANCE: &str = "available_balance";

/// Denominations the contract accepts
pub const SUPPORTED_DENOMINATIONS: [&str; 1] = ["GBP"];

/// Declared parameters of the contract
pub fn declarations() -> Result<Vec<Parameter>> {
    Ok(vec![
        Parameter::new(DENOMINATION, Shape::denomination(SUPPORTED_DENOMINATIONS)?, ParameterLevel::Template)?
            .with_description("Denomination", "Denomination of the account.")
            .with_default_value("GBP")?,
        Parameter::new(
            OVERDRAFT_LIMIT,
            Shape::bounded_number(Decimal::ZERO, Decimal::new(10_000, 0), Some(Decimal::ONE))?,
            ParameterLevel::Instance,
        )?
        .with_description("Overdraft limit", "Arranged overdraft available to the customer.")
        .with_default_value(Decimal::new(500, 0))?
        .with_update_permission(ParameterUpdatePermission::OpsEditable)?,
        Parameter::new(
            OVERDRAFT_FEE,
            Shape::bounded_number(Decimal::ZERO, Decimal::new(100, 0), Some(Decimal::new(1, 2)))?,
            ParameterLevel::Template,
        )?
        .with_description("Overdraft fee", "Fee charged each time the balance exceeds the overdraft limit.")
        .with_default_value(Decimal::new(15, 0))?,
        Parameter::new(OVERDRAFT_FEE_INCOME_ACCOUNT, Shape::AccountId, ParameterLevel::Template)?
            .with_description("Overdraft fee income account", "Internal account receiving overdraft fees."),
        Parameter::new(
            INTEREST_RATE,
            Shape::bounded_number(Decimal::ZERO, Decimal::ONE, None)?,
            ParameterLevel::Template,
        )?
        .with_description("Interest rate", "Gross annual interest rate on positive balances.")
        .with_default_value(Decimal::new(5, 2))?,
        Parameter::new(ACCRUED_INTEREST_PAYABLE_ACCOUNT, Shape::AccountId, ParameterLevel::Template)?
            .with_description("Accrued interest payable account", "Internal account funding accrued interest."),
        Parameter::new(AVAILABLE_BALANCE, Shape::number(), ParameterLevel::Instance)?
            .with_description("Available balance", "Committed balance plus the arranged overdraft.")
            .into_derived()?,
    ])
}

/// Parameter values in force at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdraftParameters {
    /// Account denomination
    pub denomination: String,

    /// Arranged overdraft
    pub overdraft_limit: Decimal,

    /// Fee per breach of the overdraft limit
    pub overdraft_fee: Decimal,

    /// Fee income account
    pub overdraft_fee_income_account: String,

    /// Annual interest rate
    pub interest_rate: Decimal,

    /// Interest funding account
    pub accrued_interest_payable_account: String,
}

impl OverdraftParameters {
    /// Read every parameter from the vault at `at`
    pub fn load(vault: &dyn Vault, at: &TzDateTime) -> Result<Self> {
        Ok(Self {
            denomination: string(vault, DENOMINATION, at)?,
            overdraft_limit: decimal(vault, OVERDRAFT_LIMIT, at)?,
            overdraft_fee: decimal(vault, OVERDRAFT_FEE, at)?,
            overdraft_fee_income_account: string(vault, OVERDRAFT_FEE_INCOME_ACCOUNT, at)?,
            interest_rate: decimal(vault, INTEREST_RATE, at)?,
            accrued_interest_payable_account: string(vault, ACCRUED_INTEREST_PAYABLE_ACCOUNT, at)?,
        })
    }
}

/// Denomination in force at `at`
pub fn denomination(vault: &dyn Vault, at: &TzDateTime) -> Result<String> {
    string(vault, DENOMINATION, at)
}

/// Overdraft limit in force at `at`
pub fn overdraft_limit(vault: &dyn Vault, at: &TzDateTime) -> Result<Decimal> {
    decimal(vault, OVERDRAFT_LIMIT, at)
}

fn decimal(vault: &dyn Vault, name: &str, at: &TzDateTime) -> Result<Decimal> {
    let value = vault.require_parameter(name, at)?;
    value.as_decimal().ok_or_else(|| kind_mismatch(name, "number", &value))
}

fn string(vault: &dyn Vault, name: &str, at: &TzDateTime) -> Result<String> {
    let value = vault.require_parameter(name, at)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| kind_mismatch(name, "string", &value))
}

fn kind_mismatch(name: &str, expected: &str, value: &ParameterValue) -> Error {
    Error::Parameter(format!(
        "'{}' should be a {} but is {} of type {}",
        name,
        expected,
        value.repr(),
        value.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_are_valid() {
        let parameters = declarations().unwrap();
        assert_eq!(parameters.len(), 7);
        for parameter in &parameters {
            parameter.validate().unwrap();
        }

        let derived: Vec<&str> = parameters
            .iter()
            .filter(|p| p.derived)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(derived, vec![AVAILABLE_BALANCE]);
    }

    #[test]
    fn test_defaults_match_shapes() {
        let parameters = declarations().unwrap();
        let limit = parameters.iter().find(|p| p.name == OVERDRAFT_LIMIT).unwrap();
        assert_eq!(
            limit.default_value.as_ref().and_then(ParameterValue::as_decimal),
            Some(Decimal::new(500, 0))
        );
        assert_eq!(limit.update_permission, Some(ParameterUpdatePermission::OpsEditable));

        let denomination = parameters.iter().find(|p| p.name == DENOMINATION).unwrap();
        assert!(denomination
            .shape
            .validate_value(DENOMINATION, &ParameterValue::from("USD"))
            .is_err());
    }
}
