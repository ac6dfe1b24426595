//! Postings and custom instructions
//!
//! # Invariants
//!
//! - A posting moves a strictly positive amount
//! - A custom instruction holds 1..=64 postings
//! - Within an instruction, signed amounts net to zero per balance coordinate
//!   (address, asset, denomination, phase), whichever accounts the legs touch

use super::balances::{Balance, BalanceCoordinate, BalanceDefaultDict, Phase, Tside};
use crate::validation::{require_at_most, require_non_empty, require_positive};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum postings per custom instruction
pub const MAX_POSTINGS_PER_INSTRUCTION: usize = 64;

/// Single debit or credit leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Credit (true) or debit (false)
    pub credit: bool,

    /// Amount moved
    pub amount: Decimal,

    /// Denomination
    pub denomination: String,

    /// Account the leg touches
    pub account_id: String,

    /// Address within the account
    pub account_address: String,

    /// Asset
    pub asset: String,

    /// Phase
    pub phase: Phase,
}

impl Posting {
    /// Validated constructor
    pub fn new(
        credit: bool,
        amount: Decimal,
        denomination: impl Into<String>,
        account_id: impl Into<String>,
        account_address: impl Into<String>,
        asset: impl Into<String>,
        phase: Phase,
    ) -> Result<Self> {
        let posting = Self {
            credit,
            amount,
            denomination: denomination.into(),
            account_id: account_id.into(),
            account_address: account_address.into(),
            asset: asset.into(),
            phase,
        };
        posting.validate()?;
        Ok(posting)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_positive(self.amount, "amount", "Posting")?;
        require_non_empty(&self.denomination, "denomination", "Posting")?;
        require_non_empty(&self.account_id, "account_id", "Posting")?;
        require_non_empty(&self.account_address, "account_address", "Posting")?;
        require_non_empty(&self.asset, "asset", "Posting")?;
        Ok(())
    }

    /// Coordinate this leg affects
    pub fn coordinate(&self) -> BalanceCoordinate {
        BalanceCoordinate {
            account_address: self.account_address.clone(),
            asset: self.asset.clone(),
            denomination: self.denomination.clone(),
            phase: self.phase,
        }
    }

    /// Credits positive, debits negative
    pub fn signed_amount(&self) -> Decimal {
        if self.credit {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// Classification of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCode {
    /// Domain
    pub domain: String,

    /// Family
    pub family: String,

    /// Subfamily
    pub subfamily: String,
}

impl TransactionCode {
    /// Validated constructor
    pub fn new(
        domain: impl Into<String>,
        family: impl Into<String>,
        subfamily: impl Into<String>,
    ) -> Result<Self> {
        let code = Self {
            domain: domain.into(),
            family: family.into(),
            subfamily: subfamily.into(),
        };
        code.validate()?;
        Ok(code)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.domain, "domain", "TransactionCode")?;
        require_non_empty(&self.family, "family", "TransactionCode")?;
        require_non_empty(&self.subfamily, "subfamily", "TransactionCode")?;
        Ok(())
    }
}

/// Zero-net group of postings submitted atomically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomInstruction {
    /// Posting legs
    pub postings: Vec<Posting>,

    /// Free-form metadata
    #[serde(default)]
    pub instruction_details: BTreeMap<String, String>,

    /// Bypass account restrictions
    #[serde(default)]
    pub override_all_restrictions: Option<bool>,

    /// Transaction classification
    #[serde(default)]
    pub transaction_code: Option<TransactionCode>,
}

impl CustomInstruction {
    /// Validated constructor
    pub fn new(postings: Vec<Posting>) -> Result<Self> {
        Self::with_details(postings, BTreeMap::new())
    }

    /// Validated constructor with instruction details
    pub fn with_details(
        postings: Vec<Posting>,
        instruction_details: BTreeMap<String, String>,
    ) -> Result<Self> {
        let instruction = Self {
            postings,
            instruction_details,
            override_all_restrictions: None,
            transaction_code: None,
        };
        instruction.validate()?;
        Ok(instruction)
    }

    /// Attach a transaction code
    pub fn with_transaction_code(mut self, code: TransactionCode) -> Result<Self> {
        code.validate()?;
        self.transaction_code = Some(code);
        Ok(self)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if self.postings.is_empty() {
            return Err(Error::invalid(
                "'postings' of CustomInstruction must contain at least one posting.",
            ));
        }
        require_at_most(
            self.postings.len(),
            MAX_POSTINGS_PER_INSTRUCTION,
            "postings",
            "Custom Instruction",
        )?;
        for posting in &self.postings {
            posting.validate()?;
        }
        for key in self.instruction_details.keys() {
            require_non_empty(key, "instruction_details", "CustomInstruction")?;
        }
        if let Some(code) = &self.transaction_code {
            code.validate()?;
        }
        check_zero_net(&self.postings)
    }

    /// Balance effect on one account
    pub fn balances(&self, account_id: &str, tside: Tside) -> Result<BalanceDefaultDict> {
        BalanceDefaultDict::from_balances(
            self.postings
                .iter()
                .filter(|p| p.account_id == account_id)
                .map(|p| (p.coordinate(), Balance::from_posting(p.amount, p.credit, tside))),
        )
    }

    /// Distinct account ids touched, in first-seen order
    pub fn account_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for posting in &self.postings {
            if !ids.contains(&posting.account_id.as_str()) {
                ids.push(&posting.account_id);
            }
        }
        ids
    }
}

/// Net signed amount per coordinate, account ids ignored
pub fn net_by_coordinate(postings: &[Posting]) -> Result<BTreeMap<BalanceCoordinate, Decimal>> {
    let mut totals: BTreeMap<BalanceCoordinate, Decimal> = BTreeMap::new();
    for posting in postings {
        let total = totals.entry(posting.coordinate()).or_insert(Decimal::ZERO);
        *total = total.checked_add(posting.signed_amount()).ok_or_else(|| {
            Error::invalid(format!(
                "The sum of postings for {} overflows.",
                posting.coordinate()
            ))
        })?;
    }
    Ok(totals)
}

/// Double-entry check: every coordinate must net to exactly zero
pub fn check_zero_net(postings: &[Posting]) -> Result<()> {
    for (coordinate, net) in net_by_coordinate(postings)? {
        if !net.is_zero() {
            return Err(Error::invalid(format!(
                "The sum of postings in a CustomInstruction must be zero for each balance coordinate. \
                 The sum for {} is {}.",
                coordinate,
                net.normalize()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::balances::{DEFAULT_ADDRESS, DEFAULT_ASSET};
    use rust_decimal_macros::dec;

    fn leg(credit: bool, amount: Decimal, account: &str) -> Posting {
        Posting::new(
            credit,
            amount,
            "GBP",
            account,
            DEFAULT_ADDRESS,
            DEFAULT_ASSET,
            Phase::Committed,
        )
        .unwrap()
    }

    #[test]
    fn test_posting_rejects_non_positive_amount() {
        let err = Posting::new(true, dec!(0), "GBP", "a", DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed)
            .unwrap_err();
        assert!(err.to_string().contains("must be greater than 0"));
        assert!(Posting::new(true, dec!(-1), "GBP", "a", DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed)
            .is_err());
    }

    #[test]
    fn test_posting_rejects_empty_account() {
        let err = Posting::new(true, dec!(1), "GBP", "", DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed)
            .unwrap_err();
        assert!(err.to_string().contains("'account_id' of Posting"));
    }

    #[test]
    fn test_balanced_instruction() {
        let instruction = CustomInstruction::new(vec![
            leg(true, dec!(10), "internal"),
            leg(false, dec!(10), "test_account_id"),
        ])
        .unwrap();

        let internal = instruction.balances("internal", Tside::Liability).unwrap();
        let customer = instruction.balances("test_account_id", Tside::Liability).unwrap();
        let coordinate = BalanceCoordinate::committed_default("GBP");
        assert_eq!(internal.get(&coordinate).net, dec!(10));
        assert_eq!(customer.get(&coordinate).net, dec!(-10));
        assert_eq!(instruction.account_ids(), vec!["internal", "test_account_id"]);
    }

    #[test]
    fn test_unbalanced_instruction_reports_net() {
        let err = CustomInstruction::new(vec![
            leg(true, dec!(10), "internal"),
            leg(false, dec!(7.5), "test_account_id"),
        ])
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("address DEFAULT"));
        assert!(msg.contains("denomination GBP"));
        assert!(msg.contains("POSTING_PHASE_COMMITTED"));
        assert!(msg.ends_with("is 2.5."));
    }

    #[test]
    fn test_netting_ignores_account_but_not_phase() {
        let mut pending = leg(false, dec!(10), "b");
        pending.phase = Phase::PendingOut;
        let err = CustomInstruction::new(vec![leg(true, dec!(10), "a"), pending]).unwrap_err();
        assert!(err.is_invalid_definition());

        // Same account on both sides still nets
        assert!(CustomInstruction::new(vec![leg(true, dec!(3), "a"), leg(false, dec!(3), "a")]).is_ok());
    }

    #[test]
    fn test_overflowing_sums_are_errors() {
        let err = CustomInstruction::new(vec![
            leg(true, Decimal::MAX, "a"),
            leg(true, Decimal::MAX, "a"),
            leg(false, Decimal::MAX, "b"),
            leg(false, Decimal::MAX, "b"),
        ])
        .unwrap_err();
        assert!(err.is_invalid_definition());
        assert!(err.to_string().contains("overflows"));

        // Nets to zero at every step, but the account's credits alone overflow
        let instruction = CustomInstruction::new(vec![
            leg(true, Decimal::MAX, "a"),
            leg(false, Decimal::MAX, "a"),
            leg(true, Decimal::MAX, "a"),
            leg(false, Decimal::MAX, "a"),
        ])
        .unwrap();
        let err = instruction.balances("a", Tside::Liability).unwrap_err();
        assert!(err.to_string().contains("The balance for address DEFAULT"));
    }

    #[test]
    fn test_empty_and_oversized_instructions() {
        assert!(CustomInstruction::new(vec![]).is_err());

        let mut postings = Vec::new();
        for _ in 0..33 {
            postings.push(leg(true, dec!(1), "a"));
            postings.push(leg(false, dec!(1), "b"));
        }
        let err = CustomInstruction::new(postings).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too many postings submitted in the Custom Instruction. Number submitted: 66. Limit: 64."
        );
    }

    #[test]
    fn test_transaction_code_validation() {
        let instruction = CustomInstruction::new(vec![leg(true, dec!(1), "a"), leg(false, dec!(1), "b")]).unwrap();
        assert!(instruction
            .clone()
            .with_transaction_code(TransactionCode::new("PMNT", "RCDT", "ESCT").unwrap())
            .is_ok());
        assert!(TransactionCode::new("", "RCDT", "ESCT").is_err());
    }
}
