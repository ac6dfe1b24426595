//! Balances, balance coordinates and posting phases

use crate::validation::{require_non_empty, require_utc, TzDateTime};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Address used when a posting does not name one
pub const DEFAULT_ADDRESS: &str = "DEFAULT";

/// Asset used when a posting does not name one
pub const DEFAULT_ASSET: &str = "COMMERCIAL_BANK_MONEY";

/// Posting lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Pending inbound authorisation
    #[serde(rename = "POSTING_PHASE_PENDING_INCOMING")]
    PendingIn,
    /// Pending outbound authorisation
    #[serde(rename = "POSTING_PHASE_PENDING_OUTGOING")]
    PendingOut,
    /// Settled
    #[serde(rename = "POSTING_PHASE_COMMITTED")]
    Committed,
}

impl Phase {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PendingIn => "POSTING_PHASE_PENDING_INCOMING",
            Phase::PendingOut => "POSTING_PHASE_PENDING_OUTGOING",
            Phase::Committed => "POSTING_PHASE_COMMITTED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accounting side of an account; decides the sign of `net`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tside {
    /// Net = debit - credit
    Asset,
    /// Net = credit - debit
    Liability,
}

/// The tuple balances are tracked against
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BalanceCoordinate {
    /// Account address
    pub account_address: String,

    /// Asset
    pub asset: String,

    /// Denomination (ISO 4217 or custom)
    pub denomination: String,

    /// Phase
    pub phase: Phase,
}

impl BalanceCoordinate {
    /// Validated constructor
    pub fn new(
        account_address: impl Into<String>,
        asset: impl Into<String>,
        denomination: impl Into<String>,
        phase: Phase,
    ) -> Result<Self> {
        let coordinate = Self {
            account_address: account_address.into(),
            asset: asset.into(),
            denomination: denomination.into(),
            phase,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Committed balance at the default address and asset
    pub fn committed_default(denomination: impl Into<String>) -> Self {
        Self {
            account_address: DEFAULT_ADDRESS.to_string(),
            asset: DEFAULT_ASSET.to_string(),
            denomination: denomination.into(),
            phase: Phase::Committed,
        }
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.account_address, "account_address", "BalanceCoordinate")?;
        require_non_empty(&self.asset, "asset", "BalanceCoordinate")?;
        require_non_empty(&self.denomination, "denomination", "BalanceCoordinate")?;
        Ok(())
    }
}

impl fmt::Display for BalanceCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address {}, asset {}, denomination {} and phase {}",
            self.account_address, self.asset, self.denomination, self.phase
        )
    }
}

/// Balance at one coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Total credits
    pub credit: Decimal,

    /// Total debits
    pub debit: Decimal,

    /// Net amount, signed according to the account's [`Tside`]
    pub net: Decimal,
}

impl Balance {
    /// Create a balance
    pub fn new(credit: Decimal, debit: Decimal, net: Decimal) -> Self {
        Self { credit, debit, net }
    }

    /// Balance contribution of a single posting leg
    pub fn from_posting(amount: Decimal, credit: bool, tside: Tside) -> Self {
        let (credit_amount, debit_amount) = if credit {
            (amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, amount)
        };
        let net = match tside {
            Tside::Liability => credit_amount - debit_amount,
            Tside::Asset => debit_amount - credit_amount,
        };
        Self::new(credit_amount, debit_amount, net)
    }

    /// Field-wise sum, `None` if any field overflows
    pub fn checked_add(self, other: Balance) -> Option<Balance> {
        Some(Balance {
            credit: self.credit.checked_add(other.credit)?,
            debit: self.debit.checked_add(other.debit)?,
            net: self.net.checked_add(other.net)?,
        })
    }
}

/// Balances keyed by coordinate; missing coordinates read as zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDefaultDict {
    #[serde(with = "coordinate_entries")]
    balances: BTreeMap<BalanceCoordinate, Balance>,
}

/// JSON object keys must be strings, so coordinate maps travel as entry lists
mod coordinate_entries {
    use super::{Balance, BalanceCoordinate};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        coordinate: BalanceCoordinate,
        balance: Balance,
    }

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<BalanceCoordinate, Balance>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = map
            .iter()
            .map(|(coordinate, balance)| Entry {
                coordinate: coordinate.clone(),
                balance: *balance,
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<BalanceCoordinate, Balance>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.coordinate, entry.balance))
            .collect())
    }
}

impl BalanceDefaultDict {
    /// Empty dict
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance at `coordinate`, zero if absent
    pub fn get(&self, coordinate: &BalanceCoordinate) -> Balance {
        self.balances.get(coordinate).copied().unwrap_or_default()
    }

    /// Add to the balance at `coordinate`; the dict is unchanged on overflow
    pub fn add(&mut self, coordinate: BalanceCoordinate, balance: Balance) -> Result<()> {
        let current = self.balances.get(&coordinate).copied().unwrap_or_default();
        let total = current.checked_add(balance).ok_or_else(|| {
            Error::invalid(format!("The balance for {} overflows.", coordinate))
        })?;
        self.balances.insert(coordinate, total);
        Ok(())
    }

    /// Sum `(coordinate, balance)` pairs into a new dict
    pub fn from_balances<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (BalanceCoordinate, Balance)>,
    {
        let mut dict = BalanceDefaultDict::new();
        for (coordinate, balance) in iter {
            dict.add(coordinate, balance)?;
        }
        Ok(dict)
    }

    /// Replace the balance at `coordinate`
    pub fn insert(&mut self, coordinate: BalanceCoordinate, balance: Balance) {
        self.balances.insert(coordinate, balance);
    }

    /// Iterate coordinates in order
    pub fn iter(&self) -> impl Iterator<Item = (&BalanceCoordinate, &Balance)> {
        self.balances.iter()
    }

    /// Number of coordinates present
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Check if no coordinate is present
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

/// Balances observed at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesObservation {
    /// Observation time
    pub value_datetime: TzDateTime,

    /// Observed balances
    pub balances: BalanceDefaultDict,
}

impl BalancesObservation {
    /// Validated constructor
    pub fn new(value_datetime: TzDateTime, balances: BalanceDefaultDict) -> Result<Self> {
        let observation = Self {
            value_datetime,
            balances,
        };
        observation.validate()?;
        Ok(observation)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.value_datetime, "value_datetime", "BalancesObservation")?;
        for (coordinate, _) in self.balances.iter() {
            coordinate.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_from_posting_tside() {
        let credit = Balance::from_posting(dec!(10), true, Tside::Liability);
        assert_eq!(credit.net, dec!(10));
        let credit_asset = Balance::from_posting(dec!(10), true, Tside::Asset);
        assert_eq!(credit_asset.net, dec!(-10));
        let debit = Balance::from_posting(dec!(4), false, Tside::Liability);
        assert_eq!(debit, Balance::new(dec!(0), dec!(4), dec!(-4)));
    }

    #[test]
    fn test_default_dict_zero_default() {
        let mut dict = BalanceDefaultDict::new();
        let coordinate = BalanceCoordinate::committed_default("GBP");
        assert_eq!(dict.get(&coordinate), Balance::default());

        dict.add(coordinate.clone(), Balance::from_posting(dec!(5), true, Tside::Liability))
            .unwrap();
        dict.add(coordinate.clone(), Balance::from_posting(dec!(2), false, Tside::Liability))
            .unwrap();
        assert_eq!(dict.get(&coordinate), Balance::new(dec!(5), dec!(2), dec!(3)));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_default_dict_add_overflow_is_error() {
        let mut dict = BalanceDefaultDict::new();
        let coordinate = BalanceCoordinate::committed_default("GBP");
        let max_credit = Balance::from_posting(Decimal::MAX, true, Tside::Liability);

        dict.add(coordinate.clone(), max_credit).unwrap();
        let err = dict.add(coordinate.clone(), max_credit).unwrap_err();
        assert!(err.is_invalid_definition());
        assert!(err.to_string().contains("overflows"));
        assert_eq!(dict.get(&coordinate), max_credit);

        assert!(Balance::default().checked_add(max_credit).is_some());
        assert!(max_credit.checked_add(max_credit).is_none());
    }

    #[test]
    fn test_coordinate_rejects_empty_fields() {
        let err = BalanceCoordinate::new("", DEFAULT_ASSET, "GBP", Phase::Committed).unwrap_err();
        assert!(err.to_string().contains("account_address"));
    }

    #[test]
    fn test_phase_wire_names() {
        let json = serde_json::to_string(&Phase::Committed).unwrap();
        assert_eq!(json, "\"POSTING_PHASE_COMMITTED\"");
        assert_eq!(Phase::PendingOut.to_string(), "POSTING_PHASE_PENDING_OUTGOING");
    }

    #[test]
    fn test_default_dict_json_round_trip() {
        let mut dict = BalanceDefaultDict::new();
        dict.add(
            BalanceCoordinate::committed_default("GBP"),
            Balance::from_posting(dec!(7.5), true, Tside::Liability),
        )
        .unwrap();
        let json = serde_json::to_string(&dict).unwrap();
        let decoded: BalanceDefaultDict = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, dict);
    }

    #[test]
    fn test_observation_requires_utc() {
        let naive = TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap();
        let err = BalancesObservation::new(naive, BalanceDefaultDict::new()).unwrap_err();
        assert!(err.to_string().contains("is not timezone aware"));
    }
}
