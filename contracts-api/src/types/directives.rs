//! Directives returned by hooks for the host to act on

use super::balances::{BalanceDefaultDict, Tside};
use super::postings::{CustomInstruction, MAX_POSTINGS_PER_INSTRUCTION};
use super::schedules::{EndOfMonthSchedule, ScheduleExpression, ScheduleSkip};
use crate::validation::{
    require_at_most, require_non_empty, require_optional_non_empty, require_optional_utc, TzDateTime,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum instructions per directive
pub const MAX_INSTRUCTIONS_PER_DIRECTIVE: usize = MAX_POSTINGS_PER_INSTRUCTION;

/// A batch of custom instructions for the host ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingInstructionsDirective {
    /// Instructions, applied atomically
    pub posting_instructions: Vec<CustomInstruction>,

    /// Caller supplied batch id
    #[serde(default)]
    pub client_batch_id: Option<String>,

    /// Value date of the batch
    #[serde(default)]
    pub value_datetime: Option<TzDateTime>,

    /// Booking date of the batch
    #[serde(default)]
    pub booking_datetime: Option<TzDateTime>,

    /// Free-form metadata
    #[serde(default)]
    pub batch_details: BTreeMap<String, String>,
}

impl PostingInstructionsDirective {
    /// Validated constructor
    pub fn new(posting_instructions: Vec<CustomInstruction>, value_datetime: Option<TzDateTime>) -> Result<Self> {
        let directive = Self {
            posting_instructions,
            client_batch_id: None,
            value_datetime,
            booking_datetime: None,
            batch_details: BTreeMap::new(),
        };
        directive.validate()?;
        Ok(directive)
    }

    /// Attach a client batch id
    pub fn with_client_batch_id(mut self, client_batch_id: impl Into<String>) -> Result<Self> {
        self.client_batch_id = Some(client_batch_id.into());
        self.validate()?;
        Ok(self)
    }

    /// Attach batch details
    pub fn with_batch_details(mut self, batch_details: BTreeMap<String, String>) -> Self {
        self.batch_details = batch_details;
        self
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if self.posting_instructions.is_empty() {
            return Err(Error::invalid(
                "'posting_instructions' of PostingInstructionsDirective must contain at least one instruction.",
            ));
        }
        require_at_most(
            self.posting_instructions.len(),
            MAX_INSTRUCTIONS_PER_DIRECTIVE,
            "posting instructions",
            "Posting Instructions Directive",
        )?;
        for instruction in &self.posting_instructions {
            instruction.validate()?;
        }
        require_optional_non_empty(
            self.client_batch_id.as_deref(),
            "client_batch_id",
            "PostingInstructionsDirective",
        )?;
        require_optional_utc(
            self.value_datetime.as_ref(),
            "value_datetime",
            "PostingInstructionsDirective",
        )?;
        require_optional_utc(
            self.booking_datetime.as_ref(),
            "booking_datetime",
            "PostingInstructionsDirective",
        )?;
        Ok(())
    }

    /// Combined balance effect on one account
    pub fn balances(&self, account_id: &str, tside: Tside) -> Result<BalanceDefaultDict> {
        let mut total = BalanceDefaultDict::new();
        for instruction in &self.posting_instructions {
            for (coordinate, balance) in instruction.balances(account_id, tside)?.iter() {
                total.add(coordinate.clone(), *balance)?;
            }
        }
        Ok(total)
    }
}

/// Notification for downstream consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNotificationDirective {
    /// Notification type
    pub notification_type: String,

    /// Payload
    #[serde(default)]
    pub notification_details: BTreeMap<String, String>,
}

impl AccountNotificationDirective {
    /// Validated constructor
    pub fn new(notification_type: impl Into<String>, notification_details: BTreeMap<String, String>) -> Result<Self> {
        let directive = Self {
            notification_type: notification_type.into(),
            notification_details,
        };
        directive.validate()?;
        Ok(directive)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.notification_type, "notification_type", "AccountNotificationDirective")?;
        for key in self.notification_details.keys() {
            require_non_empty(key, "notification_details", "AccountNotificationDirective")?;
        }
        Ok(())
    }
}

/// Change to an existing event type's schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAccountEventTypeDirective {
    /// Event type to update
    pub event_type: String,

    /// New cron-like schedule
    #[serde(default)]
    pub expression: Option<ScheduleExpression>,

    /// New monthly schedule
    #[serde(default)]
    pub schedule_method: Option<EndOfMonthSchedule>,

    /// New end datetime
    #[serde(default)]
    pub end_datetime: Option<TzDateTime>,

    /// New suspension
    #[serde(default)]
    pub skip: Option<ScheduleSkip>,
}

impl UpdateAccountEventTypeDirective {
    /// Validate and return self
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.event_type, "event_type", "UpdateAccountEventTypeDirective")?;

        if self.expression.is_some() && self.schedule_method.is_some() {
            return Err(Error::invalid(
                "UpdateAccountEventTypeDirective cannot contain both expression and schedule_method.",
            ));
        }
        if self.expression.is_none()
            && self.schedule_method.is_none()
            && self.end_datetime.is_none()
            && self.skip.is_none()
        {
            return Err(Error::invalid(
                "UpdateAccountEventTypeDirective object must have either an end_datetime, an expression, \
                 a schedule_method, or skip.",
            ));
        }

        if let Some(expression) = &self.expression {
            expression.validate()?;
        }
        if let Some(method) = &self.schedule_method {
            method.validate()?;
        }
        require_optional_utc(
            self.end_datetime.as_ref(),
            "end_datetime",
            "UpdateAccountEventTypeDirective",
        )?;
        if let Some(skip) = &self.skip {
            skip.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::balances::{BalanceCoordinate, Phase, DEFAULT_ADDRESS, DEFAULT_ASSET};
    use crate::types::postings::Posting;
    use rust_decimal_macros::dec;

    fn transfer() -> CustomInstruction {
        let leg = |credit: bool, account: &str| {
            Posting::new(credit, dec!(5), "GBP", account, DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed).unwrap()
        };
        CustomInstruction::new(vec![leg(true, "a"), leg(false, "b")]).unwrap()
    }

    #[test]
    fn test_directive_limit() {
        let err = PostingInstructionsDirective::new(vec![transfer(); 65], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too many posting instructions submitted in the Posting Instructions Directive. \
             Number submitted: 65. Limit: 64."
        );
        assert!(PostingInstructionsDirective::new(vec![transfer(); 64], None).is_ok());
        assert!(PostingInstructionsDirective::new(vec![], None).is_err());
    }

    #[test]
    fn test_directive_datetimes_must_be_utc() {
        let naive = TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap();
        let err = PostingInstructionsDirective::new(vec![transfer()], Some(naive)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'value_datetime' of PostingInstructionsDirective is not timezone aware."
        );
    }

    #[test]
    fn test_directive_client_batch_id() {
        let directive = PostingInstructionsDirective::new(vec![transfer()], None).unwrap();
        assert!(directive.clone().with_client_batch_id("").is_err());
        assert!(directive.with_client_batch_id("BATCH_1").is_ok());
    }

    #[test]
    fn test_directive_balances() {
        let directive = PostingInstructionsDirective::new(vec![transfer(), transfer()], None).unwrap();
        let balances = directive.balances("a", Tside::Liability).unwrap();
        assert_eq!(balances.get(&BalanceCoordinate::committed_default("GBP")).net, dec!(10));
    }

    #[test]
    fn test_update_event_type_directive() {
        let empty = UpdateAccountEventTypeDirective {
            event_type: "ACCRUE_INTEREST".into(),
            ..Default::default()
        };
        assert!(empty.validated().unwrap_err().to_string().contains("must have either"));

        let skip = UpdateAccountEventTypeDirective {
            event_type: "ACCRUE_INTEREST".into(),
            skip: Some(ScheduleSkip::Indefinitely),
            ..Default::default()
        };
        assert!(skip.validated().is_ok());

        let unnamed = UpdateAccountEventTypeDirective {
            skip: Some(ScheduleSkip::Indefinitely),
            ..Default::default()
        };
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_notification_directive() {
        assert!(AccountNotificationDirective::new("", BTreeMap::new()).is_err());
        let details = BTreeMap::from([("fee".to_string(), "15".to_string())]);
        assert!(AccountNotificationDirective::new("OVERDRAFT_FEE_CHARGED", details).is_ok());
    }
}
