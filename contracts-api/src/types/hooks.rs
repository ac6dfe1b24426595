//! Hook arguments and hook results
//!
//! Arguments are built by the host and handed to the contract; results are
//! built by the contract and serialised back to the host. Both validate their
//! datetimes against the UTC policy.

use super::directives::{AccountNotificationDirective, PostingInstructionsDirective, UpdateAccountEventTypeDirective};
use super::parameters::ParameterValue;
use super::postings::CustomInstruction;
use super::schedules::ScheduledEvent;
use crate::capabilities::CapabilitySet;
use crate::validation::{require_non_empty, require_optional_utc, require_unique, require_utc, TzDateTime};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arguments of the activation hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationHookArguments {
    /// Account opening time
    pub effective_datetime: TzDateTime,
}

impl ActivationHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime) -> Result<Self> {
        let args = Self { effective_datetime };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "ActivationHookArguments").map(|_| ())
    }
}

/// Arguments of the deactivation hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationHookArguments {
    /// Account closing time
    pub effective_datetime: TzDateTime,
}

impl DeactivationHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime) -> Result<Self> {
        let args = Self { effective_datetime };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "DeactivationHookArguments").map(|_| ())
    }
}

/// Arguments of the derived parameter hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedParameterHookArguments {
    /// Time the derived values are requested for
    pub effective_datetime: TzDateTime,
}

impl DerivedParameterHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime) -> Result<Self> {
        let args = Self { effective_datetime };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "DerivedParameterHookArguments").map(|_| ())
    }
}

fn validate_posting_args(
    effective_datetime: &TzDateTime,
    posting_instructions: &[CustomInstruction],
    type_name: &str,
) -> Result<()> {
    require_utc(effective_datetime, "effective_datetime", type_name)?;
    for instruction in posting_instructions {
        instruction.validate()?;
    }
    Ok(())
}

/// Arguments of the pre-posting hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrePostingHookArguments {
    /// Value time of the incoming postings
    pub effective_datetime: TzDateTime,

    /// Incoming instructions
    pub posting_instructions: Vec<CustomInstruction>,
}

impl PrePostingHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime, posting_instructions: Vec<CustomInstruction>) -> Result<Self> {
        let args = Self {
            effective_datetime,
            posting_instructions,
        };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_posting_args(&self.effective_datetime, &self.posting_instructions, "PrePostingHookArguments")
    }
}

/// Arguments of the post-posting hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPostingHookArguments {
    /// Value time of the accepted postings
    pub effective_datetime: TzDateTime,

    /// Accepted instructions
    pub posting_instructions: Vec<CustomInstruction>,
}

impl PostPostingHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime, posting_instructions: Vec<CustomInstruction>) -> Result<Self> {
        let args = Self {
            effective_datetime,
            posting_instructions,
        };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_posting_args(&self.effective_datetime, &self.posting_instructions, "PostPostingHookArguments")
    }
}

/// Arguments of the scheduled event hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEventHookArguments {
    /// Firing time
    pub effective_datetime: TzDateTime,

    /// Event type that fired
    pub event_type: String,

    /// Host-side pause time, if the schedule is paused
    #[serde(default)]
    pub pause_at_datetime: Option<TzDateTime>,
}

impl ScheduledEventHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime, event_type: impl Into<String>) -> Result<Self> {
        let args = Self {
            effective_datetime,
            event_type: event_type.into(),
            pause_at_datetime: None,
        };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "ScheduledEventHookArguments")?;
        require_non_empty(&self.event_type, "event_type", "ScheduledEventHookArguments")?;
        require_optional_utc(
            self.pause_at_datetime.as_ref(),
            "pause_at_datetime",
            "ScheduledEventHookArguments",
        )?;
        Ok(())
    }
}

/// Arguments of the pre-parameter-change hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreParameterChangeHookArguments {
    /// Time of the change
    pub effective_datetime: TzDateTime,

    /// Proposed values
    pub updated_parameter_values: BTreeMap<String, ParameterValue>,
}

impl PreParameterChangeHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime, updated_parameter_values: BTreeMap<String, ParameterValue>) -> Result<Self> {
        let args = Self {
            effective_datetime,
            updated_parameter_values,
        };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "PreParameterChangeHookArguments")?;
        validate_parameter_values(&self.updated_parameter_values, "PreParameterChangeHookArguments")
    }
}

/// Arguments of the post-parameter-change hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostParameterChangeHookArguments {
    /// Time of the change
    pub effective_datetime: TzDateTime,

    /// Values before the change
    pub old_parameter_values: BTreeMap<String, ParameterValue>,

    /// Values after the change
    pub updated_parameter_values: BTreeMap<String, ParameterValue>,
}

impl PostParameterChangeHookArguments {
    /// Validated constructor
    pub fn new(
        effective_datetime: TzDateTime,
        old_parameter_values: BTreeMap<String, ParameterValue>,
        updated_parameter_values: BTreeMap<String, ParameterValue>,
    ) -> Result<Self> {
        let args = Self {
            effective_datetime,
            old_parameter_values,
            updated_parameter_values,
        };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "PostParameterChangeHookArguments")?;
        validate_parameter_values(&self.old_parameter_values, "PostParameterChangeHookArguments")?;
        validate_parameter_values(&self.updated_parameter_values, "PostParameterChangeHookArguments")
    }
}

/// Arguments of the conversion hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionHookArguments {
    /// Conversion time
    pub effective_datetime: TzDateTime,

    /// Schedules of the contract being converted from
    #[serde(default)]
    pub existing_schedules: BTreeMap<String, ScheduledEvent>,
}

impl ConversionHookArguments {
    /// Validated constructor
    pub fn new(effective_datetime: TzDateTime, existing_schedules: BTreeMap<String, ScheduledEvent>) -> Result<Self> {
        let args = Self {
            effective_datetime,
            existing_schedules,
        };
        args.validate()?;
        Ok(args)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_utc(&self.effective_datetime, "effective_datetime", "ConversionHookArguments")?;
        validate_scheduled_events(&self.existing_schedules, "ConversionHookArguments")
    }
}

fn validate_parameter_values(values: &BTreeMap<String, ParameterValue>, type_name: &str) -> Result<()> {
    for (name, value) in values {
        require_non_empty(name, "parameter name", type_name)?;
        if let Some(datetime) = value.as_datetime() {
            require_utc(datetime, name, type_name)?;
        }
    }
    Ok(())
}

fn validate_scheduled_events(events: &BTreeMap<String, ScheduledEvent>, type_name: &str) -> Result<()> {
    for (event_type, event) in events {
        require_non_empty(event_type, "event type", type_name)?;
        event.validate()?;
    }
    Ok(())
}

fn validate_directives(
    posting_instructions_directives: &[PostingInstructionsDirective],
    account_notification_directives: &[AccountNotificationDirective],
    update_account_event_type_directives: &[UpdateAccountEventTypeDirective],
    type_name: &str,
) -> Result<()> {
    for directive in posting_instructions_directives {
        directive.validate()?;
    }
    require_unique(
        posting_instructions_directives
            .iter()
            .filter_map(|d| d.client_batch_id.as_deref()),
        "client_batch_id",
        type_name,
    )?;
    for directive in account_notification_directives {
        directive.validate()?;
    }
    for directive in update_account_event_type_directives {
        directive.validate()?;
    }
    require_unique(
        update_account_event_type_directives.iter().map(|d| d.event_type.as_str()),
        "update_account_event_type_directives",
        type_name,
    )
}

fn check_schedule_capabilities(
    scheduled_events: &BTreeMap<String, ScheduledEvent>,
    update_account_event_type_directives: &[UpdateAccountEventTypeDirective],
    capabilities: &CapabilitySet,
) -> Result<()> {
    for (event_type, event) in scheduled_events {
        capabilities.check_scheduled_event(event_type, event)?;
    }
    for directive in update_account_event_type_directives {
        capabilities.check_event_type_update(directive)?;
    }
    Ok(())
}

/// Why a hook refused an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// Breaks the product's terms and conditions
    AgainstTermsAndConditions,
    /// Account holder is deceased
    AccountHolderDeceased,
    /// Contract specific reason
    ClientCustomReason,
    /// Not enough funds
    InsufficientFunds,
    /// Denomination not supported by the account
    WrongDenomination,
}

/// A hook's refusal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Human readable message
    pub message: String,

    /// Reason code
    pub reason_code: RejectionReason,
}

impl Rejection {
    /// Validated constructor
    pub fn new(message: impl Into<String>, reason_code: RejectionReason) -> Result<Self> {
        let rejection = Self {
            message: message.into(),
            reason_code,
        };
        rejection.validate()?;
        Ok(rejection)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.message, "message", "Rejection")
    }
}

/// Result of the activation hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationHookResult {
    /// Postings to make at activation
    #[serde(default)]
    pub posting_instructions_directives: Vec<PostingInstructionsDirective>,

    /// Notifications to emit
    #[serde(default)]
    pub account_notification_directives: Vec<AccountNotificationDirective>,

    /// Initial schedules keyed by event type
    #[serde(default)]
    pub scheduled_events_return_value: BTreeMap<String, ScheduledEvent>,
}

impl ActivationHookResult {
    /// Check the returned schedules only use enabled capabilities
    pub fn check_capabilities(&self, capabilities: &CapabilitySet) -> Result<()> {
        check_schedule_capabilities(&self.scheduled_events_return_value, &[], capabilities)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_directives(
            &self.posting_instructions_directives,
            &self.account_notification_directives,
            &[],
            "ActivationHookResult",
        )?;
        validate_scheduled_events(&self.scheduled_events_return_value, "ActivationHookResult")
    }
}

/// Result of the deactivation hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationHookResult {
    /// Postings to make at closure
    #[serde(default)]
    pub posting_instructions_directives: Vec<PostingInstructionsDirective>,

    /// Notifications to emit
    #[serde(default)]
    pub account_notification_directives: Vec<AccountNotificationDirective>,

    /// Schedule updates
    #[serde(default)]
    pub update_account_event_type_directives: Vec<UpdateAccountEventTypeDirective>,

    /// Refusal to close
    #[serde(default)]
    pub rejection: Option<Rejection>,
}

impl DeactivationHookResult {
    /// Check the event type updates only use enabled capabilities
    pub fn check_capabilities(&self, capabilities: &CapabilitySet) -> Result<()> {
        check_schedule_capabilities(&BTreeMap::new(), &self.update_account_event_type_directives, capabilities)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_directives(
            &self.posting_instructions_directives,
            &self.account_notification_directives,
            &self.update_account_event_type_directives,
            "DeactivationHookResult",
        )?;
        if let Some(rejection) = &self.rejection {
            rejection.validate()?;
        }
        Ok(())
    }
}

/// Result of the pre-posting hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrePostingHookResult {
    /// Refusal of the incoming postings
    #[serde(default)]
    pub rejection: Option<Rejection>,
}

impl PrePostingHookResult {
    /// Reject the postings
    pub fn reject(message: impl Into<String>, reason_code: RejectionReason) -> Result<Self> {
        Ok(Self {
            rejection: Some(Rejection::new(message, reason_code)?),
        })
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match &self.rejection {
            Some(rejection) => rejection.validate(),
            None => Ok(()),
        }
    }
}

/// Result of the post-posting hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPostingHookResult {
    /// Follow-up postings
    #[serde(default)]
    pub posting_instructions_directives: Vec<PostingInstructionsDirective>,

    /// Notifications to emit
    #[serde(default)]
    pub account_notification_directives: Vec<AccountNotificationDirective>,

    /// Schedule updates
    #[serde(default)]
    pub update_account_event_type_directives: Vec<UpdateAccountEventTypeDirective>,
}

impl PostPostingHookResult {
    /// Check the event type updates only use enabled capabilities
    pub fn check_capabilities(&self, capabilities: &CapabilitySet) -> Result<()> {
        check_schedule_capabilities(&BTreeMap::new(), &self.update_account_event_type_directives, capabilities)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_directives(
            &self.posting_instructions_directives,
            &self.account_notification_directives,
            &self.update_account_event_type_directives,
            "PostPostingHookResult",
        )
    }
}

/// Result of the scheduled event hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEventHookResult {
    /// Postings to make
    #[serde(default)]
    pub posting_instructions_directives: Vec<PostingInstructionsDirective>,

    /// Notifications to emit
    #[serde(default)]
    pub account_notification_directives: Vec<AccountNotificationDirective>,

    /// Schedule updates
    #[serde(default)]
    pub update_account_event_type_directives: Vec<UpdateAccountEventTypeDirective>,
}

impl ScheduledEventHookResult {
    /// Check the event type updates only use enabled capabilities
    pub fn check_capabilities(&self, capabilities: &CapabilitySet) -> Result<()> {
        check_schedule_capabilities(&BTreeMap::new(), &self.update_account_event_type_directives, capabilities)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_directives(
            &self.posting_instructions_directives,
            &self.account_notification_directives,
            &self.update_account_event_type_directives,
            "ScheduledEventHookResult",
        )
    }
}

/// Result of the derived parameter hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedParameterHookResult {
    /// Derived values keyed by parameter name
    #[serde(default)]
    pub parameters_return_value: BTreeMap<String, ParameterValue>,
}

impl DerivedParameterHookResult {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_parameter_values(&self.parameters_return_value, "DerivedParameterHookResult")
    }
}

/// Result of the pre-parameter-change hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreParameterChangeHookResult {
    /// Refusal of the change
    #[serde(default)]
    pub rejection: Option<Rejection>,
}

impl PreParameterChangeHookResult {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match &self.rejection {
            Some(rejection) => rejection.validate(),
            None => Ok(()),
        }
    }
}

/// Result of the post-parameter-change hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostParameterChangeHookResult {
    /// Follow-up postings
    #[serde(default)]
    pub posting_instructions_directives: Vec<PostingInstructionsDirective>,

    /// Notifications to emit
    #[serde(default)]
    pub account_notification_directives: Vec<AccountNotificationDirective>,

    /// Schedule updates
    #[serde(default)]
    pub update_account_event_type_directives: Vec<UpdateAccountEventTypeDirective>,
}

impl PostParameterChangeHookResult {
    /// Check the event type updates only use enabled capabilities
    pub fn check_capabilities(&self, capabilities: &CapabilitySet) -> Result<()> {
        check_schedule_capabilities(&BTreeMap::new(), &self.update_account_event_type_directives, capabilities)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_directives(
            &self.posting_instructions_directives,
            &self.account_notification_directives,
            &self.update_account_event_type_directives,
            "PostParameterChangeHookResult",
        )
    }
}

/// Result of the conversion hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionHookResult {
    /// Schedules for the new contract keyed by event type
    #[serde(default)]
    pub scheduled_events_return_value: BTreeMap<String, ScheduledEvent>,

    /// Postings to make at conversion
    #[serde(default)]
    pub posting_instructions_directives: Vec<PostingInstructionsDirective>,

    /// Notifications to emit
    #[serde(default)]
    pub account_notification_directives: Vec<AccountNotificationDirective>,
}

impl ConversionHookResult {
    /// Check the returned schedules only use enabled capabilities
    pub fn check_capabilities(&self, capabilities: &CapabilitySet) -> Result<()> {
        check_schedule_capabilities(&self.scheduled_events_return_value, &[], capabilities)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        validate_directives(
            &self.posting_instructions_directives,
            &self.account_notification_directives,
            &[],
            "ConversionHookResult",
        )?;
        validate_scheduled_events(&self.scheduled_events_return_value, "ConversionHookResult")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::balances::{Phase, DEFAULT_ADDRESS, DEFAULT_ASSET};
    use crate::types::postings::Posting;
    use crate::capabilities::{ApiVersion, Capability};
    use crate::types::schedules::{EndOfMonthSchedule, ScheduleExpression, ScheduleFailover, ScheduleSkip};
    use rust_decimal_macros::dec;

    fn now() -> TzDateTime {
        TzDateTime::utc(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn directive(batch_id: &str) -> PostingInstructionsDirective {
        let leg = |credit: bool, account: &str| {
            Posting::new(credit, dec!(1), "GBP", account, DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed).unwrap()
        };
        let instruction = CustomInstruction::new(vec![leg(true, "a"), leg(false, "b")]).unwrap();
        PostingInstructionsDirective::new(vec![instruction], Some(now()))
            .unwrap()
            .with_client_batch_id(batch_id)
            .unwrap()
    }

    #[test]
    fn test_arguments_require_utc() {
        let naive = TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap();
        let err = ActivationHookArguments::new(naive.clone()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'effective_datetime' of ActivationHookArguments is not timezone aware."
        );
        assert!(PrePostingHookArguments::new(naive, vec![]).is_err());
        assert!(PrePostingHookArguments::new(now(), vec![]).is_ok());
    }

    #[test]
    fn test_scheduled_event_arguments() {
        assert!(ScheduledEventHookArguments::new(now(), "").is_err());
        let mut args = ScheduledEventHookArguments::new(now(), "ACCRUE_INTEREST").unwrap();
        args.pause_at_datetime = Some(TzDateTime::naive(2024, 2, 1, 0, 0, 0).unwrap());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parameter_change_datetimes_checked() {
        let values = BTreeMap::from([(
            "maturity".to_string(),
            ParameterValue::DateTime(TzDateTime::naive(2025, 1, 1, 0, 0, 0).unwrap()),
        )]);
        let err = PreParameterChangeHookArguments::new(now(), values).unwrap_err();
        assert!(err.to_string().contains("'maturity' of PreParameterChangeHookArguments"));
    }

    #[test]
    fn test_results_reject_duplicate_batch_ids() {
        let result = PostPostingHookResult {
            posting_instructions_directives: vec![directive("B1"), directive("B1")],
            ..Default::default()
        };
        assert!(result
            .validate()
            .unwrap_err()
            .to_string()
            .contains("duplicate value 'B1'"));

        let ok = PostPostingHookResult {
            posting_instructions_directives: vec![directive("B1"), directive("B2")],
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_results_reject_duplicate_event_type_updates() {
        let update = UpdateAccountEventTypeDirective {
            event_type: "ACCRUE_INTEREST".into(),
            skip: Some(ScheduleSkip::Indefinitely),
            ..Default::default()
        };
        let result = ScheduledEventHookResult {
            update_account_event_type_directives: vec![update.clone(), update],
            ..Default::default()
        };
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_activation_result_schedules_validated() {
        let mut result = ActivationHookResult::default();
        result.scheduled_events_return_value.insert(
            "ACCRUE_INTEREST".into(),
            ScheduledEvent::with_expression(now(), ScheduleExpression::daily_at(0, 0, 0).unwrap()).unwrap(),
        );
        assert!(result.validate().is_ok());

        result
            .scheduled_events_return_value
            .insert("BROKEN".into(), ScheduledEvent::default());
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_results_checked_against_capabilities() {
        let old = CapabilitySet::for_version(ApiVersion::V3_12);

        let mut monthly = ScheduledEvent::with_schedule_method(
            now(),
            EndOfMonthSchedule::new(31, 0, 0, 0, ScheduleFailover::default()).unwrap(),
        )
        .unwrap();
        let mut result = ActivationHookResult::default();
        result.scheduled_events_return_value.insert("MONTHLY_FEE".into(), monthly.clone());
        assert!(result.check_capabilities(&old).is_ok());

        monthly.skip = Some(ScheduleSkip::Indefinitely);
        result.scheduled_events_return_value.insert("MONTHLY_FEE".into(), monthly);
        assert!(result.validate().is_ok());
        let err = result.check_capabilities(&old).unwrap_err();
        assert!(err.to_string().contains("ScheduledEvent 'MONTHLY_FEE' requires capability 'schedule_skip'"));
        assert!(result.check_capabilities(&CapabilitySet::default()).is_ok());

        let paused = ScheduledEventHookResult {
            update_account_event_type_directives: vec![UpdateAccountEventTypeDirective {
                event_type: "ACCRUE_INTEREST".into(),
                skip: Some(ScheduleSkip::Indefinitely),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(paused.validate().is_ok());
        assert!(paused.check_capabilities(&old).is_err());
        assert!(paused
            .check_capabilities(&old.clone().with_overrides(&[Capability::ScheduleSkip], &[]))
            .is_ok());
    }

    #[test]
    fn test_rejection() {
        let result = PrePostingHookResult::reject("Wrong denomination", RejectionReason::WrongDenomination).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rejection"]["reason_code"], "WRONG_DENOMINATION");
        assert!(Rejection::new("", RejectionReason::ClientCustomReason).is_err());
    }
}
