//! The contract surface: what a contract sees of the host, and what it implements

use crate::types::{
    ActivationHookArguments, ActivationHookResult, BalanceCoordinate, BalanceTimeseries, BalancesObservation,
    CalendarEvents, ContractMetadata, ConversionHookArguments, ConversionHookResult, CustomInstruction,
    DeactivationHookArguments, DeactivationHookResult, DerivedParameterHookArguments,
    DerivedParameterHookResult, FlagTimeseries, ParameterTimeseries, ParameterValue,
    PostParameterChangeHookArguments, PostParameterChangeHookResult, PostPostingHookArguments,
    PostPostingHookResult, PreParameterChangeHookArguments, PreParameterChangeHookResult,
    PrePostingHookArguments, PrePostingHookResult, ScheduledEventHookArguments, ScheduledEventHookResult,
    Tside,
};
use crate::validation::TzDateTime;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Read-only view of one account, provided by the host for a hook execution.
///
/// The host only provides data the hook declared; anything else is
/// [`Error::MissingData`].
pub trait Vault {
    /// Account the hook runs for
    fn account_id(&self) -> &str;

    /// Accounting side of the account
    fn tside(&self) -> Tside;

    /// Id of the current hook execution
    fn hook_execution_id(&self) -> &str;

    /// Balance history per coordinate
    fn get_balances_timeseries(&self) -> Result<BTreeMap<BalanceCoordinate, BalanceTimeseries>>;

    /// Balances from a declared observation fetcher
    fn get_balances_observation(&self, fetcher_id: &str) -> Result<BalancesObservation>;

    /// History of one parameter
    fn get_parameter_timeseries(&self, name: &str) -> Result<ParameterTimeseries>;

    /// History of one flag
    fn get_flag_timeseries(&self, flag: &str) -> Result<FlagTimeseries>;

    /// Last time `event_type` ran, if ever
    fn get_last_execution_datetime(&self, event_type: &str) -> Result<Option<TzDateTime>>;

    /// Events of the given calendars
    fn get_calendar_events(&self, calendar_ids: &[String]) -> Result<CalendarEvents>;

    /// Account opening time
    fn get_account_creation_datetime(&self) -> Result<TzDateTime>;

    /// Instructions from a declared postings fetcher
    fn get_posting_instructions(&self, fetcher_id: &str) -> Result<Vec<CustomInstruction>>;

    /// Parameter value in force at `at`
    fn get_parameter(&self, name: &str, at: &TzDateTime) -> Result<Option<ParameterValue>> {
        self.get_parameter_timeseries(name)?.at(at, true)
    }

    /// Parameter value in force at `at`, failing when unset
    fn require_parameter(&self, name: &str, at: &TzDateTime) -> Result<ParameterValue> {
        self.get_parameter(name, at)?
            .ok_or_else(|| Error::MissingData(format!("parameter '{}' has no value at {}", name, at)))
    }
}

/// A smart contract: its declarations plus the hooks it implements.
///
/// Every hook defaults to "no result"; contracts override the ones they
/// declare in [`ContractMetadata::hooks`].
pub trait SmartContract {
    /// Contract specific error type
    type Error: std::error::Error + From<Error>;

    /// Static declarations
    fn metadata(&self) -> &ContractMetadata;

    /// Account opened
    fn activation_hook(
        &self,
        _vault: &dyn Vault,
        _args: &ActivationHookArguments,
    ) -> std::result::Result<Option<ActivationHookResult>, Self::Error> {
        Ok(None)
    }

    /// Account closing
    fn deactivation_hook(
        &self,
        _vault: &dyn Vault,
        _args: &DeactivationHookArguments,
    ) -> std::result::Result<Option<DeactivationHookResult>, Self::Error> {
        Ok(None)
    }

    /// Derived parameter values requested
    fn derived_parameter_hook(
        &self,
        _vault: &dyn Vault,
        _args: &DerivedParameterHookArguments,
    ) -> std::result::Result<Option<DerivedParameterHookResult>, Self::Error> {
        Ok(None)
    }

    /// Postings about to be accepted
    fn pre_posting_hook(
        &self,
        _vault: &dyn Vault,
        _args: &PrePostingHookArguments,
    ) -> std::result::Result<Option<PrePostingHookResult>, Self::Error> {
        Ok(None)
    }

    /// Postings accepted
    fn post_posting_hook(
        &self,
        _vault: &dyn Vault,
        _args: &PostPostingHookArguments,
    ) -> std::result::Result<Option<PostPostingHookResult>, Self::Error> {
        Ok(None)
    }

    /// Schedule fired
    fn scheduled_event_hook(
        &self,
        _vault: &dyn Vault,
        _args: &ScheduledEventHookArguments,
    ) -> std::result::Result<Option<ScheduledEventHookResult>, Self::Error> {
        Ok(None)
    }

    /// Parameters about to change
    fn pre_parameter_change_hook(
        &self,
        _vault: &dyn Vault,
        _args: &PreParameterChangeHookArguments,
    ) -> std::result::Result<Option<PreParameterChangeHookResult>, Self::Error> {
        Ok(None)
    }

    /// Parameters changed
    fn post_parameter_change_hook(
        &self,
        _vault: &dyn Vault,
        _args: &PostParameterChangeHookArguments,
    ) -> std::result::Result<Option<PostParameterChangeHookResult>, Self::Error> {
        Ok(None)
    }

    /// Account moving to this contract from another version
    fn conversion_hook(
        &self,
        _vault: &dyn Vault,
        _args: &ConversionHookArguments,
    ) -> std::result::Result<Option<ConversionHookResult>, Self::Error> {
        Ok(None)
    }
}
