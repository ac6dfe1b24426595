//! In-memory [`Vault`] for exercising hooks without a host

use contracts_api::types::{
    Balance, BalanceCoordinate, BalanceTimeseries, BalancesObservation, CalendarEvent, CalendarEvents,
    CustomInstruction, FlagTimeseries, ParameterTimeseries, ParameterValue, Timeseries, TimeseriesItem, Tside,
};
use contracts_api::{Error, Result, TzDateTime, Vault};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Account state held in memory.
///
/// Only data added through the builder methods is available; everything else
/// reads as [`Error::MissingData`], mirroring a host that was not asked for it.
#[derive(Debug, Clone)]
pub struct MockVault {
    account_id: String,
    tside: Tside,
    hook_execution_id: String,
    creation_datetime: TzDateTime,
    balances: BTreeMap<BalanceCoordinate, BalanceTimeseries>,
    parameters: BTreeMap<String, ParameterTimeseries>,
    flags: BTreeMap<String, FlagTimeseries>,
    last_execution: BTreeMap<String, TzDateTime>,
    calendar_events: Vec<CalendarEvent>,
    observations: BTreeMap<String, BalancesObservation>,
    postings: BTreeMap<String, Vec<CustomInstruction>>,
}

impl MockVault {
    /// Empty liability-side account opened at `creation_datetime`
    pub fn new(account_id: impl Into<String>, creation_datetime: TzDateTime) -> Self {
        Self {
            account_id: account_id.into(),
            tside: Tside::Liability,
            hook_execution_id: Uuid::new_v4().to_string(),
            creation_datetime,
            balances: BTreeMap::new(),
            parameters: BTreeMap::new(),
            flags: BTreeMap::new(),
            last_execution: BTreeMap::new(),
            calendar_events: Vec::new(),
            observations: BTreeMap::new(),
            postings: BTreeMap::new(),
        }
    }

    /// Change the accounting side
    pub fn with_tside(mut self, tside: Tside) -> Self {
        self.tside = tside;
        self
    }

    /// Set a parameter from account creation onwards
    pub fn with_parameter(self, name: &str, value: impl Into<ParameterValue>) -> Result<Self> {
        let at = self.creation_datetime.clone();
        self.with_parameter_at(name, at, value)
    }

    /// Set a parameter from `at` onwards; calls must be in time order per name
    pub fn with_parameter_at(mut self, name: &str, at: TzDateTime, value: impl Into<ParameterValue>) -> Result<Self> {
        self.parameters
            .entry(name.to_string())
            .or_insert_with(Timeseries::empty)
            .push(TimeseriesItem::new(at, Some(value.into())))?;
        Ok(self)
    }

    /// Record a balance from `at` onwards; calls must be in time order per coordinate
    pub fn with_balance(mut self, coordinate: BalanceCoordinate, at: TzDateTime, balance: Balance) -> Result<Self> {
        coordinate.validate()?;
        self.balances
            .entry(coordinate)
            .or_insert_with(Timeseries::empty)
            .push(TimeseriesItem::new(at, balance))?;
        Ok(self)
    }

    /// Set a flag from `at` onwards
    pub fn with_flag(mut self, flag: &str, at: TzDateTime, active: bool) -> Result<Self> {
        self.flags
            .entry(flag.to_string())
            .or_insert_with(Timeseries::empty)
            .push(TimeseriesItem::new(at, active))?;
        Ok(self)
    }

    /// Record the last run of `event_type`
    pub fn with_last_execution(mut self, event_type: &str, at: TzDateTime) -> Self {
        self.last_execution.insert(event_type.to_string(), at);
        self
    }

    /// Add a calendar event
    pub fn with_calendar_event(mut self, event: CalendarEvent) -> Result<Self> {
        event.validate()?;
        self.calendar_events.push(event);
        Ok(self)
    }

    /// Provide the result of a balances observation fetcher
    pub fn with_observation(mut self, fetcher_id: &str, observation: BalancesObservation) -> Self {
        self.observations.insert(fetcher_id.to_string(), observation);
        self
    }

    /// Provide the result of a postings fetcher
    pub fn with_posting_instructions(mut self, fetcher_id: &str, instructions: Vec<CustomInstruction>) -> Self {
        self.postings.insert(fetcher_id.to_string(), instructions);
        self
    }
}

impl Vault for MockVault {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn tside(&self) -> Tside {
        self.tside
    }

    fn hook_execution_id(&self) -> &str {
        &self.hook_execution_id
    }

    fn get_balances_timeseries(&self) -> Result<BTreeMap<BalanceCoordinate, BalanceTimeseries>> {
        Ok(self.balances.clone())
    }

    fn get_balances_observation(&self, fetcher_id: &str) -> Result<BalancesObservation> {
        self.observations
            .get(fetcher_id)
            .cloned()
            .ok_or_else(|| Error::MissingData(format!("balances observation '{}'", fetcher_id)))
    }

    fn get_parameter_timeseries(&self, name: &str) -> Result<ParameterTimeseries> {
        debug!(account_id = %self.account_id, parameter = name, "Parameter requested");
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingData(format!("parameter '{}'", name)))
    }

    fn get_flag_timeseries(&self, flag: &str) -> Result<FlagTimeseries> {
        self.flags
            .get(flag)
            .cloned()
            .ok_or_else(|| Error::MissingData(format!("flag '{}'", flag)))
    }

    fn get_last_execution_datetime(&self, event_type: &str) -> Result<Option<TzDateTime>> {
        Ok(self.last_execution.get(event_type).cloned())
    }

    fn get_calendar_events(&self, calendar_ids: &[String]) -> Result<CalendarEvents> {
        CalendarEvents::new(
            self.calendar_events
                .iter()
                .filter(|event| calendar_ids.contains(&event.calendar_id))
                .cloned()
                .collect(),
        )
    }

    fn get_account_creation_datetime(&self) -> Result<TzDateTime> {
        Ok(self.creation_datetime.clone())
    }

    fn get_posting_instructions(&self, fetcher_id: &str) -> Result<Vec<CustomInstruction>> {
        self.postings
            .get(fetcher_id)
            .cloned()
            .ok_or_else(|| Error::MissingData(format!("postings fetcher '{}'", fetcher_id)))
    }
}
