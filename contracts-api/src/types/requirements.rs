//! Hook data requirements
//!
//! A hook declares up front which vault data it reads: `Requires` covers
//! parameters, flags, history windows and calendars, `FetchAccountData` names
//! the data fetchers it uses. The host provides exactly that data.

use super::relative::{DefinedDateTime, FetchDateTime};
use crate::validation::{require_non_empty, require_unique};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much history a hook needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HistoryWindow {
    /// Latest value at the effective datetime
    Latest,
    /// Latest value including postings after the effective datetime
    LatestLive,
    /// Whole days back from the effective datetime
    Days(u32),
    /// Whole months back from the effective datetime
    Months(u32),
    /// Whole years back from the effective datetime
    Years(u32),
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: u32| if n == 1 { "" } else { "s" };
        match self {
            HistoryWindow::Latest => write!(f, "latest"),
            HistoryWindow::LatestLive => write!(f, "latest live"),
            HistoryWindow::Days(n) => write!(f, "{} day{}", n, plural(*n)),
            HistoryWindow::Months(n) => write!(f, "{} month{}", n, plural(*n)),
            HistoryWindow::Years(n) => write!(f, "{} year{}", n, plural(*n)),
        }
    }
}

impl FromStr for HistoryWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        match text {
            "latest" => return Ok(HistoryWindow::Latest),
            "latest live" => return Ok(HistoryWindow::LatestLive),
            _ => {}
        }

        let invalid = || {
            Error::invalid(format!(
                "Invalid history window '{}', expected 'latest', 'latest live' or '<n> days|months|years'.",
                text
            ))
        };
        let (count, unit) = text.split_once(' ').ok_or_else(invalid)?;
        let count: u32 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        match unit.strip_suffix('s').unwrap_or(unit) {
            "day" => Ok(HistoryWindow::Days(count)),
            "month" => Ok(HistoryWindow::Months(count)),
            "year" => Ok(HistoryWindow::Years(count)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for HistoryWindow {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HistoryWindow> for String {
    fn from(window: HistoryWindow) -> String {
        window.to_string()
    }
}

/// Vault data a hook reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requires {
    /// Event type this requirement applies to (scheduled hook only)
    #[serde(default)]
    pub event_type: Option<String>,

    /// Parameter timeseries
    #[serde(default)]
    pub parameters: bool,

    /// Flag timeseries
    #[serde(default)]
    pub flags: bool,

    /// Balance history
    #[serde(default)]
    pub balances: Option<HistoryWindow>,

    /// Posting history
    #[serde(default)]
    pub postings: Option<HistoryWindow>,

    /// Event types whose last execution time is read
    #[serde(default)]
    pub last_execution_datetime: Vec<String>,

    /// Calendars whose events are read
    #[serde(default)]
    pub calendar: Vec<String>,
}

impl Requires {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if let Some(event_type) = &self.event_type {
            require_non_empty(event_type, "event_type", "Requires")?;
        }
        for name in &self.last_execution_datetime {
            require_non_empty(name, "last_execution_datetime", "Requires")?;
        }
        require_unique(
            self.last_execution_datetime.iter().map(String::as_str),
            "last_execution_datetime",
            "Requires",
        )?;
        for calendar in &self.calendar {
            require_non_empty(calendar, "calendar", "Requires")?;
        }
        require_unique(self.calendar.iter().map(String::as_str), "calendar", "Requires")
    }
}

/// Data fetchers a hook uses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchAccountData {
    /// Event type this applies to (scheduled hook only)
    #[serde(default)]
    pub event_type: Option<String>,

    /// Balance fetcher ids
    #[serde(default)]
    pub balances: Vec<String>,

    /// Posting fetcher ids
    #[serde(default)]
    pub postings: Vec<String>,
}

impl FetchAccountData {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if let Some(event_type) = &self.event_type {
            require_non_empty(event_type, "event_type", "FetchAccountData")?;
        }
        if self.balances.is_empty() && self.postings.is_empty() {
            return Err(Error::invalid(
                "FetchAccountData must name at least one balances or postings fetcher.",
            ));
        }
        for id in self.balances.iter().chain(&self.postings) {
            require_non_empty(id, "fetcher_id", "FetchAccountData")?;
        }
        require_unique(self.balances.iter().map(String::as_str), "balances", "FetchAccountData")?;
        require_unique(self.postings.iter().map(String::as_str), "postings", "FetchAccountData")
    }
}

/// Addresses a balance fetcher returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesFilter {
    /// Account addresses
    pub addresses: Vec<String>,
}

impl BalancesFilter {
    /// Validated constructor
    pub fn new<I, S>(addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(Error::invalid("'addresses' of BalancesFilter must be a non-empty list."));
        }
        for address in &self.addresses {
            require_non_empty(address, "addresses", "BalancesFilter")?;
        }
        require_unique(self.addresses.iter().map(String::as_str), "addresses", "BalancesFilter")
    }

    /// Check if `address` passes the filter
    pub fn allows(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }
}

fn check_interval(fetcher_id: &str, start: &FetchDateTime, end: &FetchDateTime, type_name: &str) -> Result<()> {
    require_non_empty(fetcher_id, "fetcher_id", type_name)?;
    match start.origin() {
        DefinedDateTime::Live => {
            return Err(Error::invalid(format!(
                "'start' of {} '{}' cannot be LIVE.",
                type_name, fetcher_id
            )))
        }
        DefinedDateTime::IntervalStart => {
            return Err(Error::invalid(format!(
                "'start' of {} '{}' cannot be relative to INTERVAL_START.",
                type_name, fetcher_id
            )))
        }
        DefinedDateTime::EffectiveDatetime => {}
    }
    start.validate()?;
    end.validate()
}

/// Balances at one datetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesObservationFetcher {
    /// Fetcher id
    pub fetcher_id: String,

    /// Observation datetime
    pub at: FetchDateTime,

    /// Address filter
    #[serde(default)]
    pub filter: Option<BalancesFilter>,
}

impl BalancesObservationFetcher {
    /// Validated constructor
    pub fn new(fetcher_id: impl Into<String>, at: impl Into<FetchDateTime>, filter: Option<BalancesFilter>) -> Result<Self> {
        let fetcher = Self {
            fetcher_id: fetcher_id.into(),
            at: at.into(),
            filter,
        };
        fetcher.validate()?;
        Ok(fetcher)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.fetcher_id, "fetcher_id", "BalancesObservationFetcher")?;
        if self.at.origin() == DefinedDateTime::IntervalStart {
            return Err(Error::invalid(format!(
                "'at' of BalancesObservationFetcher '{}' cannot use INTERVAL_START.",
                self.fetcher_id
            )));
        }
        self.at.validate()?;
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        Ok(())
    }
}

fn live() -> FetchDateTime {
    FetchDateTime::Defined(DefinedDateTime::Live)
}

/// Balances over an interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesIntervalFetcher {
    /// Fetcher id
    pub fetcher_id: String,

    /// Interval start
    pub start: FetchDateTime,

    /// Interval end
    #[serde(default = "live")]
    pub end: FetchDateTime,

    /// Address filter
    #[serde(default)]
    pub filter: Option<BalancesFilter>,
}

impl BalancesIntervalFetcher {
    /// Validated constructor
    pub fn new(
        fetcher_id: impl Into<String>,
        start: impl Into<FetchDateTime>,
        end: impl Into<FetchDateTime>,
        filter: Option<BalancesFilter>,
    ) -> Result<Self> {
        let fetcher = Self {
            fetcher_id: fetcher_id.into(),
            start: start.into(),
            end: end.into(),
            filter,
        };
        fetcher.validate()?;
        Ok(fetcher)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        check_interval(&self.fetcher_id, &self.start, &self.end, "BalancesIntervalFetcher")?;
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        Ok(())
    }
}

/// Postings over an interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingsIntervalFetcher {
    /// Fetcher id
    pub fetcher_id: String,

    /// Interval start
    pub start: FetchDateTime,

    /// Interval end
    #[serde(default = "live")]
    pub end: FetchDateTime,
}

impl PostingsIntervalFetcher {
    /// Validated constructor
    pub fn new(fetcher_id: impl Into<String>, start: impl Into<FetchDateTime>, end: impl Into<FetchDateTime>) -> Result<Self> {
        let fetcher = Self {
            fetcher_id: fetcher_id.into(),
            start: start.into(),
            end: end.into(),
        };
        fetcher.validate()?;
        Ok(fetcher)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        check_interval(&self.fetcher_id, &self.start, &self.end, "PostingsIntervalFetcher")
    }
}

/// Any data fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataFetcher {
    /// Balances at a datetime
    BalancesObservation(BalancesObservationFetcher),
    /// Balances over an interval
    BalancesInterval(BalancesIntervalFetcher),
    /// Postings over an interval
    PostingsInterval(PostingsIntervalFetcher),
}

impl DataFetcher {
    /// Fetcher id
    pub fn fetcher_id(&self) -> &str {
        match self {
            DataFetcher::BalancesObservation(f) => &f.fetcher_id,
            DataFetcher::BalancesInterval(f) => &f.fetcher_id,
            DataFetcher::PostingsInterval(f) => &f.fetcher_id,
        }
    }

    /// Check if the fetcher returns balances
    pub fn is_balances(&self) -> bool {
        !matches!(self, DataFetcher::PostingsInterval(_))
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match self {
            DataFetcher::BalancesObservation(f) => f.validate(),
            DataFetcher::BalancesInterval(f) => f.validate(),
            DataFetcher::PostingsInterval(f) => f.validate(),
        }
    }
}

impl From<BalancesObservationFetcher> for DataFetcher {
    fn from(fetcher: BalancesObservationFetcher) -> Self {
        DataFetcher::BalancesObservation(fetcher)
    }
}

impl From<BalancesIntervalFetcher> for DataFetcher {
    fn from(fetcher: BalancesIntervalFetcher) -> Self {
        DataFetcher::BalancesInterval(fetcher)
    }
}

impl From<PostingsIntervalFetcher> for DataFetcher {
    fn from(fetcher: PostingsIntervalFetcher) -> Self {
        DataFetcher::PostingsInterval(fetcher)
    }
}

/// Contract hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Account opened
    Activation,
    /// Account closing
    Deactivation,
    /// Derived parameters requested
    DerivedParameter,
    /// Postings about to be accepted
    PrePosting,
    /// Postings accepted
    PostPosting,
    /// Schedule fired
    ScheduledEvent,
    /// Parameters about to change
    PreParameterChange,
    /// Parameters changed
    PostParameterChange,
    /// Account moving to a new contract version
    Conversion,
}

impl HookKind {
    /// Hook function name
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Activation => "activation_hook",
            HookKind::Deactivation => "deactivation_hook",
            HookKind::DerivedParameter => "derived_parameter_hook",
            HookKind::PrePosting => "pre_posting_hook",
            HookKind::PostPosting => "post_posting_hook",
            HookKind::ScheduledEvent => "scheduled_event_hook",
            HookKind::PreParameterChange => "pre_parameter_change_hook",
            HookKind::PostParameterChange => "post_parameter_change_hook",
            HookKind::Conversion => "conversion_hook",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requirements declared by one hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDeclaration {
    /// Hook
    pub hook: HookKind,

    /// `requires` declarations
    #[serde(default)]
    pub requires: Vec<Requires>,

    /// `fetch_account_data` declarations
    #[serde(default)]
    pub fetch_account_data: Vec<FetchAccountData>,
}

impl HookDeclaration {
    /// Declaration with no data requirements
    pub fn new(hook: HookKind) -> Self {
        Self {
            hook,
            requires: Vec::new(),
            fetch_account_data: Vec::new(),
        }
    }

    /// Add a `requires` declaration
    pub fn requires(mut self, requires: Requires) -> Self {
        self.requires.push(requires);
        self
    }

    /// Add a `fetch_account_data` declaration
    pub fn fetch_account_data(mut self, fetch: FetchAccountData) -> Self {
        self.fetch_account_data.push(fetch);
        self
    }

    /// Check declarations in isolation; cross references are checked by the metadata
    pub fn validate(&self) -> Result<()> {
        let scheduled = self.hook == HookKind::ScheduledEvent;
        let event_types = self
            .requires
            .iter()
            .map(|r| r.event_type.as_deref())
            .chain(self.fetch_account_data.iter().map(|f| f.event_type.as_deref()));

        for event_type in event_types {
            match (scheduled, event_type) {
                (true, None) => {
                    return Err(Error::invalid(format!(
                        "Declarations on {} must name an event_type.",
                        self.hook
                    )))
                }
                (false, Some(event_type)) => {
                    return Err(Error::invalid(format!(
                        "Declarations on {} cannot name an event_type, got '{}'.",
                        self.hook, event_type
                    )))
                }
                _ => {}
            }
        }

        for requires in &self.requires {
            requires.validate()?;
        }
        for fetch in &self.fetch_account_data {
            fetch.validate()?;
        }

        let context = format!("{} requires", self.hook);
        require_unique(
            self.requires.iter().map(|r| r.event_type.as_deref().unwrap_or("")),
            "event_type",
            &context,
        )?;
        let context = format!("{} fetch_account_data", self.hook);
        require_unique(
            self.fetch_account_data
                .iter()
                .map(|f| f.event_type.as_deref().unwrap_or("")),
            "event_type",
            &context,
        )
    }

    /// `requires` for an event type (`None` outside the scheduled hook)
    pub fn requires_for(&self, event_type: Option<&str>) -> Option<&Requires> {
        self.requires.iter().find(|r| r.event_type.as_deref() == event_type)
    }

    /// `fetch_account_data` for an event type (`None` outside the scheduled hook)
    pub fn fetch_for(&self, event_type: Option<&str>) -> Option<&FetchAccountData> {
        self.fetch_account_data
            .iter()
            .find(|f| f.event_type.as_deref() == event_type)
    }
}
