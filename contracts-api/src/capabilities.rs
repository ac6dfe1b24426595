//! API versions and capability sets
//!
//! Each API version ships a fixed set of capabilities. Configuration can
//! enable or disable individual capabilities on top of that baseline; the
//! resolved [`CapabilitySet`] is computed once and then only read.

use crate::types::directives::UpdateAccountEventTypeDirective;
use crate::types::schedules::ScheduledEvent;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Contract API version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    /// 3.12.0
    #[serde(rename = "3.12.0")]
    V3_12,
    /// 4.0.0
    #[default]
    #[serde(rename = "4.0.0")]
    V4_0,
}

impl ApiVersion {
    /// Newest supported version
    pub const LATEST: ApiVersion = ApiVersion::V4_0;

    /// Version string
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V3_12 => "3.12.0",
            ApiVersion::V4_0 => "4.0.0",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "3.12.0" | "3.12" => Ok(ApiVersion::V3_12),
            "4.0.0" | "4.0" | "4" => Ok(ApiVersion::V4_0),
            other => Err(Error::Config(format!("Unknown API version '{}'", other))),
        }
    }
}

/// Optional feature of the contract API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Balance and posting data fetchers
    DataFetchers,
    /// Monthly schedules pinned to a day
    EndOfMonthSchedule,
    /// Schedule suspension
    ScheduleSkip,
    /// Optional parameter shapes
    OptionalShape,
    /// Conversion hook
    ConversionHook,
    /// Calendar events in hook requirements
    CalendarEvents,
}

impl Capability {
    /// Every capability
    pub const ALL: [Capability; 6] = [
        Capability::DataFetchers,
        Capability::EndOfMonthSchedule,
        Capability::ScheduleSkip,
        Capability::OptionalShape,
        Capability::ConversionHook,
        Capability::CalendarEvents,
    ];

    /// Config name
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DataFetchers => "data_fetchers",
            Capability::EndOfMonthSchedule => "end_of_month_schedule",
            Capability::ScheduleSkip => "schedule_skip",
            Capability::OptionalShape => "optional_shape",
            Capability::ConversionHook => "conversion_hook",
            Capability::CalendarEvents => "calendar_events",
        }
    }

    /// Capabilities shipped with `version`
    pub fn baseline(version: ApiVersion) -> &'static [Capability] {
        match version {
            ApiVersion::V3_12 => &[
                Capability::EndOfMonthSchedule,
                Capability::OptionalShape,
                Capability::CalendarEvents,
            ],
            ApiVersion::V4_0 => &Capability::ALL,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| Error::Config(format!("Unknown capability '{}'", name)))
    }
}

/// Capabilities resolved for one API version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    version: ApiVersion,
    enabled: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// Baseline set for `version`
    pub fn for_version(version: ApiVersion) -> Self {
        Self {
            version,
            enabled: Capability::baseline(version).iter().copied().collect(),
        }
    }

    /// Apply config overrides; disables win over enables
    pub fn with_overrides(mut self, enable: &[Capability], disable: &[Capability]) -> Self {
        let baseline = Capability::baseline(self.version);
        for capability in enable {
            if !baseline.contains(capability) {
                warn!(
                    capability = %capability,
                    api_version = %self.version,
                    "Enabling capability outside the version baseline"
                );
            }
            self.enabled.insert(*capability);
        }
        for capability in disable {
            self.enabled.remove(capability);
        }
        debug!(
            api_version = %self.version,
            enabled = self.enabled.len(),
            "Resolved capability set"
        );
        self
    }

    /// API version the set was resolved for
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Check if `capability` is enabled
    pub fn contains(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Fail unless `capability` is enabled; `context` names the feature's user
    pub fn require(&self, capability: Capability, context: &str) -> Result<()> {
        if !self.contains(capability) {
            return Err(Error::invalid(format!(
                "{} requires capability '{}' which is not enabled for API version {}.",
                context, capability, self.version
            )));
        }
        Ok(())
    }

    /// Enabled capabilities in order
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.enabled.iter().copied()
    }

    /// Check a schedule only uses enabled schedule features
    pub fn check_scheduled_event(&self, event_type: &str, event: &ScheduledEvent) -> Result<()> {
        if event.schedule_method.is_some() {
            self.require(Capability::EndOfMonthSchedule, &format!("ScheduledEvent '{}'", event_type))?;
        }
        if event.skip.is_some() {
            self.require(Capability::ScheduleSkip, &format!("ScheduledEvent '{}'", event_type))?;
        }
        Ok(())
    }

    /// Check an event type update only uses enabled schedule features
    pub fn check_event_type_update(&self, directive: &UpdateAccountEventTypeDirective) -> Result<()> {
        let context = format!("UpdateAccountEventTypeDirective '{}'", directive.event_type);
        if directive.schedule_method.is_some() {
            self.require(Capability::EndOfMonthSchedule, &context)?;
        }
        if directive.skip.is_some() {
            self.require(Capability::ScheduleSkip, &context)?;
        }
        Ok(())
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::for_version(ApiVersion::LATEST)
    }
}

/// A documented contract API type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Type name
    pub name: String,

    /// Grouping used in documentation
    pub category: String,

    /// One-line description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// (name, category, description, gate)
type TypeSpec = (&'static str, &'static str, &'static str, Option<Capability>);

const TYPES: &[TypeSpec] = &[
    ("Balance", "balances", "Credit, debit and net amounts at one coordinate", None),
    ("BalanceCoordinate", "balances", "Address, asset, denomination and phase", None),
    ("BalanceDefaultDict", "balances", "Balances keyed by coordinate with zero default", None),
    ("BalancesObservation", "balances", "Balances observed at a point in time", None),
    ("Posting", "postings", "Single debit or credit leg", None),
    ("CustomInstruction", "postings", "Zero-net group of postings", None),
    ("TransactionCode", "postings", "Transaction classification", None),
    ("BalanceTimeseries", "timeseries", "Balance history at one coordinate", None),
    ("ParameterTimeseries", "timeseries", "Parameter value history", None),
    ("FlagTimeseries", "timeseries", "Flag activity history", None),
    ("ScheduleExpression", "schedules", "Cron-like schedule", None),
    ("EndOfMonthSchedule", "schedules", "Monthly schedule pinned to a day", Some(Capability::EndOfMonthSchedule)),
    ("ScheduleSkip", "schedules", "Schedule suspension", Some(Capability::ScheduleSkip)),
    ("ScheduledEvent", "schedules", "Schedule for one event type", None),
    ("SmartContractEventType", "schedules", "Event type a contract may schedule", None),
    ("NumberShape", "parameters", "Numeric parameter constraints", None),
    ("StringShape", "parameters", "Free text parameter", None),
    ("AccountIdShape", "parameters", "Account identifier parameter", None),
    ("DateShape", "parameters", "Date parameter constraints", None),
    ("DenominationShape", "parameters", "Denomination parameter constraints", None),
    ("UnionShape", "parameters", "Enumerated choice parameter", None),
    ("OptionalShape", "parameters", "Parameter that may be unset", Some(Capability::OptionalShape)),
    ("Parameter", "parameters", "Parameter declared by a contract", None),
    ("CalendarEvent", "calendars", "Dated event on a named calendar", Some(Capability::CalendarEvents)),
    ("PostingInstructionsDirective", "directives", "Batch of custom instructions", None),
    ("AccountNotificationDirective", "directives", "Notification for downstream consumers", None),
    ("UpdateAccountEventTypeDirective", "directives", "Change to an event type's schedule", None),
    ("Rejection", "hooks", "A hook's refusal", None),
    ("ActivationHookResult", "hooks", "Result of the activation hook", None),
    ("DeactivationHookResult", "hooks", "Result of the deactivation hook", None),
    ("DerivedParameterHookResult", "hooks", "Result of the derived parameter hook", None),
    ("PrePostingHookResult", "hooks", "Result of the pre-posting hook", None),
    ("PostPostingHookResult", "hooks", "Result of the post-posting hook", None),
    ("ScheduledEventHookResult", "hooks", "Result of the scheduled event hook", None),
    ("PreParameterChangeHookResult", "hooks", "Result of the pre-parameter-change hook", None),
    ("PostParameterChangeHookResult", "hooks", "Result of the post-parameter-change hook", None),
    ("ConversionHookResult", "hooks", "Result of the conversion hook", Some(Capability::ConversionHook)),
    ("Requires", "requirements", "Data a hook needs from the vault", None),
    ("FetchAccountData", "requirements", "Fetchers a hook uses", Some(Capability::DataFetchers)),
    ("BalancesObservationFetcher", "fetchers", "Balances at one relative datetime", Some(Capability::DataFetchers)),
    ("BalancesIntervalFetcher", "fetchers", "Balances over a relative interval", Some(Capability::DataFetchers)),
    ("PostingsIntervalFetcher", "fetchers", "Postings over a relative interval", Some(Capability::DataFetchers)),
    ("BalancesFilter", "fetchers", "Addresses a balance fetcher returns", Some(Capability::DataFetchers)),
    ("RelativeDateTime", "fetchers", "Datetime relative to a hook origin", Some(Capability::DataFetchers)),
];

/// Types available to contracts under a capability set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesRegistry {
    /// API version
    pub api_version: ApiVersion,

    /// Enabled capabilities
    pub capabilities: Vec<Capability>,

    /// Available types
    pub types: Vec<TypeEntry>,
}

impl TypesRegistry {
    /// Registry for `capabilities`, with descriptions
    pub fn for_capabilities(capabilities: &CapabilitySet) -> Self {
        Self::build(capabilities, true)
    }

    /// Registry for `capabilities`, optionally with descriptions
    pub fn build(capabilities: &CapabilitySet, include_descriptions: bool) -> Self {
        let types: Vec<TypeEntry> = TYPES
            .iter()
            .filter(|(_, _, _, gate)| gate.map_or(true, |c| capabilities.contains(c)))
            .map(|(name, category, description, _)| TypeEntry {
                name: (*name).to_string(),
                category: (*category).to_string(),
                description: include_descriptions.then(|| (*description).to_string()),
            })
            .collect();

        debug!(
            api_version = %capabilities.version(),
            types = types.len(),
            "Built types registry"
        );

        Self {
            api_version: capabilities.version(),
            capabilities: capabilities.iter().collect(),
            types,
        }
    }

    /// Check if a type is available
    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }
}
