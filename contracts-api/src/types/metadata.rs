//! Contract-level declarations
//!
//! [`ContractMetadata`] is everything a contract declares statically. Its
//! validation is the only place cross references (fetcher ids, event types,
//! capability use) are checked.

use super::balances::Tside;
use super::parameters::{Parameter, Shape};
use super::requirements::{DataFetcher, HookDeclaration, HookKind};
use super::schedules::SmartContractEventType;
use crate::capabilities::{ApiVersion, Capability, CapabilitySet};
use crate::validation::{require_non_empty, require_unique};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Static declarations of a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    /// API version the contract targets
    pub api_version: ApiVersion,

    /// Contract version (`major.minor.patch`)
    pub version: String,

    /// Accounting side of accounts using this contract
    pub tside: Tside,

    /// Denominations the account may hold
    pub supported_denominations: Vec<String>,

    /// Declared parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Schedulable event types
    #[serde(default)]
    pub event_types: Vec<SmartContractEventType>,

    /// Data fetchers
    #[serde(default)]
    pub data_fetchers: Vec<DataFetcher>,

    /// Hooks the contract implements
    #[serde(default)]
    pub hooks: Vec<HookDeclaration>,
}

impl ContractMetadata {
    /// Declaration of `hook`, if the contract implements it
    pub fn hook(&self, hook: HookKind) -> Option<&HookDeclaration> {
        self.hooks.iter().find(|h| h.hook == hook)
    }

    /// Parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Data fetcher by id
    pub fn data_fetcher(&self, fetcher_id: &str) -> Option<&DataFetcher> {
        self.data_fetchers.iter().find(|f| f.fetcher_id() == fetcher_id)
    }

    /// Check declarations against each other and the enabled capabilities
    pub fn validate(&self, capabilities: &CapabilitySet) -> Result<()> {
        if self.api_version > capabilities.version() {
            return Err(Error::invalid(format!(
                "Contract targets API version {} but the capability set was resolved for {}.",
                self.api_version,
                capabilities.version()
            )));
        }
        check_version(&self.version)?;

        if self.supported_denominations.is_empty() {
            return Err(Error::invalid(
                "'supported_denominations' of ContractMetadata must be a non-empty list.",
            ));
        }
        for denomination in &self.supported_denominations {
            require_non_empty(denomination, "supported_denominations", "ContractMetadata")?;
        }
        require_unique(
            self.supported_denominations.iter().map(String::as_str),
            "supported_denominations",
            "ContractMetadata",
        )?;

        self.validate_parameters(capabilities)?;

        for event_type in &self.event_types {
            event_type.validate()?;
        }
        require_unique(self.event_types.iter().map(|e| e.name.as_str()), "event_types", "ContractMetadata")?;

        if !self.data_fetchers.is_empty() {
            capabilities.require(Capability::DataFetchers, "ContractMetadata.data_fetchers")?;
        }
        for fetcher in &self.data_fetchers {
            fetcher.validate()?;
        }
        require_unique(
            self.data_fetchers.iter().map(DataFetcher::fetcher_id),
            "data_fetchers",
            "ContractMetadata",
        )?;

        self.validate_hooks(capabilities)?;

        debug!(
            version = %self.version,
            parameters = self.parameters.len(),
            hooks = self.hooks.len(),
            "Contract metadata validated"
        );
        Ok(())
    }

    fn validate_parameters(&self, capabilities: &CapabilitySet) -> Result<()> {
        for parameter in &self.parameters {
            parameter.validate()?;
            if uses_optional(&parameter.shape) {
                capabilities.require(
                    Capability::OptionalShape,
                    &format!("Parameter '{}'", parameter.name),
                )?;
            }
        }
        require_unique(self.parameters.iter().map(|p| p.name.as_str()), "parameters", "ContractMetadata")
    }

    fn validate_hooks(&self, capabilities: &CapabilitySet) -> Result<()> {
        let event_types: BTreeSet<&str> = self.event_types.iter().map(|e| e.name.as_str()).collect();

        let mut seen = BTreeSet::new();
        for declaration in &self.hooks {
            if !seen.insert(declaration.hook) {
                return Err(Error::invalid(format!(
                    "Hook {} is declared more than once.",
                    declaration.hook
                )));
            }
            if declaration.hook == HookKind::Conversion {
                capabilities.require(Capability::ConversionHook, "conversion_hook")?;
            }
            declaration.validate()?;

            for requires in &declaration.requires {
                if let Some(event_type) = &requires.event_type {
                    check_event_type(&event_types, event_type, declaration.hook)?;
                }
                for event_type in &requires.last_execution_datetime {
                    check_event_type(&event_types, event_type, declaration.hook)?;
                }
                if !requires.calendar.is_empty() {
                    capabilities.require(
                        Capability::CalendarEvents,
                        &format!("{} requires calendar", declaration.hook),
                    )?;
                }
            }

            for fetch in &declaration.fetch_account_data {
                capabilities.require(
                    Capability::DataFetchers,
                    &format!("{} fetch_account_data", declaration.hook),
                )?;
                if let Some(event_type) = &fetch.event_type {
                    check_event_type(&event_types, event_type, declaration.hook)?;
                }
                for id in &fetch.balances {
                    self.check_fetcher(id, true, declaration.hook)?;
                }
                for id in &fetch.postings {
                    self.check_fetcher(id, false, declaration.hook)?;
                }
            }
        }
        Ok(())
    }

    fn check_fetcher(&self, fetcher_id: &str, balances: bool, hook: HookKind) -> Result<()> {
        let fetcher = self.data_fetcher(fetcher_id).ok_or_else(|| {
            Error::invalid(format!(
                "{} fetches '{}' which is not a declared data fetcher.",
                hook, fetcher_id
            ))
        })?;
        if fetcher.is_balances() != balances {
            let expected = if balances { "balances" } else { "postings" };
            return Err(Error::invalid(format!(
                "{} lists '{}' under {} but it is not a {} fetcher.",
                hook, fetcher_id, expected, expected
            )));
        }
        Ok(())
    }
}

fn uses_optional(shape: &Shape) -> bool {
    matches!(shape, Shape::Optional(_))
}

fn check_event_type(declared: &BTreeSet<&str>, event_type: &str, hook: HookKind) -> Result<()> {
    if !declared.contains(event_type) {
        return Err(Error::invalid(format!(
            "{} refers to event type '{}' which is not declared in event_types.",
            hook, event_type
        )));
    }
    Ok(())
}

fn check_version(version: &str) -> Result<()> {
    let parts: Vec<&str> = version.split('.').collect();
    let valid = parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        return Err(Error::invalid(format!(
            "'version' of ContractMetadata must be in major.minor.patch form, currently '{}'.",
            version
        )));
    }
    Ok(())
}
