//! Datetimes expressed relative to a hook-defined origin
//!
//! Used by data fetchers to describe the window of data a hook needs. The host
//! resolves them; here they are only declared and validated.

use crate::validation::require_in_range;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Origins resolvable by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefinedDateTime {
    /// Latest available data
    Live,
    /// Hook effective datetime
    EffectiveDatetime,
    /// Start of the fetch interval
    IntervalStart,
}

/// Signed calendar offset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Years
    #[serde(default)]
    pub years: Option<i64>,
    /// Months
    #[serde(default)]
    pub months: Option<i64>,
    /// Days
    #[serde(default)]
    pub days: Option<i64>,
    /// Hours
    #[serde(default)]
    pub hours: Option<i64>,
    /// Minutes
    #[serde(default)]
    pub minutes: Option<i64>,
    /// Seconds
    #[serde(default)]
    pub seconds: Option<i64>,
}

impl Shift {
    /// Shift by whole days
    pub fn days(days: i64) -> Self {
        Shift {
            days: Some(days),
            ..Default::default()
        }
    }

    /// Shift by whole months
    pub fn months(months: i64) -> Self {
        Shift {
            months: Some(months),
            ..Default::default()
        }
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        let fields = [self.years, self.months, self.days, self.hours, self.minutes, self.seconds];
        if fields.iter().all(Option::is_none) {
            return Err(Error::invalid("Shift object needs to be populated with at least one attribute."));
        }
        Ok(())
    }
}

fn check_calendar_fields(
    type_name: &str,
    month: Option<i64>,
    day: Option<i64>,
    hour: Option<i64>,
    minute: Option<i64>,
    second: Option<i64>,
) -> Result<()> {
    let fields = [
        ("month", month, 1, 12),
        ("day", day, 1, 31),
        ("hour", hour, 0, 23),
        ("minute", minute, 0, 59),
        ("second", second, 0, 59),
    ];
    for (name, value, min, max) in fields {
        if let Some(value) = value {
            require_in_range(value, min, max, name, type_name)?;
        }
    }
    Ok(())
}

/// Next datetime matching the given fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Next {
    /// Month (1-12)
    #[serde(default)]
    pub month: Option<i64>,
    /// Day (1-31)
    #[serde(default)]
    pub day: Option<i64>,
    /// Hour (0-23)
    #[serde(default)]
    pub hour: Option<i64>,
    /// Minute (0-59)
    #[serde(default)]
    pub minute: Option<i64>,
    /// Second (0-59)
    #[serde(default)]
    pub second: Option<i64>,
}

impl Next {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if [self.month, self.day, self.hour, self.minute, self.second]
            .iter()
            .all(Option::is_none)
        {
            return Err(Error::invalid("Next object needs to be populated with at least one attribute."));
        }
        check_calendar_fields("Next", self.month, self.day, self.hour, self.minute, self.second)
    }
}

/// Previous datetime matching the given fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Previous {
    /// Month (1-12)
    #[serde(default)]
    pub month: Option<i64>,
    /// Day (1-31)
    #[serde(default)]
    pub day: Option<i64>,
    /// Hour (0-23)
    #[serde(default)]
    pub hour: Option<i64>,
    /// Minute (0-59)
    #[serde(default)]
    pub minute: Option<i64>,
    /// Second (0-59)
    #[serde(default)]
    pub second: Option<i64>,
}

impl Previous {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if [self.month, self.day, self.hour, self.minute, self.second]
            .iter()
            .all(Option::is_none)
        {
            return Err(Error::invalid(
                "Previous object needs to be populated with at least one attribute.",
            ));
        }
        check_calendar_fields("Previous", self.month, self.day, self.hour, self.minute, self.second)
    }
}

/// Replace datetime fields outright
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// Year
    #[serde(default)]
    pub year: Option<i64>,
    /// Month (1-12)
    #[serde(default)]
    pub month: Option<i64>,
    /// Day (1-31)
    #[serde(default)]
    pub day: Option<i64>,
    /// Hour (0-23)
    #[serde(default)]
    pub hour: Option<i64>,
    /// Minute (0-59)
    #[serde(default)]
    pub minute: Option<i64>,
    /// Second (0-59)
    #[serde(default)]
    pub second: Option<i64>,
}

impl Override {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        let calendar = [self.month, self.day, self.hour, self.minute, self.second];
        if self.year.is_none() && calendar.iter().all(Option::is_none) {
            return Err(Error::invalid(
                "Override object needs to be populated with at least one attribute.",
            ));
        }
        if let Some(year) = self.year {
            require_in_range(year, 1, 9999, "year", "Override")?;
        }
        check_calendar_fields("Override", self.month, self.day, self.hour, self.minute, self.second)
    }
}

/// Calendar search applied after the shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Find {
    /// Search forwards
    Next(Next),
    /// Search backwards
    Previous(Previous),
    /// Replace fields
    Override(Override),
}

impl Find {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match self {
            Find::Next(next) => next.validate(),
            Find::Previous(previous) => previous.validate(),
            Find::Override(fields) => fields.validate(),
        }
    }
}

/// Origin plus an optional shift and find
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeDateTime {
    /// Starting point
    pub origin: DefinedDateTime,

    /// Offset applied to the origin
    #[serde(default)]
    pub shift: Option<Shift>,

    /// Search applied after the shift
    #[serde(default)]
    pub find: Option<Find>,
}

impl RelativeDateTime {
    /// Validated constructor
    pub fn new(origin: DefinedDateTime, shift: Option<Shift>, find: Option<Find>) -> Result<Self> {
        let relative = Self { origin, shift, find };
        relative.validate()?;
        Ok(relative)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        if self.origin == DefinedDateTime::Live {
            return Err(Error::invalid(
                "RelativeDateTime origin must be EFFECTIVE_DATETIME or INTERVAL_START, currently LIVE.",
            ));
        }
        if self.shift.is_none() && self.find.is_none() {
            return Err(Error::invalid(
                "RelativeDateTime object needs to be populated with at least one of shift or find.",
            ));
        }
        if let Some(shift) = &self.shift {
            shift.validate()?;
        }
        if let Some(find) = &self.find {
            find.validate()?;
        }
        Ok(())
    }
}

/// Fetcher bound: a defined origin or a relative datetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FetchDateTime {
    /// Origin as is
    Defined(DefinedDateTime),
    /// Offset from an origin
    Relative(RelativeDateTime),
}

impl FetchDateTime {
    /// Origin the value is anchored on
    pub fn origin(&self) -> DefinedDateTime {
        match self {
            FetchDateTime::Defined(origin) => *origin,
            FetchDateTime::Relative(relative) => relative.origin,
        }
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match self {
            FetchDateTime::Defined(_) => Ok(()),
            FetchDateTime::Relative(relative) => relative.validate(),
        }
    }
}

impl From<DefinedDateTime> for FetchDateTime {
    fn from(origin: DefinedDateTime) -> Self {
        FetchDateTime::Defined(origin)
    }
}

impl From<RelativeDateTime> for FetchDateTime {
    fn from(relative: RelativeDateTime) -> Self {
        FetchDateTime::Relative(relative)
    }
}
