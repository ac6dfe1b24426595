//! Timeseries of (UTC datetime, value) pairs
//!
//! Entries are kept sorted ascending by datetime. Lookups fall back to a
//! type-specific default when no entry qualifies, and every query datetime is
//! checked against the UTC policy before it is used.

use super::balances::Balance;
use super::parameters::ParameterValue;
use crate::validation::{require_utc, TzDateTime};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Value types that can live in a timeseries
pub trait TimeseriesValue: Clone {
    /// Name used in validation errors
    const SERIES_NAME: &'static str;

    /// Returned when no entry qualifies
    fn default_value() -> Self;
}

impl TimeseriesValue for Balance {
    const SERIES_NAME: &'static str = "BalanceTimeseries";

    fn default_value() -> Self {
        Balance::default()
    }
}

impl TimeseriesValue for Option<ParameterValue> {
    const SERIES_NAME: &'static str = "ParameterTimeseries";

    fn default_value() -> Self {
        None
    }
}

impl TimeseriesValue for bool {
    const SERIES_NAME: &'static str = "FlagTimeseries";

    fn default_value() -> Self {
        false
    }
}

/// One timeseries entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesItem<T> {
    /// Entry time
    pub at_datetime: TzDateTime,

    /// Entry value
    pub value: T,
}

impl<T> TimeseriesItem<T> {
    /// Create an entry
    pub fn new(at_datetime: TzDateTime, value: T) -> Self {
        Self { at_datetime, value }
    }
}

/// Ordered sequence of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeseries<T> {
    items: Vec<TimeseriesItem<T>>,
}

/// Balance history at one coordinate
pub type BalanceTimeseries = Timeseries<Balance>;

/// Parameter value history
pub type ParameterTimeseries = Timeseries<Option<ParameterValue>>;

/// Flag activity history
pub type FlagTimeseries = Timeseries<bool>;

impl<T: TimeseriesValue> Timeseries<T> {
    /// Validated constructor: UTC datetimes in ascending order
    pub fn new(items: Vec<TimeseriesItem<T>>) -> Result<Self> {
        let series = Self { items };
        series.validate()?;
        Ok(series)
    }

    /// Trusted constructor for host-provided data
    pub fn from_items_unchecked(items: Vec<TimeseriesItem<T>>) -> Self {
        Self { items }
    }

    /// Empty series
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        for item in &self.items {
            require_utc(&item.at_datetime, "at_datetime", T::SERIES_NAME)?;
        }
        for pair in self.items.windows(2) {
            if pair[1].at_datetime.instant() < pair[0].at_datetime.instant() {
                return Err(Error::invalid(format!(
                    "{} entries must be in ascending datetime order, {} is after {}.",
                    T::SERIES_NAME,
                    pair[0].at_datetime,
                    pair[1].at_datetime
                )));
            }
        }
        Ok(())
    }

    /// Value of the latest entry at or before `at_datetime`.
    ///
    /// With `inclusive = false` an entry exactly at `at_datetime` is skipped.
    pub fn at(&self, at_datetime: &TzDateTime, inclusive: bool) -> Result<T> {
        require_utc(at_datetime, "at_datetime", T::SERIES_NAME)?;
        Ok(self
            .index_at(at_datetime, inclusive)
            .map(|idx| self.items[idx].value.clone())
            .unwrap_or_else(T::default_value))
    }

    /// Value of the entry strictly before `at_datetime`
    pub fn before(&self, at_datetime: &TzDateTime) -> Result<T> {
        self.at(at_datetime, false)
    }

    /// Value of the last entry
    pub fn latest(&self) -> T {
        self.items
            .last()
            .map(|item| item.value.clone())
            .unwrap_or_else(T::default_value)
    }

    /// All entries in order
    pub fn all(&self) -> &[TimeseriesItem<T>] {
        &self.items
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an entry, keeping the ordering invariant
    pub fn push(&mut self, item: TimeseriesItem<T>) -> Result<()> {
        require_utc(&item.at_datetime, "at_datetime", T::SERIES_NAME)?;
        if let Some(last) = self.items.last() {
            if item.at_datetime.instant() < last.at_datetime.instant() {
                return Err(Error::invalid(format!(
                    "{} entries must be in ascending datetime order, {} is after {}.",
                    T::SERIES_NAME,
                    last.at_datetime,
                    item.at_datetime
                )));
            }
        }
        self.items.push(item);
        Ok(())
    }

    fn index_at(&self, at_datetime: &TzDateTime, inclusive: bool) -> Option<usize> {
        let target = at_datetime.instant();
        let count = self.items.partition_point(|item| {
            let t = item.at_datetime.instant();
            if inclusive {
                t <= target
            } else {
                t < target
            }
        });
        count.checked_sub(1)
    }
}

impl<T: TimeseriesValue> Default for Timeseries<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Timeseries of discrete events that also supports range queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscreteTimeseries<T> {
    inner: Timeseries<T>,
}

impl<T: TimeseriesValue> DiscreteTimeseries<T> {
    /// Validated constructor
    pub fn new(items: Vec<TimeseriesItem<T>>) -> Result<Self> {
        Ok(Self {
            inner: Timeseries::new(items)?,
        })
    }

    /// Entries between `start` and `end`, each bound independently inclusive
    pub fn between(
        &self,
        start: &TzDateTime,
        end: &TzDateTime,
        inclusive_start: bool,
        inclusive_end: bool,
    ) -> Result<Vec<TimeseriesItem<T>>> {
        let start_utc = require_utc(start, "start", T::SERIES_NAME)?;
        let end_utc = require_utc(end, "end", T::SERIES_NAME)?;
        if end_utc < start_utc {
            return Err(Error::invalid(format!(
                "'end' of {} must not be before 'start'.",
                T::SERIES_NAME
            )));
        }

        let lower = start.instant();
        let upper = end.instant();
        Ok(self
            .inner
            .all()
            .iter()
            .filter(|item| {
                let t = item.at_datetime.instant();
                let after_start = if inclusive_start { t >= lower } else { t > lower };
                let before_end = if inclusive_end { t <= upper } else { t < upper };
                after_start && before_end
            })
            .cloned()
            .collect())
    }
}

impl<T> Deref for DiscreteTimeseries<T> {
    type Target = Timeseries<T>;

    fn deref(&self) -> &Timeseries<T> {
        &self.inner
    }
}
