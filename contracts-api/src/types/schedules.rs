//! Declarative schedule descriptors
//!
//! These describe when the host scheduler should fire an event type. Nothing
//! here executes a schedule.

use crate::validation::{
    require_in_range, require_non_empty, require_optional_utc, require_unique, require_utc, TzDateTime,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cron-like schedule field: a number or a cron fragment (`"1-5"`, `"*/2"`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleField {
    /// Exact value
    Int(i64),
    /// Cron fragment
    Cron(String),
}

impl ScheduleField {
    fn validate(&self, field: &str, min: i64, max: i64) -> Result<()> {
        match self {
            ScheduleField::Int(value) => require_in_range(*value, min, max, field, "ScheduleExpression"),
            ScheduleField::Cron(fragment) => {
                require_non_empty(fragment, field, "ScheduleExpression")?;
                let invalid = || {
                    Error::invalid(format!(
                        "'{}' of ScheduleExpression has invalid cron value '{}'.",
                        field, fragment
                    ))
                };
                for item in fragment.split(',') {
                    check_cron_item(item, field, min, max).ok_or_else(invalid)??;
                }
                Ok(())
            }
        }
    }
}

/// One comma-separated cron item: `*`, `a` or `a-b`, optionally followed by `/step`.
///
/// `None` means the item is malformed; numbers outside `min..=max` are range errors.
fn check_cron_item(item: &str, field: &str, min: i64, max: i64) -> Option<Result<()>> {
    let number = |text: &str| -> Option<i64> {
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        text.parse().ok()
    };

    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(number(step)?)),
        None => (item, None),
    };
    if step == Some(0) {
        return None;
    }

    let bounds = if range == "*" {
        Vec::new()
    } else if let Some((start, end)) = range.split_once('-') {
        let (start, end) = (number(start)?, number(end)?);
        if start > end {
            return None;
        }
        vec![start, end]
    } else {
        vec![number(range)?]
    };

    for value in bounds {
        if let Err(err) = require_in_range(value, min, max, field, "ScheduleExpression") {
            return Some(Err(err));
        }
    }
    Some(Ok(()))
}

impl fmt::Display for ScheduleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleField::Int(value) => write!(f, "{}", value),
            ScheduleField::Cron(fragment) => write!(f, "{}", fragment),
        }
    }
}

impl From<i64> for ScheduleField {
    fn from(value: i64) -> Self {
        ScheduleField::Int(value)
    }
}

impl From<&str> for ScheduleField {
    fn from(value: &str) -> Self {
        ScheduleField::Cron(value.to_string())
    }
}

/// Cron-like schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExpression {
    /// Day of month
    #[serde(default)]
    pub day: Option<ScheduleField>,

    /// Day of week, 0 = Monday
    #[serde(default)]
    pub day_of_week: Option<ScheduleField>,

    /// Hour
    #[serde(default)]
    pub hour: Option<ScheduleField>,

    /// Minute
    #[serde(default)]
    pub minute: Option<ScheduleField>,

    /// Second
    #[serde(default)]
    pub second: Option<ScheduleField>,

    /// Month
    #[serde(default)]
    pub month: Option<ScheduleField>,

    /// Year
    #[serde(default)]
    pub year: Option<ScheduleField>,
}

impl ScheduleExpression {
    /// Every day at the given time
    pub fn daily_at(hour: i64, minute: i64, second: i64) -> Result<Self> {
        ScheduleExpression {
            hour: Some(hour.into()),
            minute: Some(minute.into()),
            second: Some(second.into()),
            ..Default::default()
        }
        .validated()
    }

    /// Validate and return self
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        let fields: [(&str, &Option<ScheduleField>, i64, i64); 7] = [
            ("day", &self.day, 1, 31),
            ("day_of_week", &self.day_of_week, 0, 6),
            ("hour", &self.hour, 0, 23),
            ("minute", &self.minute, 0, 59),
            ("second", &self.second, 0, 59),
            ("month", &self.month, 1, 12),
            ("year", &self.year, 1, 9999),
        ];

        if fields.iter().all(|(_, value, _, _)| value.is_none()) {
            return Err(Error::invalid(
                "ScheduleExpression must define at least one of day, day_of_week, hour, minute, second, month or year.",
            ));
        }

        for (name, value, min, max) in fields {
            if let Some(value) = value {
                value.validate(name, min, max)?;
            }
        }
        Ok(())
    }

    /// Cron rendering: `second minute hour day month day_of_week year`
    pub fn to_cron(&self) -> String {
        let render = |field: &Option<ScheduleField>| {
            field.as_ref().map(|f| f.to_string()).unwrap_or_else(|| "*".to_string())
        };
        [
            &self.second,
            &self.minute,
            &self.hour,
            &self.day,
            &self.month,
            &self.day_of_week,
            &self.year,
        ]
        .iter()
        .map(|f| render(*f))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// What to do when the requested day does not exist in a month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleFailover {
    /// Use the last valid day before
    #[default]
    FirstValidDayBefore,
    /// Use the first valid day after
    FirstValidDayAfter,
}

/// Monthly schedule pinned to a day of the month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndOfMonthSchedule {
    /// Day of month (1-31)
    pub day: i64,

    /// Hour (0-23)
    #[serde(default)]
    pub hour: i64,

    /// Minute (0-59)
    #[serde(default)]
    pub minute: i64,

    /// Second (0-59)
    #[serde(default)]
    pub second: i64,

    /// Failover for short months
    #[serde(default)]
    pub failover: ScheduleFailover,
}

impl EndOfMonthSchedule {
    /// Validated constructor
    pub fn new(day: i64, hour: i64, minute: i64, second: i64, failover: ScheduleFailover) -> Result<Self> {
        let schedule = Self {
            day,
            hour,
            minute,
            second,
            failover,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_in_range(self.day, 1, 31, "day", "EndOfMonthSchedule")?;
        require_in_range(self.hour, 0, 23, "hour", "EndOfMonthSchedule")?;
        require_in_range(self.minute, 0, 59, "minute", "EndOfMonthSchedule")?;
        require_in_range(self.second, 0, 59, "second", "EndOfMonthSchedule")?;
        Ok(())
    }
}

/// Suspension of a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleSkip {
    /// Skip until re-enabled
    Indefinitely,
    /// Skip every occurrence up to `end`
    Until {
        /// Last skipped instant
        end: TzDateTime,
    },
}

impl ScheduleSkip {
    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match self {
            ScheduleSkip::Indefinitely => Ok(()),
            ScheduleSkip::Until { end } => require_utc(end, "end", "ScheduleSkip").map(|_| ()),
        }
    }
}

/// A schedule returned to the host for one event type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// First possible firing
    #[serde(default)]
    pub start_datetime: Option<TzDateTime>,

    /// Last possible firing
    #[serde(default)]
    pub end_datetime: Option<TzDateTime>,

    /// Cron-like schedule
    #[serde(default)]
    pub expression: Option<ScheduleExpression>,

    /// Monthly schedule
    #[serde(default)]
    pub schedule_method: Option<EndOfMonthSchedule>,

    /// Suspension
    #[serde(default)]
    pub skip: Option<ScheduleSkip>,
}

impl ScheduledEvent {
    /// Event driven by a cron-like expression
    pub fn with_expression(start_datetime: TzDateTime, expression: ScheduleExpression) -> Result<Self> {
        ScheduledEvent {
            start_datetime: Some(start_datetime),
            expression: Some(expression),
            ..Default::default()
        }
        .validated()
    }

    /// Event driven by a monthly schedule
    pub fn with_schedule_method(start_datetime: TzDateTime, schedule_method: EndOfMonthSchedule) -> Result<Self> {
        ScheduledEvent {
            start_datetime: Some(start_datetime),
            schedule_method: Some(schedule_method),
            ..Default::default()
        }
        .validated()
    }

    /// Validate and return self
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        let start = require_optional_utc(self.start_datetime.as_ref(), "start_datetime", "ScheduledEvent")?;
        let end = require_optional_utc(self.end_datetime.as_ref(), "end_datetime", "ScheduledEvent")?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(Error::invalid(
                    "'end_datetime' of ScheduledEvent must not be before 'start_datetime'.",
                ));
            }
        }

        match (&self.expression, &self.schedule_method) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid(
                    "ScheduledEvent cannot contain both expression and schedule_method.",
                ))
            }
            (None, None) => {
                return Err(Error::invalid(
                    "ScheduledEvent must contain either expression or schedule_method.",
                ))
            }
            (Some(expression), None) => expression.validate()?,
            (None, Some(method)) => method.validate()?,
        }

        if let Some(skip) = &self.skip {
            skip.validate()?;
        }
        Ok(())
    }
}

/// Event type a contract may schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartContractEventType {
    /// Event type name
    pub name: String,

    /// Scheduler tags used to group executions
    #[serde(default)]
    pub scheduler_tag_ids: Vec<String>,
}

impl SmartContractEventType {
    /// Validated constructor
    pub fn new(name: impl Into<String>, scheduler_tag_ids: Vec<String>) -> Result<Self> {
        let event_type = Self {
            name: name.into(),
            scheduler_tag_ids,
        };
        event_type.validate()?;
        Ok(event_type)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.name, "name", "SmartContractEventType")?;
        for tag in &self.scheduler_tag_ids {
            require_non_empty(tag, "scheduler_tag_ids", "SmartContractEventType")?;
        }
        require_unique(
            self.scheduler_tag_ids.iter().map(String::as_str),
            "scheduler_tag_ids",
            "SmartContractEventType",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> TzDateTime {
        TzDateTime::utc(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_end_of_month_day_out_of_range() {
        let err = EndOfMonthSchedule::new(32, 0, 0, 0, ScheduleFailover::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument day of EndOfMonthSchedule object is out of range(1-31)."
        );
        assert!(EndOfMonthSchedule::new(0, 0, 0, 0, ScheduleFailover::default()).is_err());
        let err = EndOfMonthSchedule::new(-1, 0, 0, 0, ScheduleFailover::default()).unwrap_err();
        assert!(err.to_string().contains("out of range(1-31)"));
        assert!(EndOfMonthSchedule::new(31, 23, 59, 59, ScheduleFailover::FirstValidDayAfter).is_ok());
    }

    #[test]
    fn test_end_of_month_hour_out_of_range() {
        let err = EndOfMonthSchedule::new(1, 24, 0, 0, ScheduleFailover::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument hour of EndOfMonthSchedule object is out of range(0-23)."
        );
    }

    #[test]
    fn test_expression_requires_a_field() {
        let err = ScheduleExpression::default().validated().unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_expression_cron_fragments() {
        let expression = ScheduleExpression {
            day_of_week: Some("0-4".into()),
            hour: Some("*/6".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(expression.to_cron(), "* * */6 * * 0-4 *");

        let err = ScheduleExpression {
            hour: Some("noon".into()),
            ..Default::default()
        }
        .validated()
        .unwrap_err();
        assert!(err.to_string().contains("invalid cron value 'noon'"));
    }

    #[test]
    fn test_cron_fragments_checked_against_field_range() {
        let minute = |fragment: &str| {
            ScheduleExpression {
                minute: Some(fragment.into()),
                ..Default::default()
            }
            .validated()
        };

        for accepted in ["1-5", "*/15", "0,30", "*", "0-59/5", "59"] {
            assert!(minute(accepted).is_ok(), "{}", accepted);
        }

        let err = minute("99").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument minute of ScheduleExpression object is out of range(0-59)."
        );
        assert!(minute("0,60").is_err());
        assert!(minute("50-70").is_err());

        for malformed in ["---", "1-", "*/0", "5-1", ",", "1,,2", "*/", "**", "1/2/3"] {
            let err = minute(malformed).unwrap_err();
            assert!(err.to_string().contains("invalid cron value"), "{}", malformed);
        }
    }

    #[test]
    fn test_scheduled_event_exclusive_fields() {
        let both = ScheduledEvent {
            start_datetime: Some(start()),
            expression: Some(ScheduleExpression::daily_at(0, 0, 0).unwrap()),
            schedule_method: Some(EndOfMonthSchedule::new(28, 0, 0, 0, ScheduleFailover::default()).unwrap()),
            ..Default::default()
        };
        assert!(both.validate().unwrap_err().to_string().contains("cannot contain both"));

        let neither = ScheduledEvent {
            start_datetime: Some(start()),
            ..Default::default()
        };
        assert!(neither.validate().unwrap_err().to_string().contains("must contain either"));
    }

    #[test]
    fn test_scheduled_event_timezones() {
        let naive = TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap();
        let err = ScheduledEvent::with_expression(naive, ScheduleExpression::daily_at(0, 0, 0).unwrap())
            .unwrap_err();
        assert_eq!(err.to_string(), "'start_datetime' of ScheduledEvent is not timezone aware.");
    }

    #[test]
    fn test_scheduled_event_end_before_start() {
        let event = ScheduledEvent {
            start_datetime: Some(start()),
            end_datetime: Some(TzDateTime::utc(2023, 12, 31, 0, 0, 0).unwrap()),
            expression: Some(ScheduleExpression::daily_at(0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_skip_until_requires_utc() {
        let skip = ScheduleSkip::Until {
            end: TzDateTime::naive(2024, 2, 1, 0, 0, 0).unwrap(),
        };
        assert!(skip.validate().is_err());
        assert!(ScheduleSkip::Indefinitely.validate().is_ok());
    }

    #[test]
    fn test_event_type_duplicate_tags() {
        let err = SmartContractEventType::new("ACCRUE", vec!["TAG".into(), "TAG".into()]).unwrap_err();
        assert!(err.to_string().contains("duplicate value 'TAG'"));
        assert!(SmartContractEventType::new("", vec![]).is_err());
    }
}
