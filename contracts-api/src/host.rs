//! Host boundary decoding
//!
//! Two paths into the data model:
//!
//! - `decode_*` functions take dynamic [`Value`]s (usually parsed from JSON),
//!   run them through the strong typing validator and then the validating
//!   constructors. A `true` where an integer is declared fails here.
//! - [`decode_trusted`] deserialises host data without any validation,
//!   preserving it exactly.

use crate::types::{
    EndOfMonthSchedule, Next, Override, ParameterValue, Previous, ScheduleExpression, ScheduleFailover,
    ScheduleField, Shape, Shift,
};
use crate::validation::{
    field_path, require_in_range, type_mismatch, validate_type, TypeCheck, TypeExpr, Value,
};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Parse JSON text into a dynamic value
pub fn parse_value(json: &str) -> Result<Value> {
    let parsed: serde_json::Value = serde_json::from_str(json)?;
    Ok(Value::from(parsed))
}

/// Trusted path: deserialise without validation
pub fn decode_trusted<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Serialise a value for the host
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Fields of an object value, rejecting unknown keys
fn object<'a>(value: &'a Value, type_name: &str, allowed: &[&str]) -> Result<&'a BTreeMap<String, Value>> {
    let map = match value {
        Value::Map(map) => map,
        other => return Err(type_mismatch(type_name, "dict", other)),
    };
    if let Some(unknown) = map.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(Error::invalid(format!(
            "{} got an unexpected field '{}'.",
            type_name, unknown
        )));
    }
    Ok(map)
}

fn field<'a>(map: &'a BTreeMap<String, Value>, key: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    map.get(key).unwrap_or(&NULL)
}

/// Optional integer field, range checked
fn optional_in_range(
    map: &BTreeMap<String, Value>,
    key: &str,
    type_name: &str,
    min: i64,
    max: i64,
) -> Result<Option<i64>> {
    let value = optional_i64(map, key, type_name)?;
    if let Some(raw) = value {
        require_in_range(raw, min, max, key, type_name)?;
    }
    Ok(value)
}

fn optional_i64(map: &BTreeMap<String, Value>, key: &str, type_name: &str) -> Result<Option<i64>> {
    let path = field_path(type_name, key);
    match validate_type(field(map, key), &TypeExpr::Int, &path, TypeCheck::OPTIONAL)? {
        Value::Int(raw) => Ok(Some(*raw)),
        _ => Ok(None),
    }
}

const SCHEDULE_FIELDS: [&str; 7] = ["day", "day_of_week", "hour", "minute", "second", "month", "year"];

/// Decode a `ScheduleExpression`
pub fn decode_schedule_expression(value: &Value) -> Result<ScheduleExpression> {
    let map = object(value, "ScheduleExpression", &SCHEDULE_FIELDS)?;
    let decode = |key: &str| -> Result<Option<ScheduleField>> {
        let path = field_path("ScheduleExpression", key);
        match validate_type(field(map, key), &TypeExpr::int_or_str(), &path, TypeCheck::OPTIONAL)? {
            Value::Int(i) => Ok(Some(ScheduleField::Int(*i))),
            Value::Str(s) => Ok(Some(ScheduleField::Cron(s.clone()))),
            _ => Ok(None),
        }
    };

    ScheduleExpression {
        day: decode("day")?,
        day_of_week: decode("day_of_week")?,
        hour: decode("hour")?,
        minute: decode("minute")?,
        second: decode("second")?,
        month: decode("month")?,
        year: decode("year")?,
    }
    .validated()
}

/// Decode an `EndOfMonthSchedule`
pub fn decode_end_of_month_schedule(value: &Value) -> Result<EndOfMonthSchedule> {
    const TYPE: &str = "EndOfMonthSchedule";
    let map = object(value, TYPE, &["day", "hour", "minute", "second", "failover"])?;

    validate_type(field(map, "day"), &TypeExpr::Int, &field_path(TYPE, "day"), TypeCheck::REQUIRED)?;
    let day = optional_in_range(map, "day", TYPE, 1, 31)?.unwrap_or_default();
    let hour = optional_in_range(map, "hour", TYPE, 0, 23)?.unwrap_or(0);
    let minute = optional_in_range(map, "minute", TYPE, 0, 59)?.unwrap_or(0);
    let second = optional_in_range(map, "second", TYPE, 0, 59)?.unwrap_or(0);

    let failover_path = field_path(TYPE, "failover");
    let failover = match validate_type(field(map, "failover"), &TypeExpr::Str, &failover_path, TypeCheck::OPTIONAL)? {
        Value::Str(name) => match name.as_str() {
            "FIRST_VALID_DAY_BEFORE" => ScheduleFailover::FirstValidDayBefore,
            "FIRST_VALID_DAY_AFTER" => ScheduleFailover::FirstValidDayAfter,
            other => {
                return Err(Error::invalid(format!(
                    "'failover' of EndOfMonthSchedule must be FIRST_VALID_DAY_BEFORE or FIRST_VALID_DAY_AFTER, currently '{}'.",
                    other
                )))
            }
        },
        _ => ScheduleFailover::default(),
    };

    EndOfMonthSchedule::new(day, hour, minute, second, failover)
}

/// Decode a `Shift`
pub fn decode_shift(value: &Value) -> Result<Shift> {
    const TYPE: &str = "Shift";
    let map = object(value, TYPE, &["years", "months", "days", "hours", "minutes", "seconds"])?;
    let shift = Shift {
        years: optional_i64(map, "years", TYPE)?,
        months: optional_i64(map, "months", TYPE)?,
        days: optional_i64(map, "days", TYPE)?,
        hours: optional_i64(map, "hours", TYPE)?,
        minutes: optional_i64(map, "minutes", TYPE)?,
        seconds: optional_i64(map, "seconds", TYPE)?,
    };
    shift.validate()?;
    Ok(shift)
}

const FIND_FIELDS: [&str; 5] = ["month", "day", "hour", "minute", "second"];

/// Decode a `Next`
pub fn decode_next(value: &Value) -> Result<Next> {
    const TYPE: &str = "Next";
    let map = object(value, TYPE, &FIND_FIELDS)?;
    let next = Next {
        month: optional_in_range(map, "month", TYPE, 1, 12)?,
        day: optional_in_range(map, "day", TYPE, 1, 31)?,
        hour: optional_in_range(map, "hour", TYPE, 0, 23)?,
        minute: optional_in_range(map, "minute", TYPE, 0, 59)?,
        second: optional_in_range(map, "second", TYPE, 0, 59)?,
    };
    next.validate()?;
    Ok(next)
}

/// Decode a `Previous`
pub fn decode_previous(value: &Value) -> Result<Previous> {
    const TYPE: &str = "Previous";
    let map = object(value, TYPE, &FIND_FIELDS)?;
    let previous = Previous {
        month: optional_in_range(map, "month", TYPE, 1, 12)?,
        day: optional_in_range(map, "day", TYPE, 1, 31)?,
        hour: optional_in_range(map, "hour", TYPE, 0, 23)?,
        minute: optional_in_range(map, "minute", TYPE, 0, 59)?,
        second: optional_in_range(map, "second", TYPE, 0, 59)?,
    };
    previous.validate()?;
    Ok(previous)
}

/// Decode an `Override`
pub fn decode_override(value: &Value) -> Result<Override> {
    const TYPE: &str = "Override";
    let map = object(value, TYPE, &["year", "month", "day", "hour", "minute", "second"])?;
    let fields = Override {
        year: optional_in_range(map, "year", TYPE, 1, 9999)?,
        month: optional_in_range(map, "month", TYPE, 1, 12)?,
        day: optional_in_range(map, "day", TYPE, 1, 31)?,
        hour: optional_in_range(map, "hour", TYPE, 0, 23)?,
        minute: optional_in_range(map, "minute", TYPE, 0, 59)?,
        second: optional_in_range(map, "second", TYPE, 0, 59)?,
    };
    fields.validate()?;
    Ok(fields)
}

/// Decode a parameter value against its declared shape
pub fn decode_parameter_value(value: &Value, shape: &Shape, name: &str) -> Result<ParameterValue> {
    let decoded = decode_shape_value(value, shape, name)?;
    shape.validate_value(name, &decoded)?;
    Ok(decoded)
}

fn decode_shape_value(value: &Value, shape: &Shape, name: &str) -> Result<ParameterValue> {
    match shape {
        Shape::Number(_) => match validate_type(value, &TypeExpr::Decimal, name, TypeCheck::REQUIRED)? {
            Value::Int(i) => Ok(ParameterValue::Number(Decimal::from(*i))),
            Value::Decimal(d) => Ok(ParameterValue::Number(*d)),
            other => Err(type_mismatch(name, TypeExpr::Decimal, other)),
        },
        Shape::String | Shape::AccountId | Shape::Denomination(_) => {
            match validate_type(value, &TypeExpr::Str, name, TypeCheck::REQUIRED)? {
                Value::Str(s) => Ok(ParameterValue::String(s.clone())),
                other => Err(type_mismatch(name, TypeExpr::Str, other)),
            }
        }
        Shape::Date(_) => match validate_type(value, &TypeExpr::DateTime, name, TypeCheck::REQUIRED)? {
            Value::DateTime(dt) => Ok(ParameterValue::DateTime(dt.clone())),
            other => Err(type_mismatch(name, TypeExpr::DateTime, other)),
        },
        Shape::Union(_) => match validate_type(value, &TypeExpr::Str, name, TypeCheck::NON_EMPTY)? {
            Value::Str(key) => Ok(ParameterValue::union_key(key.clone())),
            other => Err(type_mismatch(name, TypeExpr::Str, other)),
        },
        Shape::Optional(optional) => {
            if value.is_null() {
                Ok(ParameterValue::optional(None))
            } else {
                let inner = decode_shape_value(value, &optional.shape, name)?;
                Ok(ParameterValue::optional(Some(inner)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScheduledEvent, UnionItem};
    use crate::validation::TzDateTime;
    use rust_decimal_macros::dec;

    fn json(text: &str) -> Value {
        parse_value(text).unwrap()
    }

    #[test]
    fn test_schedule_expression_from_json() {
        let expression = decode_schedule_expression(&json(r#"{"hour": 0, "minute": "*/15"}"#)).unwrap();
        assert_eq!(expression.hour, Some(ScheduleField::Int(0)));
        assert_eq!(expression.minute, Some(ScheduleField::Cron("*/15".into())));
    }

    #[test]
    fn test_schedule_expression_rejects_bool() {
        let err = decode_schedule_expression(&json(r#"{"hour": true}"#)).unwrap_err();
        assert!(err.is_strong_typing());
        assert_eq!(
            err.to_string(),
            "'ScheduleExpression.hour' expected Union[int, str] but got value True of type bool"
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = decode_schedule_expression(&json(r#"{"hour": 1, "fortnight": 2}"#)).unwrap_err();
        assert!(err.to_string().contains("unexpected field 'fortnight'"));
        assert!(decode_shift(&json("[1, 2]")).unwrap_err().is_strong_typing());
    }

    #[test]
    fn test_end_of_month_from_json() {
        let schedule =
            decode_end_of_month_schedule(&json(r#"{"day": 31, "hour": 23, "failover": "FIRST_VALID_DAY_AFTER"}"#))
                .unwrap();
        assert_eq!(schedule.day, 31);
        assert_eq!(schedule.failover, ScheduleFailover::FirstValidDayAfter);

        let err = decode_end_of_month_schedule(&json(r#"{"day": 32}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Argument day of EndOfMonthSchedule object is out of range(1-31).");

        let err = decode_end_of_month_schedule(&json(r#"{"day": -1}"#)).unwrap_err();
        assert!(err.is_invalid_definition());

        assert!(decode_end_of_month_schedule(&json(r#"{"hour": 1}"#)).unwrap_err().is_strong_typing());
        assert!(decode_end_of_month_schedule(&json(r#"{"day": false}"#)).unwrap_err().is_strong_typing());
    }

    #[test]
    fn test_relative_parts_reject_bools() {
        let err = decode_override(&json(r#"{"day": true}"#)).unwrap_err();
        assert_eq!(err.to_string(), "'Override.day' expected int but got value True of type bool");
        assert!(decode_next(&json(r#"{"hour": false}"#)).unwrap_err().is_strong_typing());
        assert!(decode_previous(&json(r#"{"month": 13}"#)).unwrap_err().is_invalid_definition());
        assert!(decode_shift(&json(r#"{"days": true}"#)).unwrap_err().is_strong_typing());
        assert_eq!(decode_shift(&json(r#"{"days": -1}"#)).unwrap(), Shift::days(-1));
        assert_eq!(decode_override(&json(r#"{"year": 2024}"#)).unwrap().year, Some(2024));
    }

    #[test]
    fn test_parameter_values() {
        let number = Shape::bounded_number(dec!(0), dec!(100), None).unwrap();
        assert_eq!(
            decode_parameter_value(&json("15"), &number, "overdraft_fee").unwrap(),
            ParameterValue::Number(dec!(15))
        );
        assert_eq!(
            decode_parameter_value(&json("0.05"), &number, "interest_rate").unwrap(),
            ParameterValue::Number(dec!(0.05))
        );
        let err = decode_parameter_value(&json("true"), &number, "overdraft_fee").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'overdraft_fee' expected Decimal but got value True of type bool"
        );
        assert!(decode_parameter_value(&json("101"), &number, "overdraft_fee")
            .unwrap_err()
            .is_invalid_definition());

        let union = Shape::union(vec![UnionItem::new("daily", "Daily")]).unwrap();
        assert_eq!(
            decode_parameter_value(&json("\"daily\""), &union, "frequency").unwrap(),
            ParameterValue::union_key("daily")
        );

        let optional = Shape::optional(Shape::String).unwrap();
        assert_eq!(
            decode_parameter_value(&json("null"), &optional, "nickname").unwrap(),
            ParameterValue::optional(None)
        );
    }

    #[test]
    fn test_trusted_path_preserves_invalid_data() {
        let event = ScheduledEvent {
            start_datetime: Some(TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(event.validate().is_err());

        let text = encode(&event).unwrap();
        let decoded: ScheduledEvent = decode_trusted(&text).unwrap();
        assert_eq!(decoded, event);
        assert!(!decoded.start_datetime.unwrap().is_aware());
    }

    #[test]
    fn test_trusted_path_keeps_negative_fields() {
        let next: Next = decode_trusted(r#"{"hour": -3}"#).unwrap();
        assert_eq!(next.hour, Some(-3));
        assert_eq!(next.validate().unwrap_err().to_string(), "Argument hour of Next object is out of range(0-23).");
        assert_eq!(decode_trusted::<Next>(&encode(&next).unwrap()).unwrap(), next);

        let schedule: EndOfMonthSchedule = decode_trusted(r#"{"day": -1, "minute": -30}"#).unwrap();
        assert_eq!((schedule.day, schedule.minute), (-1, -30));
        assert!(schedule.validate().is_err());

        let fields: Override = decode_trusted(r#"{"year": -5}"#).unwrap();
        assert_eq!(fields.year, Some(-5));
        assert!(fields.validate().is_err());
        assert!(decode_override(&json(r#"{"year": -5}"#)).unwrap_err().is_invalid_definition());
    }
}
