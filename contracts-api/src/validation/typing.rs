//! Strong typing and semantic field checks
//!
//! [`validate_type`] is the thin runtime check applied to dynamic host values.
//! The remaining helpers produce the `InvalidDefinition` errors shared by every
//! data type in the crate, so that messages stay uniform.

use super::value::{TypeExpr, Value};
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt::Display;

/// Options for [`validate_type`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCheck {
    /// `Null` is accepted
    pub optional: bool,
    /// Empty strings and collections are rejected
    pub check_empty: bool,
}

impl TypeCheck {
    /// Value must be present, may be empty
    pub const REQUIRED: TypeCheck = TypeCheck {
        optional: false,
        check_empty: false,
    };

    /// Value may be `Null`
    pub const OPTIONAL: TypeCheck = TypeCheck {
        optional: true,
        check_empty: false,
    };

    /// Value must be present and non-empty
    pub const NON_EMPTY: TypeCheck = TypeCheck {
        optional: false,
        check_empty: true,
    };
}

/// Join an object prefix and a field name (`ScheduledEvent.expression`)
pub fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Build a strong typing error for `value`
pub fn type_mismatch(field: &str, expected: impl Display, value: &Value) -> Error {
    Error::StrongTyping {
        field: field.to_string(),
        expected: expected.to_string(),
        value: value.repr(),
        actual_type: value.type_name().to_string(),
    }
}

/// Confirm `value` matches `expected`, returning it unchanged
pub fn validate_type<'a>(
    value: &'a Value,
    expected: &TypeExpr,
    field: &str,
    check: TypeCheck,
) -> Result<&'a Value> {
    if value.is_null() {
        if check.optional {
            return Ok(value);
        }
        return Err(type_mismatch(field, expected, value));
    }

    if !expected.matches(value) {
        return Err(type_mismatch(field, expected, value));
    }

    if check.check_empty && value.is_empty() {
        return Err(Error::invalid(format!(
            "'{}' must be a non-empty {}.",
            field,
            value.type_name()
        )));
    }

    Ok(value)
}

/// Reject empty strings
pub fn require_non_empty(value: &str, field: &str, type_name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(format!(
            "'{}' of {} must be a non-empty string.",
            field, type_name
        )));
    }
    Ok(())
}

/// Reject empty strings when present
pub fn require_optional_non_empty(value: Option<&str>, field: &str, type_name: &str) -> Result<()> {
    match value {
        Some(v) => require_non_empty(v, field, type_name),
        None => Ok(()),
    }
}

/// Inclusive bounds check
pub fn require_in_range<T>(value: T, min: T, max: T, field: &str, type_name: &str) -> Result<()>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(Error::invalid(format!(
            "Argument {} of {} object is out of range({}-{}).",
            field, type_name, min, max
        )));
    }
    Ok(())
}

/// Strictly positive decimal
pub fn require_positive(value: Decimal, field: &str, type_name: &str) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(Error::invalid(format!(
            "'{}' of {} must be greater than 0, currently {}.",
            field, type_name, value
        )));
    }
    Ok(())
}

/// Reject duplicates; the first repeated value is named in the error
pub fn require_unique<'a, I>(values: I, field: &str, type_name: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(Error::invalid(format!(
                "'{}' of {} contains duplicate value '{}'.",
                field, type_name, value
            )));
        }
    }
    Ok(())
}

/// Upper bound on the number of submitted items
pub fn require_at_most(count: usize, limit: usize, items: &str, container: &str) -> Result<()> {
    if count > limit {
        return Err(Error::invalid(format!(
            "Too many {} submitted in the {}. Number submitted: {}. Limit: {}.",
            items, container, count, limit
        )));
    }
    Ok(())
}
