//! Contract parameters, their shapes and values
//!
//! A [`Shape`] constrains the values a [`Parameter`] may take. Value checks
//! run in two stages: the value kind must match the shape (a strong typing
//! error otherwise), then the shape's constraints are applied.

use crate::validation::{require_non_empty, require_optional_utc, require_positive, require_unique, require_utc, TzDateTime};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric parameter constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberShape {
    /// Inclusive lower bound
    #[serde(default)]
    pub min_value: Option<Decimal>,

    /// Inclusive upper bound
    #[serde(default)]
    pub max_value: Option<Decimal>,

    /// Values must be a multiple of `step` above `min_value` (or zero)
    #[serde(default)]
    pub step: Option<Decimal>,
}

/// Date parameter constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateShape {
    /// Earliest permitted date
    #[serde(default)]
    pub min_date: Option<TzDateTime>,

    /// Latest permitted date
    #[serde(default)]
    pub max_date: Option<TzDateTime>,
}

/// Denomination parameter constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationShape {
    /// Permitted denominations; empty permits any
    #[serde(default)]
    pub permitted_denominations: Vec<String>,
}

/// One choice of a union parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionItem {
    /// Value key
    pub key: String,

    /// Human readable label
    pub display_name: String,
}

impl UnionItem {
    /// Create a union item
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
        }
    }
}

/// Enumerated choice parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionShape {
    /// Available choices
    pub items: Vec<UnionItem>,
}

/// Parameter that may be unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalShape {
    /// Shape of the value when set
    pub shape: Box<Shape>,
}

/// Declared shape of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Decimal number
    Number(NumberShape),
    /// Free text
    String,
    /// Account identifier
    AccountId,
    /// UTC datetime
    Date(DateShape),
    /// Currency or custom denomination
    Denomination(DenominationShape),
    /// One of a fixed set of keys
    Union(UnionShape),
    /// Shape that may be unset
    Optional(OptionalShape),
}

impl Shape {
    /// Unconstrained number
    pub fn number() -> Self {
        Shape::Number(NumberShape::default())
    }

    /// Bounded number
    pub fn bounded_number(min_value: Decimal, max_value: Decimal, step: Option<Decimal>) -> Result<Self> {
        let shape = Shape::Number(NumberShape {
            min_value: Some(min_value),
            max_value: Some(max_value),
            step,
        });
        shape.validate()?;
        Ok(shape)
    }

    /// Denomination restricted to `permitted`
    pub fn denomination<I, S>(permitted: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let shape = Shape::Denomination(DenominationShape {
            permitted_denominations: permitted.into_iter().map(Into::into).collect(),
        });
        shape.validate()?;
        Ok(shape)
    }

    /// Union over `items`
    pub fn union(items: Vec<UnionItem>) -> Result<Self> {
        let shape = Shape::Union(UnionShape { items });
        shape.validate()?;
        Ok(shape)
    }

    /// Optional wrapper around `inner`
    pub fn optional(inner: Shape) -> Result<Self> {
        let shape = Shape::Optional(OptionalShape { shape: Box::new(inner) });
        shape.validate()?;
        Ok(shape)
    }

    /// Type name used in documentation and errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Number(_) => "NumberShape",
            Shape::String => "StringShape",
            Shape::AccountId => "AccountIdShape",
            Shape::Date(_) => "DateShape",
            Shape::Denomination(_) => "DenominationShape",
            Shape::Union(_) => "UnionShape",
            Shape::Optional(_) => "OptionalShape",
        }
    }

    /// Kind of [`ParameterValue`] this shape accepts
    pub fn value_type_name(&self) -> &'static str {
        match self {
            Shape::Number(_) => "Decimal",
            Shape::String | Shape::AccountId | Shape::Denomination(_) => "str",
            Shape::Date(_) => "datetime",
            Shape::Union(_) => "UnionItemValue",
            Shape::Optional(_) => "OptionalValue",
        }
    }

    /// Check the shape's own constraints
    pub fn validate(&self) -> Result<()> {
        match self {
            Shape::Number(shape) => {
                if let (Some(min), Some(max)) = (shape.min_value, shape.max_value) {
                    if min > max {
                        return Err(Error::invalid(format!(
                            "'min_value' of NumberShape must not be greater than 'max_value', currently {} > {}.",
                            min, max
                        )));
                    }
                }
                if let Some(step) = shape.step {
                    require_positive(step, "step", "NumberShape")?;
                }
                Ok(())
            }
            Shape::String | Shape::AccountId => Ok(()),
            Shape::Date(shape) => {
                let min = require_optional_utc(shape.min_date.as_ref(), "min_date", "DateShape")?;
                let max = require_optional_utc(shape.max_date.as_ref(), "max_date", "DateShape")?;
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(Error::invalid(
                            "'min_date' of DateShape must not be after 'max_date'.",
                        ));
                    }
                }
                Ok(())
            }
            Shape::Denomination(shape) => {
                for denomination in &shape.permitted_denominations {
                    require_non_empty(denomination, "permitted_denominations", "DenominationShape")?;
                }
                require_unique(
                    shape.permitted_denominations.iter().map(String::as_str),
                    "permitted_denominations",
                    "DenominationShape",
                )
            }
            Shape::Union(shape) => {
                if shape.items.is_empty() {
                    return Err(Error::invalid("'items' of UnionShape must contain at least one item."));
                }
                for item in &shape.items {
                    require_non_empty(&item.key, "key", "UnionItem")?;
                    require_non_empty(&item.display_name, "display_name", "UnionItem")?;
                }
                require_unique(shape.items.iter().map(|i| i.key.as_str()), "items", "UnionShape")
            }
            Shape::Optional(shape) => {
                if matches!(*shape.shape, Shape::Optional(_)) {
                    return Err(Error::invalid("OptionalShape cannot wrap another OptionalShape."));
                }
                shape.shape.validate()
            }
        }
    }

    /// Check `value` against this shape. `field` names the parameter in errors.
    pub fn validate_value(&self, field: &str, value: &ParameterValue) -> Result<()> {
        match (self, value) {
            (Shape::Number(shape), ParameterValue::Number(number)) => check_number(shape, field, *number),
            (Shape::String, ParameterValue::String(_)) => Ok(()),
            (Shape::AccountId, ParameterValue::String(account_id)) => {
                require_non_empty(account_id, field, "AccountIdShape")
            }
            (Shape::Date(shape), ParameterValue::DateTime(datetime)) => check_date(shape, field, datetime),
            (Shape::Denomination(shape), ParameterValue::String(denomination)) => {
                require_non_empty(denomination, field, "DenominationShape")?;
                if !shape.permitted_denominations.is_empty()
                    && !shape.permitted_denominations.contains(denomination)
                {
                    return Err(Error::invalid(format!(
                        "'{}' value '{}' is not a permitted denomination, permitted: {}.",
                        field,
                        denomination,
                        shape.permitted_denominations.join(", ")
                    )));
                }
                Ok(())
            }
            (Shape::Union(shape), ParameterValue::UnionItem(item)) => {
                if !shape.items.iter().any(|i| i.key == item.key) {
                    return Err(Error::invalid(format!(
                        "'{}' value '{}' is not one of the union keys: {}.",
                        field,
                        item.key,
                        shape.items.iter().map(|i| i.key.as_str()).collect::<Vec<_>>().join(", ")
                    )));
                }
                Ok(())
            }
            (Shape::Optional(shape), ParameterValue::Optional(optional)) => match &optional.value {
                Some(inner) => shape.shape.validate_value(field, inner),
                None => Ok(()),
            },
            _ => Err(Error::StrongTyping {
                field: field.to_string(),
                expected: self.value_type_name().to_string(),
                value: value.repr(),
                actual_type: value.type_name().to_string(),
            }),
        }
    }
}

fn check_number(shape: &NumberShape, field: &str, number: Decimal) -> Result<()> {
    if let Some(min) = shape.min_value {
        if number < min {
            return Err(Error::invalid(format!(
                "'{}' value {} is below the minimum {}.",
                field, number, min
            )));
        }
    }
    if let Some(max) = shape.max_value {
        if number > max {
            return Err(Error::invalid(format!(
                "'{}' value {} is above the maximum {}.",
                field, number, max
            )));
        }
    }
    if let Some(step) = shape.step {
        let base = shape.min_value.unwrap_or(Decimal::ZERO);
        if !step.is_zero() {
            let remainder = number
                .checked_sub(base)
                .and_then(|offset| offset.checked_rem(step))
                .ok_or_else(|| {
                    Error::invalid(format!(
                        "'{}' value {} is too far from {} to check against step {}.",
                        field, number, base, step
                    ))
                })?;
            if !remainder.is_zero() {
                return Err(Error::invalid(format!(
                    "'{}' value {} is not a multiple of step {}.",
                    field, number, step
                )));
            }
        }
    }
    Ok(())
}

fn check_date(shape: &DateShape, field: &str, datetime: &TzDateTime) -> Result<()> {
    let value = require_utc(datetime, field, "DateShape")?;
    if let Some(min) = shape.min_date.as_ref().and_then(TzDateTime::as_utc) {
        if value < min {
            return Err(Error::invalid(format!(
                "'{}' value {} is before the minimum date {}.",
                field, datetime, min
            )));
        }
    }
    if let Some(max) = shape.max_date.as_ref().and_then(TzDateTime::as_utc) {
        if value > max {
            return Err(Error::invalid(format!(
                "'{}' value {} is after the maximum date {}.",
                field, datetime, max
            )));
        }
    }
    Ok(())
}

/// Selected union key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionItemValue {
    /// Chosen key
    pub key: String,
}

/// Value of an optional parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalValue {
    /// Inner value, `None` when unset
    #[serde(default)]
    pub value: Option<Box<ParameterValue>>,
}

/// A parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    /// Number
    Number(Decimal),
    /// String, account id or denomination
    String(String),
    /// Datetime
    DateTime(TzDateTime),
    /// Union choice
    UnionItem(UnionItemValue),
    /// Optional wrapper
    Optional(OptionalValue),
}

impl ParameterValue {
    /// Union choice by key
    pub fn union_key(key: impl Into<String>) -> Self {
        ParameterValue::UnionItem(UnionItemValue { key: key.into() })
    }

    /// Optional value
    pub fn optional(value: Option<ParameterValue>) -> Self {
        ParameterValue::Optional(OptionalValue {
            value: value.map(Box::new),
        })
    }

    /// Dynamic type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Number(_) => "Decimal",
            ParameterValue::String(_) => "str",
            ParameterValue::DateTime(_) => "datetime",
            ParameterValue::UnionItem(_) => "UnionItemValue",
            ParameterValue::Optional(_) => "OptionalValue",
        }
    }

    /// Value as rendered in error messages
    pub fn repr(&self) -> String {
        match self {
            ParameterValue::Number(n) => format!("Decimal('{}')", n),
            ParameterValue::String(s) => format!("'{}'", s),
            ParameterValue::DateTime(dt) => dt.to_string(),
            ParameterValue::UnionItem(item) => format!("UnionItemValue(key='{}')", item.key),
            ParameterValue::Optional(optional) => match &optional.value {
                Some(inner) => format!("OptionalValue({})", inner.repr()),
                None => "OptionalValue(None)".to_string(),
            },
        }
    }

    /// Inner value of an optional, or the value itself
    pub fn unwrap_optional(&self) -> Option<&ParameterValue> {
        match self {
            ParameterValue::Optional(optional) => optional.value.as_deref(),
            other => Some(other),
        }
    }

    /// Number, looking through optionals
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self.unwrap_optional()? {
            ParameterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String, looking through optionals
    pub fn as_str(&self) -> Option<&str> {
        match self.unwrap_optional()? {
            ParameterValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Datetime, looking through optionals
    pub fn as_datetime(&self) -> Option<&TzDateTime> {
        match self.unwrap_optional()? {
            ParameterValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Union key, looking through optionals
    pub fn as_union_key(&self) -> Option<&str> {
        match self.unwrap_optional()? {
            ParameterValue::UnionItem(item) => Some(item.key.as_str()),
            _ => None,
        }
    }
}

impl From<Decimal> for ParameterValue {
    fn from(value: Decimal) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<TzDateTime> for ParameterValue {
    fn from(value: TzDateTime) -> Self {
        ParameterValue::DateTime(value)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

/// Where a parameter value is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterLevel {
    /// Shared by every contract
    Global,
    /// Set once per product template
    Template,
    /// Set per account instance
    Instance,
}

/// Who may change an instance-level parameter after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterUpdatePermission {
    /// Never changes
    Fixed,
    /// Operations staff only
    OpsEditable,
    /// Account holder
    UserEditable,
    /// Account holder, with operations approval
    UserEditableWithOpsPermission,
}

/// Parameter declared by a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Value shape
    pub shape: Shape,

    /// Level the value is set at
    pub level: ParameterLevel,

    /// Computed by the derived parameter hook
    #[serde(default)]
    pub derived: bool,

    /// Human readable label
    #[serde(default)]
    pub display_name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Value used when none is set
    #[serde(default)]
    pub default_value: Option<ParameterValue>,

    /// Who may update the value
    #[serde(default)]
    pub update_permission: Option<ParameterUpdatePermission>,
}

impl Parameter {
    /// Validated constructor
    pub fn new(name: impl Into<String>, shape: Shape, level: ParameterLevel) -> Result<Self> {
        let parameter = Self {
            name: name.into(),
            shape,
            level,
            derived: false,
            display_name: String::new(),
            description: String::new(),
            default_value: None,
            update_permission: None,
        };
        parameter.validate()?;
        Ok(parameter)
    }

    /// Attach a label and description
    pub fn with_description(mut self, display_name: impl Into<String>, description: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self.description = description.into();
        self
    }

    /// Attach a default value
    pub fn with_default_value(mut self, value: impl Into<ParameterValue>) -> Result<Self> {
        self.default_value = Some(value.into());
        self.validate()?;
        Ok(self)
    }

    /// Attach an update permission
    pub fn with_update_permission(mut self, permission: ParameterUpdatePermission) -> Result<Self> {
        self.update_permission = Some(permission);
        self.validate()?;
        Ok(self)
    }

    /// Mark as derived
    pub fn into_derived(mut self) -> Result<Self> {
        self.derived = true;
        self.validate()?;
        Ok(self)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.name, "name", "Parameter")?;
        self.shape.validate()?;

        if self.derived {
            if self.level != ParameterLevel::Instance {
                return Err(Error::invalid(format!(
                    "Derived parameter '{}' must be at instance level.",
                    self.name
                )));
            }
            if self.default_value.is_some() {
                return Err(Error::invalid(format!(
                    "Derived parameter '{}' cannot have a default_value.",
                    self.name
                )));
            }
            if self.update_permission.is_some() {
                return Err(Error::invalid(format!(
                    "Derived parameter '{}' cannot have an update_permission.",
                    self.name
                )));
            }
        }

        if self.update_permission.is_some() && self.level != ParameterLevel::Instance {
            return Err(Error::invalid(format!(
                "'update_permission' of Parameter '{}' is only allowed at instance level.",
                self.name
            )));
        }

        if let Some(default) = &self.default_value {
            self.shape.validate_value(&self.name, default)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_number_shape_bounds() {
        let err = Shape::bounded_number(dec!(10), dec!(1), None).unwrap_err();
        assert!(err.to_string().contains("must not be greater than"));
        assert!(Shape::bounded_number(dec!(0), dec!(1), Some(dec!(0))).is_err());
    }

    #[test]
    fn test_number_value_constraints() {
        let shape = Shape::bounded_number(dec!(0), dec!(1000), Some(dec!(0.5))).unwrap();
        assert!(shape.validate_value("overdraft_limit", &dec!(100.5).into()).is_ok());
        assert!(shape.validate_value("overdraft_limit", &dec!(1001).into()).is_err());
        assert!(shape.validate_value("overdraft_limit", &dec!(-1).into()).is_err());
        let err = shape.validate_value("overdraft_limit", &dec!(0.3).into()).unwrap_err();
        assert!(err.to_string().contains("not a multiple of step"));
    }

    #[test]
    fn test_step_check_at_decimal_extremes() {
        let shape = Shape::bounded_number(-Decimal::MAX, Decimal::MAX, Some(dec!(1))).unwrap();
        let err = shape.validate_value("limit", &Decimal::MAX.into()).unwrap_err();
        assert!(err.is_invalid_definition());
        assert!(err.to_string().contains("too far from"));

        assert!(shape.validate_value("limit", &(-Decimal::MAX).into()).is_ok());
        assert!(shape.validate_value("limit", &dec!(0).into()).is_ok());
    }

    #[test]
    fn test_value_kind_mismatch_is_strong_typing() {
        let err = Shape::number()
            .validate_value("overdraft_fee", &"ten".into())
            .unwrap_err();
        assert!(err.is_strong_typing());
        assert_eq!(
            err.to_string(),
            "'overdraft_fee' expected Decimal but got value 'ten' of type str"
        );
    }

    #[test]
    fn test_denomination_permitted() {
        let shape = Shape::denomination(["GBP", "USD"]).unwrap();
        assert!(shape.validate_value("denomination", &"GBP".into()).is_ok());
        let err = shape.validate_value("denomination", &"EUR".into()).unwrap_err();
        assert!(err.to_string().contains("permitted: GBP, USD"));
        assert!(Shape::denomination(["GBP", "GBP"]).is_err());
    }

    #[test]
    fn test_union_keys() {
        let shape = Shape::union(vec![UnionItem::new("daily", "Daily"), UnionItem::new("monthly", "Monthly")]).unwrap();
        assert!(shape.validate_value("frequency", &ParameterValue::union_key("daily")).is_ok());
        assert!(shape.validate_value("frequency", &ParameterValue::union_key("weekly")).is_err());
        assert!(Shape::union(vec![]).is_err());
        assert!(Shape::union(vec![UnionItem::new("a", "A"), UnionItem::new("a", "B")]).is_err());
    }

    #[test]
    fn test_optional_shape() {
        let shape = Shape::optional(Shape::number()).unwrap();
        assert!(shape.validate_value("cap", &ParameterValue::optional(None)).is_ok());
        assert!(shape
            .validate_value("cap", &ParameterValue::optional(Some(dec!(5).into())))
            .is_ok());
        assert!(shape
            .validate_value("cap", &ParameterValue::optional(Some("x".into())))
            .unwrap_err()
            .is_strong_typing());
        assert!(Shape::optional(shape).is_err());
    }

    #[test]
    fn test_date_shape_requires_utc() {
        let shape = Shape::Date(DateShape::default());
        let naive = TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap();
        let err = shape.validate_value("maturity", &naive.into()).unwrap_err();
        assert!(err.to_string().contains("is not timezone aware"));

        let bounded = Shape::Date(DateShape {
            min_date: Some(TzDateTime::utc(2024, 1, 1, 0, 0, 0).unwrap()),
            max_date: Some(TzDateTime::utc(2024, 12, 31, 0, 0, 0).unwrap()),
        });
        assert!(bounded.validate().is_ok());
        let late = TzDateTime::utc(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(bounded.validate_value("maturity", &late.into()).is_err());
    }

    #[test]
    fn test_derived_parameter_rules() {
        let template = Parameter::new("limit", Shape::number(), ParameterLevel::Template).unwrap();
        assert!(template.clone().into_derived().is_err());

        let instance = Parameter::new("limit", Shape::number(), ParameterLevel::Instance).unwrap();
        let derived = instance.clone().into_derived().unwrap();
        assert!(derived.with_default_value(dec!(1)).is_err());

        let err = template
            .with_update_permission(ParameterUpdatePermission::OpsEditable)
            .unwrap_err();
        assert!(err.to_string().contains("only allowed at instance level"));
        assert!(instance
            .with_update_permission(ParameterUpdatePermission::UserEditable)
            .is_ok());
    }

    #[test]
    fn test_default_value_checked_against_shape() {
        let parameter = Parameter::new("denomination", Shape::denomination(["GBP"]).unwrap(), ParameterLevel::Template)
            .unwrap();
        assert!(parameter.clone().with_default_value("GBP").is_ok());
        assert!(parameter.with_default_value("USD").is_err());
    }

    #[test]
    fn test_parameter_value_accessors() {
        let value = ParameterValue::optional(Some(dec!(0.05).into()));
        assert_eq!(value.as_decimal(), Some(dec!(0.05)));
        assert_eq!(ParameterValue::optional(None).as_decimal(), None);
        assert_eq!(ParameterValue::union_key("daily").as_union_key(), Some("daily"));
    }

    #[test]
    fn test_shape_json_tagging() {
        let json = serde_json::to_value(Shape::denomination(["GBP"]).unwrap()).unwrap();
        assert_eq!(json["type"], "denomination");
        assert_eq!(json["permitted_denominations"][0], "GBP");
        let decoded: Shape = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, Shape::denomination(["GBP"]).unwrap());
    }
}
