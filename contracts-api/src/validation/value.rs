//! Dynamic host values and declared type expressions

use super::timezone::TzDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A dynamically typed value received at the host boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Exact decimal
    Decimal(Decimal),
    /// String
    Str(String),
    /// Datetime
    DateTime(TzDateTime),
    /// Ordered list
    List(Vec<Value>),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Type name used in strong typing errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Decimal(_) => "Decimal",
            Value::Str(_) => "str",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
        }
    }

    /// Printable representation used in strong typing errors
    pub fn repr(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Decimal(d) => format!("Decimal('{}')", d),
            Value::Str(s) => format!("'{}'", s),
            Value::DateTime(dt) => dt.to_string(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Map(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("'{}': {}", k, v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }

    /// Empty string or collection
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Check for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up a map entry; missing keys and non-maps read as `Null`
    pub fn get(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        match self {
            Value::Map(map) => map.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => {
                    let text = n.to_string();
                    Decimal::from_str(&text)
                        .or_else(|_| Decimal::from_scientific(&text))
                        .map(Value::Decimal)
                        .unwrap_or(Value::Str(text))
                }
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                if map.contains_key("kind") {
                    let candidate = serde_json::Value::Object(map.clone());
                    if let Ok(dt) = serde_json::from_value::<TzDateTime>(candidate) {
                        return Value::DateTime(dt);
                    }
                }
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<TzDateTime> for Value {
    fn from(dt: TzDateTime) -> Self {
        Value::DateTime(dt)
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `bool`
    Bool,
    /// `int`; a `bool` never satisfies it
    Int,
    /// `Decimal`; integers widen, booleans do not
    Decimal,
    /// `str`
    Str,
    /// `datetime`
    DateTime,
    /// Homogeneous list
    List(Box<TypeExpr>),
    /// String-keyed map with homogeneous values
    Map(Box<TypeExpr>),
    /// Any of the listed types
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    /// `Union[int, str]`, the usual shape of schedule fields
    pub fn int_or_str() -> Self {
        TypeExpr::Union(vec![TypeExpr::Int, TypeExpr::Str])
    }

    /// Check whether `value` inhabits this type
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeExpr::Bool, Value::Bool(_)) => true,
            (TypeExpr::Int, Value::Int(_)) => true,
            (TypeExpr::Decimal, Value::Decimal(_) | Value::Int(_)) => true,
            (TypeExpr::Str, Value::Str(_)) => true,
            (TypeExpr::DateTime, Value::DateTime(_)) => true,
            (TypeExpr::List(inner), Value::List(items)) => items.iter().all(|v| inner.matches(v)),
            (TypeExpr::Map(inner), Value::Map(map)) => map.values().all(|v| inner.matches(v)),
            (TypeExpr::Union(options), v) => options.iter().any(|t| t.matches(v)),
            _ => false,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Bool => write!(f, "bool"),
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Decimal => write!(f, "Decimal"),
            TypeExpr::Str => write!(f, "str"),
            TypeExpr::DateTime => write!(f, "datetime"),
            TypeExpr::List(inner) => write!(f, "list[{}]", inner),
            TypeExpr::Map(inner) => write!(f, "dict[str, {}]", inner),
            TypeExpr::Union(options) => {
                let names: Vec<String> = options.iter().map(|t| t.to_string()).collect();
                write!(f, "Union[{}]", names.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bool_never_matches_int() {
        assert!(!TypeExpr::Int.matches(&Value::Bool(true)));
        assert!(!TypeExpr::Decimal.matches(&Value::Bool(false)));
        assert!(!TypeExpr::int_or_str().matches(&Value::Bool(true)));
        assert!(TypeExpr::Int.matches(&Value::Int(1)));
    }

    #[test]
    fn test_int_widens_to_decimal() {
        assert!(TypeExpr::Decimal.matches(&Value::Int(3)));
        assert!(!TypeExpr::Int.matches(&Value::Decimal(dec!(3))));
    }

    #[test]
    fn test_type_expr_display() {
        assert_eq!(TypeExpr::int_or_str().to_string(), "Union[int, str]");
        assert_eq!(
            TypeExpr::Map(Box::new(TypeExpr::List(Box::new(TypeExpr::Str)))).to_string(),
            "dict[str, list[str]]"
        );
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "hour": 1,
            "rate": 0.05,
            "flag": true,
            "names": ["a", "b"],
            "at": {"kind": "zoned", "utc": "2024-01-01T00:00:00", "zone": "UTC"}
        });
        let value = Value::from(json);
        assert_eq!(value.get("hour"), &Value::Int(1));
        assert_eq!(value.get("rate"), &Value::Decimal(dec!(0.05)));
        assert_eq!(value.get("flag"), &Value::Bool(true));
        assert_eq!(value.get("missing"), &Value::Null);
        assert!(matches!(value.get("at"), Value::DateTime(_)));
        assert_eq!(value.get("names").repr(), "['a', 'b']");
    }
}
