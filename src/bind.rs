//! Values bound positionally to `?` placeholders.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Int(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        BindValue::Int(i64::from(value))
    }
}

impl From<u32> for BindValue {
    fn from(value: u32) -> Self {
        BindValue::Int(i64::from(value))
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        BindValue::Float(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Str(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Str(value)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindValue::Null, Into::into)
    }
}

/// Reads command-line style input: `null`, integers and floats keep their
/// type, anything else is a string.
impl FromStr for BindValue {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "null" {
            return Ok(BindValue::Null);
        }
        if let Ok(value) = s.parse::<i64>() {
            return Ok(BindValue::Int(value));
        }
        if let Ok(value) = s.parse::<f64>() {
            if value.is_finite() {
                return Ok(BindValue::Float(value));
            }
        }
        Ok(BindValue::Str(s.to_string()))
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Null => write!(f, "NULL"),
            BindValue::Int(value) => write!(f, "{}", value),
            BindValue::Float(value) => write!(f, "{}", value),
            BindValue::Str(value) => write!(f, "'{}'", value.replace('\'', "''")),
        }
    }
}
