//! Preference values and explicit coercion rules

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A scalar preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    String(String),
}

/// Declared type of a preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefType {
    Bool,
    Int,
    String,
}

impl fmt::Display for PrefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefType::Bool => "boolean",
            PrefType::Int => "integer",
            PrefType::String => "string",
        })
    }
}

/// A value that has no representation in the requested type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {value} to {target}")]
pub struct CoercionError {
    pub value: PrefValue,
    pub target: PrefType,
}

impl PrefValue {
    pub fn pref_type(&self) -> PrefType {
        match self {
            PrefValue::Bool(_) => PrefType::Bool,
            PrefValue::Int(_) => PrefType::Int,
            PrefValue::String(_) => PrefType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PrefValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to `target`
    ///
    /// - Int: booleans become 1/0; strings are trimmed and parsed as base-10 `i64`.
    ///   Empty, fractional and non-numeric strings fail.
    /// - Bool: integers are `!= 0`; strings must be `true`/`false` (any case).
    /// - String: display form of the value.
    pub fn coerce(&self, target: PrefType) -> Result<PrefValue, CoercionError> {
        let fail = || CoercionError {
            value: self.clone(),
            target,
        };
        match (self, target) {
            (value, target) if value.pref_type() == target => Ok(value.clone()),
            (PrefValue::Bool(b), PrefType::Int) => Ok(PrefValue::Int(i64::from(*b))),
            (PrefValue::String(s), PrefType::Int) => {
                s.trim().parse::<i64>().map(PrefValue::Int).map_err(|_| fail())
            }
            (PrefValue::Int(i), PrefType::Bool) => Ok(PrefValue::Bool(*i != 0)),
            (PrefValue::String(s), PrefType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(PrefValue::Bool(true)),
                "false" => Ok(PrefValue::Bool(false)),
                _ => Err(fail()),
            },
            (value, PrefType::String) => Ok(PrefValue::String(value.to_string())),
            _ => Err(fail()),
        }
    }

    /// Numeric strings become integers; everything else is kept
    pub fn numeric_or_self(self) -> PrefValue {
        match &self {
            PrefValue::String(s) => match s.trim().parse::<i64>() {
                Ok(i) => PrefValue::Int(i),
                Err(_) => self,
            },
            _ => self,
        }
    }

    /// Scalar JSON values; `None` for null, floats, arrays and objects
    pub fn from_json(value: &serde_json::Value) -> Option<PrefValue> {
        match value {
            serde_json::Value::Bool(b) => Some(PrefValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(PrefValue::Int),
            serde_json::Value::String(s) => Some(PrefValue::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{}", b),
            PrefValue::Int(i) => write!(f, "{}", i),
            PrefValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Int(value)
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        PrefValue::Int(i64::from(value))
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}
