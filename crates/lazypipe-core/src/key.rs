//! Entry keys.
//!
//! Keys are opaque comparable tokens: an integer or a string. Strings that hold
//! a canonical decimal integer normalize to `Int`, so the object key `"5"` and a
//! record field holding `5` address the same entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Normalize a string key (`"42"` becomes `Int(42)`, `"042"` stays a string).
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Key::Int(n),
            _ => Key::Str(s.to_string()),
        }
    }

    /// Derive a key from a record value.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Key::Str(String::new())),
            Value::Bool(b) => Ok(Key::Int(i64::from(*b))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Key::Int(i))
                } else if let Some(f) = n.as_f64() {
                    // u64 beyond i64::MAX and floats both land here
                    if f.is_finite() && f.abs() < i64::MAX as f64 {
                        Ok(Key::Int(f.trunc() as i64))
                    } else {
                        Ok(Key::Str(n.to_string()))
                    }
                } else {
                    Ok(Key::Str(n.to_string()))
                }
            }
            Value::String(s) => Ok(Key::parse(s)),
            Value::Array(_) | Value::Object(_) => Err(Error::InvalidArgument(format!(
                "cannot use {} as a key",
                if value.is_array() { "an array" } else { "an object" }
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::from(*n),
            Key::Str(s) => Value::String(s.clone()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Str(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(i64::from(n))
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::parse(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::parse(&s)
    }
}
