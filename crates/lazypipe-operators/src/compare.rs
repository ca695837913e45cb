//! Field comparator behind `keep_where` / `drop_where`.
//!
//! Supports expressions of the form "path OP value" where
//! OP ∈ {=, !=, <, <=, >, >=, IN}.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use lazypipe_core::accessor::Accessor;
use lazypipe_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            ">" => Ok(CompareOp::Gt),
            "<" => Ok(CompareOp::Lt),
            ">=" => Ok(CompareOp::Ge),
            "<=" => Ok(CompareOp::Le),
            op if op.eq_ignore_ascii_case("in") => Ok(CompareOp::In),
            op => Err(Error::InvalidArgument(format!("Invalid comparator '{}'", op))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::In => "IN",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    path: String,
    value: Value,
    op: CompareOp,
}

impl Comparator {
    /// `IN` requires `value` to be an array of candidates.
    pub fn new(path: impl Into<String>, value: Value, op: CompareOp) -> Result<Self> {
        if op == CompareOp::In && !value.is_array() {
            return Err(Error::InvalidArgument(
                "IN comparator expects an array of candidates".into(),
            ));
        }
        Ok(Self {
            path: path.into(),
            value,
            op,
        })
    }

    pub fn parse(path: impl Into<String>, value: Value, op: &str) -> Result<Self> {
        Self::new(path, value, op.parse()?)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Evaluate against one record.
    pub fn matches(&self, accessor: &dyn Accessor, record: &Value) -> Result<bool> {
        let actual = accessor.read(record, &self.path)?;
        let expected = &self.value;
        Ok(match self.op {
            CompareOp::In => expected
                .as_array()
                .map_or(false, |candidates| candidates.contains(&actual)),
            CompareOp::Eq => loose_eq(&actual, expected),
            CompareOp::Ne => !loose_eq(&actual, expected),
            CompareOp::Gt => loose_cmp(&actual, expected) == Some(Ordering::Greater),
            CompareOp::Lt => loose_cmp(&actual, expected) == Some(Ordering::Less),
            CompareOp::Ge => matches!(
                loose_cmp(&actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Le => matches!(
                loose_cmp(&actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        })
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    a == b || loose_cmp(a, b) == Some(Ordering::Equal)
}

/// Order two values: numbers numerically (numeric strings included), strings
/// lexically, booleans false < true. Anything else is unordered.
fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            let x = as_number(a)?;
            let y = as_number(b)?;
            x.partial_cmp(&y)
        }
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
