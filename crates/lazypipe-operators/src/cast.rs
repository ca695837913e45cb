//! Per-field record conversion for `cast`.
//!
//! A [`Decoder`] names the fields it knows and how to convert each one. Nulls
//! are kept as null; fields the decoder does not declare pass through unless
//! `deny_unknown_fields` is set.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Number, Value};

use lazypipe_core::item::Item;
use lazypipe_core::key::Key;
use lazypipe_core::sequence::{Entry, Stage};
use lazypipe_core::{Error, Result};

type CustomFn = Rc<dyn Fn(&Value) -> Result<Value>>;

#[derive(Clone)]
enum FieldCast {
    String,
    Integer,
    Float,
    Boolean,
    Custom(CustomFn),
}

impl FieldCast {
    fn apply(&self, field: &str, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            FieldCast::String => Ok(Value::String(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            FieldCast::Integer => to_integer(value)
                .map(Value::from)
                .ok_or_else(|| invalid(field, "an integer", value)),
            FieldCast::Float => to_float(value)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(field, "a float", value)),
            FieldCast::Boolean => to_bool(value)
                .map(Value::Bool)
                .ok_or_else(|| invalid(field, "a boolean", value)),
            FieldCast::Custom(f) => f(value),
        }
    }
}

fn invalid(field: &str, wanted: &str, value: &Value) -> Error {
    Error::InvalidInput(format!("field '{}': cannot cast {} to {}", field, value, wanted))
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Clone, Default)]
pub struct Decoder {
    fields: Vec<(String, FieldCast)>,
    deny_unknown: bool,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(self, field: impl Into<String>) -> Self {
        self.field(field, FieldCast::String)
    }

    pub fn integer(self, field: impl Into<String>) -> Self {
        self.field(field, FieldCast::Integer)
    }

    pub fn float(self, field: impl Into<String>) -> Self {
        self.field(field, FieldCast::Float)
    }

    pub fn boolean(self, field: impl Into<String>) -> Self {
        self.field(field, FieldCast::Boolean)
    }

    /// Convert `field` with a caller-supplied function. Not called for nulls.
    pub fn custom<F>(self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + 'static,
    {
        self.field(field, FieldCast::Custom(Rc::new(f)))
    }

    /// Fail with `PropertyNotFound` on fields the decoder does not declare.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    fn field(mut self, field: impl Into<String>, cast: FieldCast) -> Self {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = cast,
            None => self.fields.push((field, cast)),
        }
        self
    }

    fn lookup(&self, field: &str) -> Option<&FieldCast> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, cast)| cast)
    }

    /// Convert one record. Records must be objects.
    pub fn decode(&self, record: &Value) -> Result<Value> {
        let Value::Object(map) = record else {
            return Err(Error::InvalidInput(format!(
                "cast expects object records, got {}",
                record
            )));
        };
        let mut out = Map::with_capacity(map.len());
        for (name, value) in map {
            let converted = match self.lookup(name) {
                Some(cast) => cast.apply(name, value)?,
                None if self.deny_unknown => {
                    return Err(Error::property_not_found(
                        name.as_str(),
                        "field is not declared by the decoder",
                    ))
                }
                None => value.clone(),
            };
            out.insert(name.clone(), converted);
        }
        Ok(Value::Object(out))
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("Decoder")
            .field("fields", &names)
            .field("deny_unknown", &self.deny_unknown)
            .finish()
    }
}

pub(crate) struct CastStage {
    upstream: Box<dyn Stage>,
    decoder: Decoder,
}

impl CastStage {
    pub(crate) fn new(upstream: Box<dyn Stage>, decoder: Decoder) -> Self {
        Self { upstream, decoder }
    }

    fn decode_entry(&self, key: Key, item: Item) -> Result<Entry> {
        let decoded = match item {
            Item::Single(v) => Item::Single(self.decoder.decode(&v)?),
            Item::Folded(args) => Item::Folded(
                args.iter()
                    .map(|v| self.decoder.decode(v))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok((key, decoded))
    }
}

impl Stage for CastStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        let entry = self.upstream.pull()?;
        Some(entry.and_then(|(key, item)| self.decode_entry(key, item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoder() -> Decoder {
        Decoder::new()
            .string("name")
            .integer("age")
            .float("score")
            .boolean("active")
    }

    #[test]
    fn converts_declared_fields() {
        let out = decoder()
            .decode(&json!({
                "name": 42,
                "age": "31",
                "score": "7.5",
                "active": "yes",
                "city": "NY"
            }))
            .unwrap();
        assert_eq!(
            out,
            json!({"name": "42", "age": 31, "score": 7.5, "active": true, "city": "NY"})
        );
    }

    #[test]
    fn nulls_are_preserved() {
        let out = decoder().decode(&json!({"age": null})).unwrap();
        assert_eq!(out, json!({"age": null}));
    }

    #[test]
    fn unconvertible_values_fail() {
        let err = decoder().decode(&json!({"age": "old"})).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(decoder().decode(&json!([1, 2])).is_err());
    }

    #[test]
    fn unknown_fields_can_be_denied() {
        let strict = decoder().deny_unknown_fields();
        assert!(matches!(
            strict.decode(&json!({"city": "NY"})),
            Err(Error::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn custom_functions_run() {
        let d = Decoder::new().custom("tags", |v| {
            Ok(Value::Array(
                v.as_str()
                    .unwrap_or_default()
                    .split(';')
                    .map(|t| Value::String(t.to_string()))
                    .collect(),
            ))
        });
        assert_eq!(
            d.decode(&json!({"tags": "a;b"})).unwrap(),
            json!({"tags": ["a", "b"]})
        );
    }
}
