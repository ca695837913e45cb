//! Property access over opaque records.
//!
//! Path-based operators (`keep_where`, `key`, `pluck`, `join`, `merge`) reach
//! into records through an [`Accessor`]. Resolution failures are errors, never
//! sentinel values, so the operators can propagate them.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub trait Accessor {
    /// Read the value at `path` in `record`.
    fn read(&self, record: &Value, path: &str) -> Result<Value>;

    /// Write `value` at `path` in `record`, creating missing parents.
    fn write(&self, record: &mut Value, path: &str, value: Value) -> Result<()>;
}

/// Dotted-path accessor: `user.address.city`, `items.0.price`.
///
/// Object segments look up fields; on arrays a segment must be an index.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathAccessor;

impl PathAccessor {
    pub fn new() -> Self {
        Self
    }
}

fn segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::property_not_found(path, "empty property path"));
    }
    Ok(path.split('.').collect())
}

impl Accessor for PathAccessor {
    fn read(&self, record: &Value, path: &str) -> Result<Value> {
        let mut current = record;
        for seg in segments(path)? {
            current = match current {
                Value::Object(map) => map
                    .get(seg)
                    .ok_or_else(|| Error::property_not_found(path, format!("no field '{}'", seg)))?,
                Value::Array(arr) => {
                    let idx = seg.parse::<usize>().map_err(|_| {
                        Error::property_not_found(
                            path,
                            format!("'{}' is not an index into an array", seg),
                        )
                    })?;
                    arr.get(idx).ok_or_else(|| {
                        Error::property_not_found(path, format!("index {} out of bounds", idx))
                    })?
                }
                other => {
                    return Err(Error::property_not_found(
                        path,
                        format!("cannot read '{}' from {}", seg, type_name(other)),
                    ))
                }
            };
        }
        Ok(current.clone())
    }

    fn write(&self, record: &mut Value, path: &str, value: Value) -> Result<()> {
        let segs = segments(path)?;
        let (last, parents) = segs
            .split_last()
            .ok_or_else(|| Error::property_not_found(path, "empty property path"))?;

        let mut current = record;
        for seg in parents {
            current = match current {
                Value::Object(map) => map
                    .entry(seg.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(arr) => {
                    let idx = seg.parse::<usize>().ok().filter(|i| *i < arr.len());
                    match idx {
                        Some(i) => &mut arr[i],
                        None => {
                            return Err(Error::property_not_found(
                                path,
                                format!("'{}' is not an index into an array", seg),
                            ))
                        }
                    }
                }
                other => {
                    return Err(Error::property_not_found(
                        path,
                        format!("cannot write through {}", type_name(other)),
                    ))
                }
            };
        }

        match current {
            Value::Object(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            Value::Array(arr) => match last.parse::<usize>() {
                Ok(i) if i < arr.len() => {
                    arr[i] = value;
                    Ok(())
                }
                Ok(i) if i == arr.len() => {
                    arr.push(value);
                    Ok(())
                }
                _ => Err(Error::property_not_found(
                    path,
                    format!("'{}' is not an index into an array", last),
                )),
            },
            other => Err(Error::property_not_found(
                path,
                format!("cannot write into {}", type_name(other)),
            )),
        }
    }
}

pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
