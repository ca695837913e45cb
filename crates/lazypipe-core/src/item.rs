//! Pipeline items and the single dispatch rule every per-item operator uses.
//!
//! An item either carries one value or a fold of several correlated values.
//! Callables never inspect the shape themselves: they receive [`Args`], which
//! exposes the single value together with its key, or the folded arguments
//! positionally.

use std::borrow::Cow;

use serde_json::Value;

use crate::error::Result;
use crate::key::Key;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Single(Value),
    /// Ordered list of one or more correlated arguments.
    Folded(Vec<Value>),
}

impl Item {
    /// Build a fold. An empty argument list is not a fold and stays a plain
    /// empty array.
    pub fn folded(args: Vec<Value>) -> Self {
        if args.is_empty() {
            Item::Single(Value::Array(args))
        } else {
            Item::Folded(args)
        }
    }

    pub fn is_folded(&self) -> bool {
        matches!(self, Item::Folded(_))
    }

    /// Borrow the item as call arguments.
    pub fn args<'a>(&'a self, key: &'a Key) -> Args<'a> {
        match self {
            Item::Single(value) => Args::Single { value, key },
            Item::Folded(args) => Args::Folded(args),
        }
    }

    /// View the item as one value; a fold reads as an array of its arguments.
    pub fn as_value(&self) -> Cow<'_, Value> {
        match self {
            Item::Single(v) => Cow::Borrowed(v),
            Item::Folded(args) => Cow::Owned(Value::Array(args.clone())),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Item::Single(v) => v,
            Item::Folded(args) => Value::Array(args),
        }
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Item::Single(v)
    }
}

/// Arguments handed to a caller-supplied callable.
#[derive(Debug, Clone, Copy)]
pub enum Args<'a> {
    Single { value: &'a Value, key: &'a Key },
    /// Folded arguments; the key is deliberately not passed.
    Folded(&'a [Value]),
}

impl<'a> Args<'a> {
    /// The first positional argument.
    pub fn value(&self) -> &'a Value {
        match *self {
            Args::Single { value, .. } => value,
            Args::Folded(args) => args.first().unwrap_or(&NULL),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&'a Value> {
        match *self {
            Args::Single { value, .. } => (idx == 0).then_some(value),
            Args::Folded(args) => args.get(idx),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Args::Single { .. } => 1,
            Args::Folded(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key(&self) -> Option<&'a Key> {
        match *self {
            Args::Single { key, .. } => Some(key),
            Args::Folded(_) => None,
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        match *self {
            Args::Single { value, .. } => vec![value.clone()],
            Args::Folded(args) => args.to_vec(),
        }
    }
}

/// Invoke `f` on one entry.
///
/// Single items call `f(value, key)` and the result is passed through as is.
/// Folded items call `f(args...)`; a plain array result is re-wrapped into a
/// new fold so argument lists keep flowing through later stages.
pub fn call<T, F>(f: &mut F, key: &Key, item: &Item) -> Result<Item>
where
    T: Into<Item>,
    F: FnMut(Args<'_>) -> Result<T>,
{
    match item {
        Item::Single(value) => f(Args::Single { value, key }).map(Into::into),
        Item::Folded(args) => match f(Args::Folded(args))?.into() {
            Item::Single(Value::Array(list)) => Ok(Item::folded(list)),
            other => Ok(other),
        },
    }
}
