//! Lazy, ordered key/value sequences.
//!
//! A [`Sequence`] is in one of three states:
//! - *collected*: a concrete [`Collection`]; re-iterable, O(1) count and lookup.
//! - *streaming*: a boxed [`Stage`] pulled one entry at a time; single-pass.
//! - *drained*: a stream that has been pulled to the end.
//!
//! When a streaming sequence is exhausted through [`Sequence::iter`], the stage
//! is asked for a replay buffer ([`Stage::replay`]). If it has one, the sequence
//! becomes collected with those entries; otherwise it is drained and any later
//! iteration yields nothing.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::accessor::type_name;
use crate::budget::BufferBudget;
use crate::error::{Error, Result};
use crate::item::Item;
use crate::key::Key;

pub type Entry = (Key, Item);

/// One pull-based step of a pipeline.
pub trait Stage {
    /// Produce the next entry, or `None` once the stage is exhausted.
    fn pull(&mut self) -> Option<Result<Entry>>;

    /// Entries to replay from the start once this stage has been drained.
    ///
    /// Called at most once, right after `pull` returned `None`.
    fn replay(&mut self) -> Option<Collection> {
        None
    }
}

struct Streamed<I>(I);

impl<I> Stage for Streamed<I>
where
    I: Iterator<Item = Result<Entry>>,
{
    fn pull(&mut self) -> Option<Result<Entry>> {
        self.0.next()
    }
}

/// Runs `build` on the first pull, then streams what it produced.
struct Deferred<F> {
    build: Option<F>,
    entries: std::vec::IntoIter<Entry>,
}

impl<F> Stage for Deferred<F>
where
    F: FnOnce() -> Result<Vec<Entry>>,
{
    fn pull(&mut self) -> Option<Result<Entry>> {
        if let Some(build) = self.build.take() {
            match build() {
                Ok(entries) => self.entries = entries.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        self.entries.next().map(Ok)
    }
}

/// A partly drained stage: entries already pulled, then the remainder.
struct Resume {
    prefix: std::vec::IntoIter<Entry>,
    rest: Box<dyn Stage>,
}

impl Stage for Resume {
    fn pull(&mut self) -> Option<Result<Entry>> {
        match self.prefix.next() {
            Some(entry) => Some(Ok(entry)),
            None => self.rest.pull(),
        }
    }

    fn replay(&mut self) -> Option<Collection> {
        self.rest.replay()
    }
}

/// Ordered keyed collection. Duplicate keys are kept in order; lookups see the
/// first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    entries: Vec<Entry>,
    index: HashMap<Key, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap),
            index: HashMap::with_capacity(cap),
        }
    }

    pub fn push(&mut self, key: Key, item: Item) {
        let pos = self.entries.len();
        self.index.entry(key.clone()).or_insert(pos);
        self.entries.push((key, item));
    }

    pub fn get(&self, key: &Key) -> Option<&Item> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Item> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Render as JSON: an array when the keys are exactly `0..len`, otherwise an
    /// object keyed by the keys' string form (first occurrence wins).
    pub fn to_json(&self) -> Value {
        let sequential = self
            .entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Int(i as i64));
        if sequential {
            return Value::Array(self.values().map(|v| v.as_value().into_owned()).collect());
        }
        let mut map = Map::new();
        for (k, v) in &self.entries {
            map.entry(k.to_string())
                .or_insert_with(|| v.as_value().into_owned());
        }
        Value::Object(map)
    }
}

impl FromIterator<Entry> for Collection {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        let mut c = Collection::new();
        for (k, v) in iter {
            c.push(k, v);
        }
        c
    }
}

impl IntoIterator for Collection {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

enum State {
    Collected(Collection),
    Streaming(Box<dyn Stage>),
    Drained,
}

pub struct Sequence {
    state: State,
}

impl Sequence {
    pub fn empty() -> Self {
        Self::collected(Collection::new())
    }

    pub fn collected(c: Collection) -> Self {
        Self {
            state: State::Collected(c),
        }
    }

    /// Wrap an array (keys `0..n`) or an object (keys from its fields).
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(values) => Ok(Self::from_values(values)),
            Value::Object(map) => Ok(Self::from_entries(
                map.into_iter().map(|(k, v)| (Key::parse(&k), v)),
            )),
            other => Err(Error::InvalidInput(format!(
                "expected an array or an object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// In-memory values keyed `0..n`.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::collected(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), Item::Single(v)))
                .collect(),
        )
    }

    /// In-memory entries, in the given order.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Item>,
    {
        Self::collected(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Single-pass stream of values keyed `0..`.
    pub fn lazy<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::from_results(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| Ok((Key::from(i), Item::Single(v)))),
        )
    }

    /// Single-pass stream of fallible entries.
    pub fn from_results<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Result<Entry>>,
        I::IntoIter: 'static,
    {
        Self::from_stage(Streamed(entries.into_iter()))
    }

    pub fn from_stage(stage: impl Stage + 'static) -> Self {
        Self {
            state: State::Streaming(Box::new(stage)),
        }
    }

    /// Build entries on first pull, then stream them.
    pub fn deferred<F>(build: F) -> Self
    where
        F: FnOnce() -> Result<Vec<Entry>> + 'static,
    {
        Self::from_stage(Deferred {
            build: Some(build),
            entries: Vec::new().into_iter(),
        })
    }

    pub fn is_collected(&self) -> bool {
        matches!(self.state, State::Collected(_))
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match &self.state {
            State::Collected(c) => Some(c),
            _ => None,
        }
    }

    /// Pull cursor. Collected sequences are re-iterable; streams are consumed.
    pub fn iter(&mut self) -> Iter<'_> {
        Iter {
            seq: self,
            pos: 0,
            done: false,
        }
    }

    /// Materialize and keep the entries. Idempotent once collected.
    pub fn to_collection(&mut self) -> Result<&Collection> {
        self.to_collection_within(BufferBudget::unbounded(), "to_array")
    }

    pub fn to_collection_within(
        &mut self,
        budget: BufferBudget,
        operator: &'static str,
    ) -> Result<&Collection> {
        if !self.is_collected() {
            let collected = match std::mem::replace(&mut self.state, State::Drained) {
                State::Streaming(mut stage) => {
                    let mut c = Collection::new();
                    if let Err(e) = drain(stage.as_mut(), &mut c, budget, operator) {
                        // a retry sees the drained prefix before the rest
                        self.state = State::Streaming(Box::new(Resume {
                            prefix: c.into_entries().into_iter(),
                            rest: stage,
                        }));
                        return Err(e);
                    }
                    c
                }
                State::Collected(c) => c,
                State::Drained => Collection::new(),
            };
            tracing::debug!(operator, entries = collected.len(), "materialized sequence");
            self.state = State::Collected(collected);
        }
        match &self.state {
            State::Collected(c) => Ok(c),
            _ => unreachable!("sequence was just materialized"),
        }
    }

    /// Number of entries; only consumes the sequence when it is a stream.
    pub fn count(&mut self) -> Result<usize> {
        if let Some(c) = self.as_collection() {
            return Ok(c.len());
        }
        let mut n = 0;
        for entry in self.iter() {
            entry?;
            n += 1;
        }
        Ok(n)
    }

    /// First item stored under `key`. Scans (and consumes) streams.
    pub fn get(&mut self, key: &Key) -> Result<Option<Item>> {
        if let Some(c) = self.as_collection() {
            return Ok(c.get(key).cloned());
        }
        for entry in self.iter() {
            let (k, v) = entry?;
            if &k == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    /// Hand the entries to another stage, giving up any replay capability.
    pub fn into_stage(self) -> Box<dyn Stage> {
        match self.state {
            State::Collected(c) => Box::new(Streamed(c.into_entries().into_iter().map(Ok))),
            State::Streaming(stage) => stage,
            State::Drained => Box::new(Streamed(std::iter::empty())),
        }
    }
}

/// Pull `stage` dry into `c`. On failure `c` holds every entry pulled so far,
/// including the one that broke the budget.
fn drain(
    stage: &mut dyn Stage,
    c: &mut Collection,
    budget: BufferBudget,
    operator: &'static str,
) -> Result<()> {
    while let Some(entry) = stage.pull() {
        let (k, v) = entry?;
        let admitted = budget.check(c.len(), operator);
        c.push(k, v);
        admitted?;
    }
    Ok(())
}

impl Default for Sequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Collected(c) => f.debug_tuple("Sequence::Collected").field(c).finish(),
            State::Streaming(_) => f.write_str("Sequence::Streaming"),
            State::Drained => f.write_str("Sequence::Drained"),
        }
    }
}

impl From<Collection> for Sequence {
    fn from(c: Collection) -> Self {
        Self::collected(c)
    }
}

impl From<Vec<Value>> for Sequence {
    fn from(values: Vec<Value>) -> Self {
        Self::from_values(values)
    }
}

impl TryFrom<Value> for Sequence {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_json(value)
    }
}

impl FromIterator<Value> for Sequence {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

pub struct Iter<'a> {
    seq: &'a mut Sequence,
    pos: usize,
    done: bool,
}

impl Iterator for Iter<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match &mut self.seq.state {
            State::Collected(c) => match c.entries.get(self.pos) {
                Some(entry) => {
                    self.pos += 1;
                    Some(Ok(entry.clone()))
                }
                None => {
                    self.done = true;
                    None
                }
            },
            State::Streaming(stage) => match stage.pull() {
                Some(entry) => Some(entry),
                None => {
                    let replay = stage.replay();
                    self.seq.state = match replay {
                        Some(c) => State::Collected(c),
                        None => State::Drained,
                    };
                    self.done = true;
                    None
                }
            },
            State::Drained => {
                self.done = true;
                None
            }
        }
    }
}

/// Owned pull over a sequence.
pub struct IntoIter(Box<dyn Stage>);

impl Iterator for IntoIter {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.pull()
    }
}

impl IntoIterator for Sequence {
    type Item = Result<Entry>;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.into_stage())
    }
}
