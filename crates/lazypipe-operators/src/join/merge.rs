//! Two-source merge on an explicit field pair.
//!
//! The secondary side is indexed once (first occurrence of a join value wins),
//! then primaries stream through: a match writes the secondary value into the
//! primary record at the target path. Unmatched secondaries are emitted after
//! the primaries for `Right` and `Full`.

use std::collections::HashMap;

use serde_json::{Map, Value};

use lazypipe_core::context::Context;
use lazypipe_core::item::Item;
use lazypipe_core::key::Key;
use lazypipe_core::sequence::{Entry, Sequence, Stage};
use lazypipe_core::Result;

use super::JoinType;

/// `MergeSpec` with the target path resolved.
pub(crate) struct MergePlan {
    pub into: String,
    pub left_field: Option<String>,
    pub right_field: Option<String>,
    pub kind: JoinType,
}

struct Secondary {
    entries: Vec<(Key, Value)>,
    by_join_value: HashMap<Key, usize>,
    matched: Vec<bool>,
}

pub(crate) struct MergeStage {
    primary: Box<dyn Stage>,
    pending: Option<Sequence>,
    secondary: Option<Secondary>,
    plan: MergePlan,
    ctx: Context,
    primary_done: bool,
    leftover: usize,
    failed: bool,
}

impl MergeStage {
    pub(crate) fn new(primary: Box<dyn Stage>, other: Sequence, plan: MergePlan, ctx: Context) -> Self {
        Self {
            primary,
            pending: Some(other),
            secondary: None,
            plan,
            ctx,
            primary_done: false,
            leftover: 0,
            failed: false,
        }
    }

    fn join_key(&self, field: Option<&str>, key: &Key, value: &Value) -> Result<Key> {
        match field {
            Some(path) => Key::from_value(&self.ctx.accessor().read(value, path)?),
            None => Ok(key.clone()),
        }
    }

    fn index(&self, other: Sequence) -> Result<Secondary> {
        let budget = self.ctx.budget();
        let mut entries = Vec::new();
        let mut by_join_value = HashMap::new();
        for entry in other {
            let (key, item) = entry?;
            budget.check(entries.len(), "merge")?;
            let value = item.into_value();
            let join_value = self.join_key(self.plan.right_field.as_deref(), &key, &value)?;
            by_join_value.entry(join_value).or_insert(entries.len());
            entries.push((key, value));
        }
        tracing::debug!(operator = "merge", entries = entries.len(), "materialized sequence");
        let matched = vec![false; entries.len()];
        Ok(Secondary {
            entries,
            by_join_value,
            matched,
        })
    }

    fn next_primary(&mut self) -> Option<Result<Entry>> {
        loop {
            let (key, item) = match self.primary.pull()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let mut record = item.into_value();
            let join_value = match self.join_key(self.plan.left_field.as_deref(), &key, &record) {
                Ok(k) => k,
                Err(e) => return Some(Err(e)),
            };
            let hit = self.secondary.as_mut().and_then(|s| {
                let idx = *s.by_join_value.get(&join_value)?;
                s.matched[idx] = true;
                Some(s.entries[idx].1.clone())
            });
            match hit {
                Some(value) => {
                    if let Err(e) = self.ctx.accessor().write(&mut record, &self.plan.into, value) {
                        return Some(Err(e));
                    }
                    return Some(Ok((key, Item::Single(record))));
                }
                None if matches!(self.plan.kind, JoinType::Left | JoinType::Full) => {
                    return Some(Ok((key, Item::Single(record))));
                }
                None => continue,
            }
        }
    }

    fn next_unmatched(&mut self) -> Option<Result<Entry>> {
        if !matches!(self.plan.kind, JoinType::Right | JoinType::Full) {
            return None;
        }
        let secondary = self.secondary.as_ref()?;
        while self.leftover < secondary.entries.len() {
            let idx = self.leftover;
            self.leftover += 1;
            if secondary.matched[idx] {
                continue;
            }
            let (key, value) = &secondary.entries[idx];
            let mut wrapped = Value::Object(Map::new());
            if let Err(e) = self
                .ctx
                .accessor()
                .write(&mut wrapped, &self.plan.into, value.clone())
            {
                return Some(Err(e));
            }
            return Some(Ok((key.clone(), Item::Single(wrapped))));
        }
        None
    }
}

impl Stage for MergeStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        if self.failed {
            return None;
        }
        if let Some(other) = self.pending.take() {
            match self.index(other) {
                Ok(secondary) => self.secondary = Some(secondary),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        if !self.primary_done {
            match self.next_primary() {
                Some(entry) => return Some(entry),
                None => self.primary_done = true,
            }
        }
        self.next_unmatched()
    }
}
