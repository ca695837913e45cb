//! Re-keying (`key`) and bucketing (`project`).

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use lazypipe_core::context::Context;
use lazypipe_core::item::{Args, Item};
use lazypipe_core::key::Key;
use lazypipe_core::sequence::{Entry, Sequence, Stage};
use lazypipe_core::Result;

/// How to derive a key from an entry: a property path or a function.
pub enum Selector {
    Path(String),
    Func(Box<dyn FnMut(Args<'_>) -> Result<Key>>),
}

impl Selector {
    pub fn path(path: impl Into<String>) -> Self {
        Selector::Path(path.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: FnMut(Args<'_>) -> Result<Key> + 'static,
    {
        Selector::Func(Box::new(f))
    }

    pub(crate) fn select(&mut self, ctx: &Context, key: &Key, item: &Item) -> Result<Key> {
        match self {
            Selector::Path(path) => {
                let args = item.args(key);
                Key::from_value(&ctx.accessor().read(args.value(), path)?)
            }
            Selector::Func(f) => f(item.args(key)),
        }
    }
}

impl From<&str> for Selector {
    fn from(path: &str) -> Self {
        Selector::Path(path.to_string())
    }
}

impl From<String> for Selector {
    fn from(path: String) -> Self {
        Selector::Path(path)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(p) => f.debug_tuple("Selector::Path").field(p).finish(),
            Selector::Func(_) => f.write_str("Selector::Func"),
        }
    }
}

pub(crate) struct RekeyStage {
    upstream: Box<dyn Stage>,
    selector: Selector,
    ctx: Context,
}

impl RekeyStage {
    pub(crate) fn new(upstream: Box<dyn Stage>, selector: Selector, ctx: Context) -> Self {
        Self {
            upstream,
            selector,
            ctx,
        }
    }
}

impl Stage for RekeyStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        let (key, item) = match self.upstream.pull()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        Some(
            self.selector
                .select(&self.ctx, &key, &item)
                .map(|new_key| (new_key, item)),
        )
    }
}

/// Group entries into `group key -> [items...]`, buckets in first-seen order.
///
/// Runs on first pull; the buffered item count is capped by the context budget.
pub(crate) fn project(upstream: Sequence, mut selector: Selector, ctx: Context) -> Sequence {
    Sequence::deferred(move || {
        let budget = ctx.budget();
        let mut order: HashMap<Key, usize> = HashMap::new();
        let mut buckets: Vec<(Key, Vec<Value>)> = Vec::new();
        let mut buffered = 0usize;

        for entry in upstream {
            let (key, item) = entry?;
            let group = selector.select(&ctx, &key, &item)?;
            budget.check(buffered, "project")?;
            buffered += 1;
            let slot = *order.entry(group.clone()).or_insert_with(|| {
                buckets.push((group, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(item.into_value());
        }

        tracing::debug!(
            operator = "project",
            entries = buffered,
            groups = buckets.len(),
            "materialized sequence"
        );
        Ok(buckets
            .into_iter()
            .map(|(k, items)| (k, Item::Single(Value::Array(items))))
            .collect())
    })
}
