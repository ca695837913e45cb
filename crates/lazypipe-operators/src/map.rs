//! Per-item transforms: `map`, `exec` and `pluck`.
//!
//! `map` and `pluck` keep a replay buffer of the entries they consumed. Once a
//! mapped or plucked sequence has been drained, iterating it again yields the
//! original (pre-transform) entries.

use std::marker::PhantomData;

use lazypipe_core::budget::BufferBudget;
use lazypipe_core::context::Context;
use lazypipe_core::item::{call, Args, Item};
use lazypipe_core::sequence::{Collection, Entry, Stage};
use lazypipe_core::Result;

/// Owned buffer filled while a stage is drained for the first time.
///
/// Buffering is best-effort: when the budget is exhausted the buffer is
/// abandoned and the stage no longer offers a replay.
pub(crate) struct ReplayBuffer {
    entries: Option<Collection>,
    budget: BufferBudget,
    operator: &'static str,
}

impl ReplayBuffer {
    pub(crate) fn new(budget: BufferBudget, operator: &'static str) -> Self {
        Self {
            entries: Some(Collection::new()),
            budget,
            operator,
        }
    }

    pub(crate) fn record(&mut self, entry: &Entry) {
        let Some(c) = self.entries.as_mut() else {
            return;
        };
        if self.budget.admits(c.len()) {
            c.push(entry.0.clone(), entry.1.clone());
        } else {
            tracing::debug!(
                operator = self.operator,
                limit = ?self.budget.limit(),
                "replay buffer abandoned"
            );
            self.entries = None;
        }
    }

    pub(crate) fn take(&mut self) -> Option<Collection> {
        self.entries.take()
    }
}

pub(crate) struct MapStage<F, T> {
    upstream: Box<dyn Stage>,
    f: F,
    replay: ReplayBuffer,
    _out: PhantomData<fn() -> T>,
}

impl<F, T> MapStage<F, T>
where
    T: Into<Item>,
    F: FnMut(Args<'_>) -> Result<T>,
{
    pub(crate) fn new(upstream: Box<dyn Stage>, f: F, budget: BufferBudget) -> Self {
        Self {
            upstream,
            f,
            replay: ReplayBuffer::new(budget, "map"),
            _out: PhantomData,
        }
    }
}

impl<F, T> Stage for MapStage<F, T>
where
    T: Into<Item>,
    F: FnMut(Args<'_>) -> Result<T>,
{
    fn pull(&mut self) -> Option<Result<Entry>> {
        let entry = match self.upstream.pull()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        self.replay.record(&entry);
        let (key, item) = entry;
        Some(call(&mut self.f, &key, &item).map(|out| (key, out)))
    }

    fn replay(&mut self) -> Option<Collection> {
        self.replay.take()
    }
}

pub(crate) struct ExecStage<F> {
    upstream: Box<dyn Stage>,
    effect: F,
}

impl<F> ExecStage<F>
where
    F: FnMut(Args<'_>) -> Result<()>,
{
    pub(crate) fn new(upstream: Box<dyn Stage>, effect: F) -> Self {
        Self { upstream, effect }
    }
}

impl<F> Stage for ExecStage<F>
where
    F: FnMut(Args<'_>) -> Result<()>,
{
    fn pull(&mut self) -> Option<Result<Entry>> {
        let (key, item) = match self.upstream.pull()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        if let Err(e) = (self.effect)(item.args(&key)) {
            return Some(Err(e));
        }
        Some(Ok((key, item)))
    }
}

pub(crate) struct PluckStage {
    upstream: Box<dyn Stage>,
    path: String,
    ctx: Context,
    replay: ReplayBuffer,
}

impl PluckStage {
    pub(crate) fn new(upstream: Box<dyn Stage>, path: String, ctx: Context) -> Self {
        let replay = ReplayBuffer::new(ctx.budget(), "pluck");
        Self {
            upstream,
            path,
            ctx,
            replay,
        }
    }
}

impl Stage for PluckStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        let entry = match self.upstream.pull()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let plucked = self.ctx.accessor().read(&entry.1.as_value(), &self.path);
        self.replay.record(&entry);
        Some(plucked.map(|v| (entry.0, Item::Single(v))))
    }

    fn replay(&mut self) -> Option<Collection> {
        self.replay.take()
    }
}
