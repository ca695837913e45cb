//! The fluent `Pipeline` facade.
//!
//! Each operator consumes the pipeline and returns a new one wrapping the
//! previous sequence; nothing is pulled until a terminal (`iter`, `reduce`,
//! `run`, `get`, `to_array`, `count`, ...) runs. The label and context carry
//! through every operator.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use lazypipe_core::context::Context;
use lazypipe_core::id::PipeId;
use lazypipe_core::item::{Args, Item};
use lazypipe_core::key::Key;
use lazypipe_core::sequence::{self, Collection, Sequence};
use lazypipe_core::{Error, Result};

use crate::cast::{CastStage, Decoder};
use crate::compare::Comparator;
use crate::concat::ConcatStage;
use crate::filter::{where_predicate, SelectStage};
use crate::group::{self, RekeyStage, Selector};
use crate::join::intersect::IntersectStage;
use crate::join::keyed::{self, JoinSource};
use crate::join::merge::{MergePlan, MergeStage};
use crate::join::zip::ZipStage;
use crate::join::{JoinOn, JoinType, MergeSpec};
use crate::limit::LimitStage;
use crate::map::{ExecStage, MapStage, PluckStage};

pub struct Pipeline {
    seq: Sequence,
    label: Option<String>,
    id: PipeId,
    ctx: Context,
}

impl Pipeline {
    pub fn new(seq: impl Into<Sequence>) -> Self {
        Self::with_context(seq, Context::default())
    }

    pub fn with_context(seq: impl Into<Sequence>, ctx: Context) -> Self {
        Self {
            seq: seq.into(),
            label: None,
            id: PipeId::next(),
            ctx,
        }
    }

    /// Wrap a JSON array or object; scalars fail with `InvalidInput`.
    pub fn from_json(value: Value) -> Result<Self> {
        Ok(Self::new(Sequence::from_json(value)?))
    }

    /// Single-pass pipeline over values keyed `0..`.
    pub fn lazy<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::new(Sequence::lazy(values))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn id(&self) -> PipeId {
        self.id
    }

    pub fn label(mut self, name: impl Into<String>) -> Self {
        self.label = Some(name.into());
        self
    }

    pub fn set_label(&mut self, name: impl Into<String>) {
        self.label = Some(name.into());
    }

    /// The explicit label, or `<label_prefix>-<id>` when none was given.
    pub fn get_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{}-{}", self.ctx.config().label_prefix, self.id),
        }
    }

    pub fn into_sequence(self) -> Sequence {
        self.seq
    }

    fn wrap<F>(self, f: F) -> Self
    where
        F: FnOnce(Sequence, &Context) -> Sequence,
    {
        let Pipeline { seq, label, id, ctx } = self;
        let seq = f(seq, &ctx);
        Pipeline { seq, label, id, ctx }
    }

    // ---- operators ----

    /// Replace the whole sequence with `f(sequence)`.
    pub fn filter<F>(self, f: F) -> Self
    where
        F: FnOnce(Sequence) -> Sequence,
    {
        self.wrap(|seq, _| f(seq))
    }

    pub fn map<F, T>(self, f: F) -> Self
    where
        F: FnMut(Args<'_>) -> Result<T> + 'static,
        T: Into<Item> + 'static,
    {
        self.wrap(|seq, ctx| Sequence::from_stage(MapStage::new(seq.into_stage(), f, ctx.budget())))
    }

    pub fn keep<P>(self, pred: P) -> Self
    where
        P: FnMut(Args<'_>) -> Result<bool> + 'static,
    {
        self.wrap(|seq, _| Sequence::from_stage(SelectStage::new(seq.into_stage(), pred, true)))
    }

    pub fn drop<P>(self, pred: P) -> Self
    where
        P: FnMut(Args<'_>) -> Result<bool> + 'static,
    {
        self.wrap(|seq, _| Sequence::from_stage(SelectStage::new(seq.into_stage(), pred, false)))
    }

    /// Keep items whose property at `path` compares true against `value`.
    pub fn keep_where(self, path: &str, value: Value, op: &str) -> Result<Self> {
        let cmp = Comparator::parse(path, value, op)?;
        let pred = where_predicate(cmp, self.ctx.clone());
        Ok(self.keep(pred))
    }

    pub fn drop_where(self, path: &str, value: Value, op: &str) -> Result<Self> {
        let cmp = Comparator::parse(path, value, op)?;
        let pred = where_predicate(cmp, self.ctx.clone());
        Ok(self.drop(pred))
    }

    pub fn prepend<I, S>(self, seqs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Sequence>,
    {
        let mut parts: Vec<Box<dyn sequence::Stage>> =
            seqs.into_iter().map(|s| Into::<Sequence>::into(s).into_stage()).collect();
        self.wrap(move |seq, _| {
            parts.push(seq.into_stage());
            Sequence::from_stage(ConcatStage::new(parts))
        })
    }

    pub fn append<I, S>(self, seqs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Sequence>,
    {
        let rest = seqs.into_iter().map(|s| Into::<Sequence>::into(s).into_stage());
        self.wrap(move |seq, _| {
            let parts = std::iter::once(seq.into_stage()).chain(rest);
            Sequence::from_stage(ConcatStage::new(parts))
        })
    }

    /// At most `n` entries; upstream is not pulled past the n-th.
    pub fn limit(self, n: usize) -> Self {
        self.wrap(|seq, _| Sequence::from_stage(LimitStage::new(seq.into_stage(), n)))
    }

    /// Run `effect` on each item as it passes through.
    pub fn exec<F>(self, effect: F) -> Self
    where
        F: FnMut(Args<'_>) -> Result<()> + 'static,
    {
        self.wrap(|seq, _| Sequence::from_stage(ExecStage::new(seq.into_stage(), effect)))
    }

    /// Re-key every entry by a property path or a function.
    pub fn key(self, selector: impl Into<Selector>) -> Self {
        let selector = selector.into();
        self.wrap(|seq, ctx| {
            Sequence::from_stage(RekeyStage::new(seq.into_stage(), selector, ctx.clone()))
        })
    }

    pub fn pluck(self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.wrap(|seq, ctx| Sequence::from_stage(PluckStage::new(seq.into_stage(), path, ctx.clone())))
    }

    /// Group items into `group key -> [items...]`.
    pub fn project(self, selector: impl Into<Selector>) -> Self {
        let selector = selector.into();
        self.wrap(|seq, ctx| group::project(seq, selector, ctx.clone()))
    }

    /// Convert each record field by field.
    pub fn cast(self, decoder: Decoder) -> Self {
        self.wrap(|seq, _| Sequence::from_stage(CastStage::new(seq.into_stage(), decoder)))
    }

    /// Hand the pipeline to `f` and continue with what it returns.
    pub fn dispatch<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self)
    }

    /// `k -> [value, other_1[k], ...]` for each primary entry.
    pub fn zip<I, S>(self, others: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Sequence>,
    {
        let others: Vec<Sequence> = others.into_iter().map(Into::into).collect();
        self.wrap(|seq, ctx| {
            Sequence::from_stage(ZipStage::new(seq.into_stage(), others, ctx.clone()))
        })
    }

    /// Entries whose key appears in this pipeline and in every source.
    pub fn intersect_key<I, S>(self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Sequence>,
    {
        let others: Vec<Box<dyn sequence::Stage>> =
            sources.into_iter().map(|s| Into::<Sequence>::into(s).into_stage()).collect();
        self.wrap(|seq, ctx| {
            Sequence::from_stage(IntersectStage::new(seq.into_stage(), others, ctx.budget()))
        })
    }

    /// Labelled join of this pipeline with secondary pipelines.
    ///
    /// Each result is an object keyed by pipeline label.
    pub fn join<I, J>(self, sources: I, kind: JoinType) -> Self
    where
        I: IntoIterator<Item = (J, Pipeline)>,
        J: Into<JoinOn>,
    {
        let sources: Vec<JoinSource> = sources
            .into_iter()
            .map(|(on, pipe)| JoinSource {
                on: on.into(),
                label: pipe.get_label(),
                seq: pipe.seq,
            })
            .collect();
        let primary_label = self.get_label();
        self.wrap(|seq, ctx| keyed::join(seq, primary_label, sources, kind, ctx.clone()))
    }

    /// Two-source join writing matched values of `other` into this pipeline's
    /// records.
    pub fn merge(self, other: Pipeline, spec: MergeSpec) -> Self {
        let plan = MergePlan {
            into: spec.into.unwrap_or_else(|| other.get_label()),
            left_field: spec.left_field,
            right_field: spec.right_field,
            kind: spec.kind,
        };
        let other = other.seq;
        self.wrap(|seq, ctx| {
            Sequence::from_stage(MergeStage::new(seq.into_stage(), other, plan, ctx.clone()))
        })
    }

    // ---- terminals ----

    pub fn iter(&mut self) -> sequence::Iter<'_> {
        self.seq.iter()
    }

    /// Left fold over every item.
    pub fn reduce<A, F>(&mut self, init: A, mut f: F) -> Result<A>
    where
        F: FnMut(A, Args<'_>) -> Result<A>,
    {
        let mut acc = init;
        for entry in self.seq.iter() {
            let (key, item) = entry?;
            acc = f(acc, item.args(&key))?;
        }
        Ok(acc)
    }

    /// Drain the pipeline for its side effects.
    pub fn run(&mut self) -> Result<()> {
        self.run_with_progress(|_, _| Ok(())).map(|_| ())
    }

    /// Drain the pipeline, calling `progress(n, args)` with a 1-based counter.
    pub fn run_with_progress<F>(&mut self, mut progress: F) -> Result<u64>
    where
        F: FnMut(u64, Args<'_>) -> Result<()>,
    {
        let mut n = 0u64;
        for entry in self.seq.iter() {
            let (key, item) = entry?;
            n += 1;
            progress(n, item.args(&key))?;
        }
        tracing::debug!(pipeline = %self.get_label(), entries = n, "pipeline drained");
        Ok(n)
    }

    /// First item under `key`; `KeyNotFound` when absent.
    pub fn get(&mut self, key: impl Into<Key>) -> Result<Item> {
        let key = key.into();
        match self.seq.get(&key)? {
            Some(item) => Ok(item),
            None => Err(Error::KeyNotFound(key)),
        }
    }

    pub fn get_maybe(&mut self, key: impl Into<Key>) -> Result<Option<Item>> {
        self.seq.get(&key.into())
    }

    /// Materialize and keep the entries. Once this succeeds, later calls return
    /// the same collection; after a failure a retry resumes from what was pulled.
    pub fn to_array(&mut self) -> Result<&Collection> {
        let budget = self.ctx.budget();
        self.seq.to_collection_within(budget, "to_array")
    }

    pub fn count(&mut self) -> Result<usize> {
        self.seq.count()
    }

    /// Materialize as JSON (array for keys `0..n`, object otherwise).
    pub fn to_json(&mut self) -> Result<Value> {
        Ok(self.to_array()?.to_json())
    }

    /// Deserialize every item into `T`.
    pub fn collect_as<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for entry in self.seq.iter() {
            let (_, item) = entry?;
            out.push(serde_json::from_value(item.into_value())?);
        }
        Ok(out)
    }
}

impl From<Pipeline> for Sequence {
    fn from(pipe: Pipeline) -> Self {
        pipe.seq
    }
}

impl IntoIterator for Pipeline {
    type Item = Result<sequence::Entry>;
    type IntoIter = sequence::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.seq.into_iter()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("label", &self.get_label())
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn numbers(n: i64) -> Pipeline {
        Pipeline::new((0..n).map(|i| json!(i)).collect::<Vec<_>>())
    }

    #[test]
    fn default_label_uses_prefix_and_id() {
        let p = numbers(1);
        assert_eq!(p.get_label(), format!("pipe-{}", p.id()));
        let p = p.label("people").limit(1);
        assert_eq!(p.get_label(), "people");
    }

    #[test]
    fn map_keep_reduce() {
        let total = numbers(6)
            .map(|a| Ok(json!(a.value().as_i64().unwrap_or(0) * 2)))
            .keep(|a| Ok(a.value().as_i64().unwrap_or(0) > 4))
            .reduce(0, |acc, a| Ok(acc + a.value().as_i64().unwrap_or(0)))
            .unwrap();
        assert_eq!(total, 6 + 8 + 10);
    }

    #[test]
    fn keep_where_rejects_unknown_operator() {
        assert!(matches!(
            numbers(1).keep_where("x", json!(1), "~"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn get_and_get_maybe() {
        let mut p = numbers(3);
        assert_eq!(p.get(2).unwrap(), Item::Single(json!(2)));
        assert!(matches!(p.get(7), Err(Error::KeyNotFound(Key::Int(7)))));
        assert_eq!(p.get_maybe(7).unwrap(), None);
    }

    #[test]
    fn run_with_progress_counts_from_one() {
        let mut seen = Vec::new();
        let n = numbers(3)
            .run_with_progress(|i, _| {
                seen.push(i);
                Ok(())
            })
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn dispatch_continues_with_result() {
        let mut p = numbers(5).dispatch(|p| p.limit(2));
        assert_eq!(p.count().unwrap(), 2);
    }

    #[test]
    fn collect_as_deserializes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Person {
            name: String,
        }
        let mut p = Pipeline::from_json(json!([{"name": "ann"}, {"name": "bob"}])).unwrap();
        let people: Vec<Person> = p.collect_as().unwrap();
        assert_eq!(people[1], Person { name: "bob".into() });
    }

    #[test]
    fn callable_errors_surface_at_the_pull() {
        let mut p = numbers(3).map(|a| {
            if a.value() == &json!(1) {
                Err(Error::upstream("boom"))
            } else {
                Ok(a.value().clone())
            }
        });
        let mut it = p.iter();
        assert!(it.next().unwrap().is_ok());
        assert!(matches!(it.next(), Some(Err(Error::Upstream(_)))));
    }
}
