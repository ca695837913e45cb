//! Selection stage behind `keep`, `drop`, `keep_where` and `drop_where`.
//!
//! The predicate sees each item through the usual argument dispatch; `keep`
//! passes entries that match, `drop` passes the complement.

use lazypipe_core::context::Context;
use lazypipe_core::item::Args;
use lazypipe_core::sequence::{Entry, Stage};
use lazypipe_core::Result;

use crate::compare::Comparator;

pub(crate) struct SelectStage<P> {
    upstream: Box<dyn Stage>,
    pred: P,
    keep: bool,
}

impl<P> SelectStage<P>
where
    P: FnMut(Args<'_>) -> Result<bool>,
{
    pub(crate) fn new(upstream: Box<dyn Stage>, pred: P, keep: bool) -> Self {
        Self {
            upstream,
            pred,
            keep,
        }
    }
}

impl<P> Stage for SelectStage<P>
where
    P: FnMut(Args<'_>) -> Result<bool>,
{
    fn pull(&mut self) -> Option<Result<Entry>> {
        loop {
            let (key, item) = match self.upstream.pull()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            match (self.pred)(item.args(&key)) {
                Ok(hit) if hit == self.keep => return Some(Ok((key, item))),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Predicate evaluating a comparator against the first argument of each item.
pub(crate) fn where_predicate(
    cmp: Comparator,
    ctx: Context,
) -> impl FnMut(Args<'_>) -> Result<bool> {
    move |args| cmp.matches(ctx.accessor(), args.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazypipe_core::sequence::Sequence;
    use serde_json::{json, Value};

    fn run<P>(values: Vec<Value>, pred: P, keep: bool) -> Vec<Value>
    where
        P: FnMut(Args<'_>) -> Result<bool> + 'static,
    {
        let upstream = Sequence::from_values(values).into_stage();
        Sequence::from_stage(SelectStage::new(upstream, pred, keep))
            .into_iter()
            .map(|e| e.unwrap().1.into_value())
            .collect()
    }

    #[test]
    fn keep_and_drop_are_complements() {
        let even = |a: Args<'_>| Ok(a.value().as_i64().unwrap_or(1) % 2 == 0);
        let input: Vec<Value> = (0..6).map(|i| json!(i)).collect();
        assert_eq!(run(input.clone(), even, true), vec![json!(0), json!(2), json!(4)]);
        assert_eq!(run(input, even, false), vec![json!(1), json!(3), json!(5)]);
    }

    #[test]
    fn comparator_predicate() {
        let cmp = Comparator::parse("age", json!(30), ">=").unwrap();
        let pred = where_predicate(cmp, Context::default());
        let out = run(
            vec![json!({"age": 25}), json!({"age": 30}), json!({"age": 41})],
            pred,
            true,
        );
        assert_eq!(out, vec![json!({"age": 30}), json!({"age": 41})]);
    }

    #[test]
    fn predicate_errors_surface() {
        let cmp = Comparator::parse("age", json!(30), "=").unwrap();
        let pred = where_predicate(cmp, Context::default());
        let upstream = Sequence::from_values(vec![json!({"name": "x"})]).into_stage();
        let mut seq = Sequence::from_stage(SelectStage::new(upstream, pred, true));
        assert!(seq.iter().next().unwrap().is_err());
    }
}
