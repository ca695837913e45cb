use serde_json::Value;

use lazypipe_core::context::Context;
use lazypipe_core::item::Item;
use lazypipe_core::sequence::{Collection, Entry, Sequence, Stage};
use lazypipe_core::{Error, Result};

/// Pairs each primary entry with the same key in every other sequence.
///
/// The others are materialized on the first pull; a key missing from any of
/// them fails that pull with `KeyNotFound`. If materializing fails, that pull
/// returns the error and the stage ends.
pub(crate) struct ZipStage {
    primary: Box<dyn Stage>,
    pending: Vec<Sequence>,
    others: Vec<Collection>,
    ctx: Context,
    failed: bool,
}

impl ZipStage {
    pub(crate) fn new(primary: Box<dyn Stage>, others: Vec<Sequence>, ctx: Context) -> Self {
        Self {
            primary,
            pending: others,
            others: Vec::new(),
            ctx,
            failed: false,
        }
    }

    fn materialize(&mut self) -> Result<()> {
        let budget = self.ctx.budget();
        for mut seq in std::mem::take(&mut self.pending) {
            let c = seq.to_collection_within(budget, "zip")?;
            self.others.push(c.clone());
        }
        Ok(())
    }
}

impl Stage for ZipStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        if self.failed {
            return None;
        }
        if !self.pending.is_empty() {
            if let Err(e) = self.materialize() {
                self.failed = true;
                return Some(Err(e));
            }
        }
        let (key, item) = match self.primary.pull()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let mut row = Vec::with_capacity(1 + self.others.len());
        row.push(item.into_value());
        for other in &self.others {
            match other.get(&key) {
                Some(v) => row.push(v.as_value().into_owned()),
                None => return Some(Err(Error::KeyNotFound(key))),
            }
        }
        Some(Ok((key, Item::Single(Value::Array(row)))))
    }
}
