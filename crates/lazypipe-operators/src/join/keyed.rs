//! Multi-source labelled join.
//!
//! Primary entries seed `key -> {primary_label: value}`. Each secondary entry is
//! merged under its own label into the record its key resolves to: through a
//! `property value -> primary key` index for property joins, or directly for
//! identity joins. The join kind then selects which records are emitted.

use std::collections::HashMap;

use serde_json::{Map, Value};

use lazypipe_core::context::Context;
use lazypipe_core::item::Item;
use lazypipe_core::key::Key;
use lazypipe_core::sequence::{Entry, Sequence};
use lazypipe_core::Result;

use super::{JoinOn, JoinType};

/// One secondary participant: how it matches, its label, its entries.
pub(crate) struct JoinSource {
    pub on: JoinOn,
    pub label: String,
    pub seq: Sequence,
}

/// Records in first-seen key order.
#[derive(Default)]
struct Records {
    order: Vec<(Key, Map<String, Value>)>,
    slots: HashMap<Key, usize>,
}

impl Records {
    fn slot(&mut self, key: Key) -> &mut Map<String, Value> {
        let idx = match self.slots.get(&key) {
            Some(&idx) => idx,
            None => {
                self.slots.insert(key.clone(), self.order.len());
                self.order.push((key, Map::new()));
                self.order.len() - 1
            }
        };
        &mut self.order[idx].1
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

pub(crate) fn join(
    primary: Sequence,
    primary_label: String,
    sources: Vec<JoinSource>,
    kind: JoinType,
    ctx: Context,
) -> Sequence {
    Sequence::deferred(move || build(primary, &primary_label, sources, kind, &ctx))
}

fn build(
    primary: Sequence,
    primary_label: &str,
    sources: Vec<JoinSource>,
    kind: JoinType,
    ctx: &Context,
) -> Result<Vec<Entry>> {
    let budget = ctx.budget();
    // property -> (property value -> primary key); later primaries overwrite
    let mut index: HashMap<String, HashMap<Key, Key>> = sources
        .iter()
        .filter_map(|s| match &s.on {
            JoinOn::Property(p) => Some((p.clone(), HashMap::new())),
            JoinOn::Key => None,
        })
        .collect();

    let mut records = Records::default();

    for entry in primary {
        let (key, item) = entry?;
        let value = item.into_value();
        for (property, by_value) in index.iter_mut() {
            let join_value = Key::from_value(&ctx.accessor().read(&value, property)?)?;
            by_value.insert(join_value, key.clone());
        }
        if !records.slots.contains_key(&key) {
            budget.check(records.len(), "join")?;
        }
        records.slot(key).insert(primary_label.to_string(), value);
    }

    let participants = 1 + sources.len();
    let secondary_labels: Vec<String> = sources.iter().map(|s| s.label.clone()).collect();

    for source in sources {
        let JoinSource { on, label, seq } = source;
        for entry in seq {
            let (key, item) = entry?;
            let target = match &on {
                JoinOn::Key => key,
                JoinOn::Property(p) => {
                    match index.get(p).and_then(|by_value| by_value.get(&key)) {
                        Some(primary_key) => primary_key.clone(),
                        None => continue,
                    }
                }
            };
            if !records.slots.contains_key(&target) {
                budget.check(records.len(), "join")?;
            }
            records.slot(target).insert(label.clone(), item.into_value());
        }
    }

    let selected: Vec<Entry> = records
        .order
        .into_iter()
        .filter(|(_, record)| match kind {
            JoinType::Full => true,
            JoinType::Inner => record.len() == participants,
            JoinType::Left => record.contains_key(primary_label),
            JoinType::Right => secondary_labels.iter().any(|l| record.contains_key(l)),
        })
        .map(|(key, record)| (key, Item::Single(Value::Object(record))))
        .collect();

    tracing::debug!(
        operator = "join",
        kind = %kind,
        entries = selected.len(),
        "materialized sequence"
    );
    Ok(selected)
}
