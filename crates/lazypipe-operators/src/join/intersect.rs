//! `intersect_key`: keys present in the primary and in every other source.
//!
//! Sources are pulled in order. A key is emitted, with the primary's first
//! value for it, at the moment it has been seen in every source. Seeing a key
//! twice in one source does not count twice, and an emitted key is never
//! emitted again.

use std::collections::{HashMap, HashSet, VecDeque};

use lazypipe_core::budget::BufferBudget;
use lazypipe_core::item::Item;
use lazypipe_core::key::Key;
use lazypipe_core::sequence::{Entry, Stage};
use lazypipe_core::Result;

struct Pending {
    item: Item,
    seen: Vec<bool>,
}

pub(crate) struct IntersectStage {
    sources: VecDeque<Box<dyn Stage>>,
    /// Index of the source at the front of `sources`.
    current: usize,
    total: usize,
    pending: HashMap<Key, Pending>,
    completed: HashSet<Key>,
    budget: BufferBudget,
}

impl IntersectStage {
    pub(crate) fn new(primary: Box<dyn Stage>, others: Vec<Box<dyn Stage>>, budget: BufferBudget) -> Self {
        let mut sources = VecDeque::with_capacity(1 + others.len());
        sources.push_back(primary);
        sources.extend(others);
        let total = sources.len();
        Self {
            sources,
            current: 0,
            total,
            pending: HashMap::new(),
            completed: HashSet::new(),
            budget,
        }
    }

    /// Move on to the next source, dropping keys the finished one lacked.
    fn advance(&mut self) {
        let finished = self.current;
        self.pending.retain(|_, p| p.seen[finished]);
        self.sources.pop_front();
        self.current += 1;
    }

    /// Record one sighting; returns the item once the key is complete.
    fn observe(&mut self, key: Key, item: Item) -> Result<Option<Entry>> {
        if self.completed.contains(&key) {
            return Ok(None);
        }
        let source = self.current;
        if !self.pending.contains_key(&key) {
            // only the primary introduces keys
            if source != 0 {
                return Ok(None);
            }
            self.budget.check(self.pending.len(), "intersect_key")?;
            let mut seen = vec![false; self.total];
            seen[0] = true;
            self.pending.insert(key.clone(), Pending { item, seen });
        }
        let done = match self.pending.get_mut(&key) {
            Some(p) => {
                p.seen[source] = true;
                p.seen.iter().all(|&s| s)
            }
            None => false,
        };
        if !done {
            return Ok(None);
        }
        self.completed.insert(key.clone());
        Ok(self.pending.remove(&key).map(|p| (key, p.item)))
    }
}

impl Stage for IntersectStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        loop {
            let next = self.sources.front_mut()?.pull();
            match next {
                None => self.advance(),
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok((key, item))) => match self.observe(key, item) {
                    Ok(Some(entry)) => return Some(Ok(entry)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(e)),
                },
            }
        }
    }
}
