use lazypipe_core::sequence::{Entry, Stage};
use lazypipe_core::Result;

/// Emits at most `remaining` entries and never pulls upstream past that.
pub(crate) struct LimitStage {
    upstream: Box<dyn Stage>,
    remaining: usize,
}

impl LimitStage {
    pub(crate) fn new(upstream: Box<dyn Stage>, n: usize) -> Self {
        Self {
            upstream,
            remaining: n,
        }
    }
}

impl Stage for LimitStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.upstream.pull()?;
        self.remaining -= 1;
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazypipe_core::sequence::Sequence;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counted(n: usize, pulls: Rc<Cell<usize>>) -> Box<dyn Stage> {
        Sequence::lazy((0..n).map(move |i| {
            pulls.set(pulls.get() + 1);
            json!(i)
        }))
        .into_stage()
    }

    #[test]
    fn stops_pulling_at_the_limit() {
        let pulls = Rc::new(Cell::new(0));
        let seq = Sequence::from_stage(LimitStage::new(counted(10, Rc::clone(&pulls)), 3));
        assert_eq!(seq.into_iter().count(), 3);
        assert_eq!(pulls.get(), 3);
    }

    #[test]
    fn zero_never_pulls() {
        let pulls = Rc::new(Cell::new(0));
        let seq = Sequence::from_stage(LimitStage::new(counted(10, Rc::clone(&pulls)), 0));
        assert_eq!(seq.into_iter().count(), 0);
        assert_eq!(pulls.get(), 0);
    }

    #[test]
    fn short_upstream() {
        let pulls = Rc::new(Cell::new(0));
        let seq = Sequence::from_stage(LimitStage::new(counted(2, pulls), 5));
        assert_eq!(seq.into_iter().count(), 2);
    }
}
