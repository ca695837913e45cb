//! Concatenation for `append` / `prepend`. Keys pass through untouched.

use std::collections::VecDeque;

use lazypipe_core::sequence::{Entry, Stage};
use lazypipe_core::Result;

pub(crate) struct ConcatStage {
    parts: VecDeque<Box<dyn Stage>>,
}

impl ConcatStage {
    pub(crate) fn new(parts: impl IntoIterator<Item = Box<dyn Stage>>) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }
}

impl Stage for ConcatStage {
    fn pull(&mut self) -> Option<Result<Entry>> {
        while let Some(front) = self.parts.front_mut() {
            if let Some(entry) = front.pull() {
                return Some(entry);
            }
            self.parts.pop_front();
        }
        None
    }
}
