//! Entry budget for operators that must buffer.
//!
//! Look-ahead operators (`join`, `merge`, `project`, `to_array`, ...) hold whole
//! sequences in memory. A `BufferBudget` caps how many entries one such buffer
//! may hold; an unbounded budget accepts everything.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferBudget {
    limit: Option<usize>,
}

impl BufferBudget {
    pub const fn new(limit: Option<usize>) -> Self {
        Self { limit }
    }

    pub const fn unbounded() -> Self {
        Self { limit: None }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a buffer already holding `len` entries may take one more.
    pub fn admits(&self, len: usize) -> bool {
        self.limit.map_or(true, |limit| len < limit)
    }

    /// Like [`admits`](Self::admits) but fails with `BufferExceeded` tagged by
    /// the operator name.
    pub fn check(&self, len: usize, operator: &'static str) -> Result<()> {
        match self.limit {
            Some(limit) if len >= limit => Err(Error::BufferExceeded { operator, limit }),
            _ => Ok(()),
        }
    }
}
