//! Convenient re-exports for downstream crates.

pub use crate::accessor::{Accessor, PathAccessor};
pub use crate::budget::BufferBudget;
pub use crate::config::{CsvOptions, PipeConfig};
pub use crate::context::Context;
pub use crate::error::{Error, Result};
pub use crate::id::PipeId;
pub use crate::item::{Args, Item};
pub use crate::key::Key;
pub use crate::sequence::{Collection, Entry, Sequence, Stage};
