#![forbid(unsafe_code)]
//! lazypipe-operators: the `Pipeline` operator chain and its combiners.
//!
//! Design intent:
//! - Every operator consumes the previous `Pipeline` and wraps its `Sequence`
//!   in a new pull-based `Stage`; nothing is pulled until a terminal runs.
//! - Per-item operators dispatch through `lazypipe_core::item::call`, so they
//!   work the same on single values and folded argument lists.
//! - Look-ahead operators (join/merge/project/zip) buffer under the context's
//!   `BufferBudget`.

pub mod cast;
pub mod compare;
pub mod concat;
pub mod filter;
pub mod group;
pub mod join;
pub mod limit;
pub mod map;
pub mod pipeline;

pub use cast::Decoder;
pub use compare::{CompareOp, Comparator};
pub use group::Selector;
pub use join::{JoinOn, JoinType, MergeSpec};
pub use pipeline::Pipeline;
