#![forbid(unsafe_code)]
//! lazypipe: lazy, key-preserving pipelines over heterogeneous collections.
//!
//! This facade re-exports the workspace crates:
//! - [`lazypipe_core`]: keys, items, sequences, accessors, configuration.
//! - [`lazypipe_operators`]: the `Pipeline` operator chain and its combiners.
//! - [`lazypipe_io`]: JSON Lines / CSV source adapters and the JSON Lines writer.

pub use lazypipe_core;
pub use lazypipe_io;
pub use lazypipe_operators;

pub use lazypipe_core::{Error, Result};
pub use lazypipe_operators::Pipeline;

pub mod prelude {
    pub use lazypipe_core::prelude::*;
    pub use lazypipe_operators::{
        CompareOp, Comparator, Decoder, JoinOn, JoinType, MergeSpec, Pipeline, Selector,
    };
}
