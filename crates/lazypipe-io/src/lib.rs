#![forbid(unsafe_code)]
//! lazypipe-io: source adapters and writers.
//!
//! Adapters turn an [`Input`] (file path, text, lines, reader or decoded JSON)
//! into a lazy `Sequence`. The [`Registry`] picks the first adapter whose
//! detection accepts the input and falls back to wrapping decoded JSON.

pub mod adapter;
pub mod error;
pub mod readers;
pub mod registry;
pub mod writers;

pub use adapter::{Input, PeekedReader, SourceAdapter};
pub use error::{Error, Result};
pub use registry::Registry;
pub use writers::jsonl::JsonlWriter;

use lazypipe_core::config::PipeConfig;
use lazypipe_core::Sequence;

/// Load `input` with the default adapters for `config`.
pub fn open(input: impl Into<Input>, config: &PipeConfig) -> Result<Sequence> {
    Registry::with_defaults(config).load(input.into())
}
